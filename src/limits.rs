use crate::constants;

/// Size limits applied while parsing, to prevent a hostile stream from
/// running the process out of memory.
///
/// # Examples
///
/// ```
/// use streampart::Limits;
///
/// let limits = Limits::new()
///     .max_header_size(4 * 1024)
///     .max_file_size(2 * 1024 * 1024);
/// ```
#[derive(Debug, Clone)]
pub struct Limits {
    pub(crate) max_header_size: usize,
    pub(crate) max_file_size: u64,
}

impl Limits {
    /// Creates the default limits: 8 KiB of headers per part and an unbounded
    /// part body.
    pub fn new() -> Limits {
        Limits::default()
    }

    /// Sets the maximum size of a single part's header block, in bytes,
    /// excluding the terminating `\r\n\r\n`.
    pub fn max_header_size(mut self, limit: usize) -> Limits {
        self.max_header_size = limit;
        self
    }

    /// Sets the maximum size of a single part's body, in bytes.
    pub fn max_file_size(mut self, limit: u64) -> Limits {
        self.max_file_size = limit;
        self
    }
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_header_size: constants::DEFAULT_MAX_HEADER_SIZE,
            max_file_size: constants::DEFAULT_MAX_FILE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_defaults() {
        let limits = Limits::new();
        assert_eq!(limits.max_header_size, 8 * 1024);
        assert_eq!(limits.max_file_size, std::u64::MAX);
    }

    #[test]
    fn test_limits_builder() {
        let limits = Limits::new().max_header_size(64).max_file_size(10);
        assert_eq!(limits.max_header_size, 64);
        assert_eq!(limits.max_file_size, 10);
    }
}

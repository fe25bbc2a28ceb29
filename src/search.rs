use memchr::memchr_iter;
use memchr::memmem;

/// A boundary token (or other delimiter) precompiled for repeated searches.
///
/// Supports two lookups: the first complete occurrence in a haystack, and the
/// earliest position at which a strict prefix of the needle runs unbroken to
/// the end of the haystack. The latter is what lets the parser hold back a
/// buffer tail that might turn into a boundary once the next chunk arrives.
pub(crate) struct Needle {
    bytes: Vec<u8>,
    finder: memmem::Finder<'static>,
}

impl Needle {
    pub(crate) fn new<B: Into<Vec<u8>>>(bytes: B) -> Self {
        let bytes = bytes.into();
        let finder = memmem::Finder::new(&bytes).into_owned();
        Needle { bytes, finder }
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the index of the first complete occurrence of the needle at or
    /// after `from`.
    pub(crate) fn find_full(&self, haystack: &[u8], from: usize) -> Option<usize> {
        if from >= haystack.len() {
            return None;
        }

        self.finder.find(&haystack[from..]).map(|idx| idx + from)
    }

    /// Returns the earliest index at which a strict prefix of the needle
    /// begins and extends unbroken to the end of the haystack.
    ///
    /// Only the last `len - 1` bytes can hold such a prefix; anything earlier
    /// would either be a complete occurrence (found by `find_full`) or a
    /// mismatch.
    pub(crate) fn find_partial_tail(&self, haystack: &[u8]) -> Option<usize> {
        if haystack.is_empty() || self.bytes.is_empty() {
            return None;
        }

        let window = haystack.len().saturating_sub(self.bytes.len() - 1);

        for rel_idx in memchr_iter(self.bytes[0], &haystack[window..]) {
            let start = window + rel_idx;
            let tail = &haystack[start..];

            if tail == &self.bytes[..tail.len()] {
                return Some(start);
            }
        }

        None
    }
}

use std::fmt::{self, Debug, Display, Formatter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A set of errors that can occur while parsing a multipart stream and in
/// other operations.
#[non_exhaustive]
pub enum Error {
    /// The stream did not begin with the opening `--boundary` token.
    MissingInitialBoundary,

    /// A boundary token was followed by neither `\r\n` nor `--`.
    MalformedBoundary,

    /// The stream ended before the closing boundary was seen.
    IncompleteStream,

    /// Data was received after the closing `--boundary--` delimiter.
    DataAfterEof,

    /// A part's header block exceeded the maximum size limit.
    HeaderSizeExceeded { limit: usize },

    /// A part's body exceeded the maximum size limit.
    FileSizeExceeded { limit: u64 },

    /// A part's body channel was abandoned before its body was complete.
    IncompletePartData,

    /// The part body was already consumed by a previous `bytes()` call.
    BodyConsumed,

    /// Couldn't read the part headers completely.
    IncompleteHeaders,

    /// Failed to read headers.
    ReadHeaderFailed(httparse::Error),

    /// Failed to decode a raw header name to a
    /// [`HeaderName`](http::header::HeaderName).
    DecodeHeaderName { name: String, cause: BoxError },

    /// Failed to decode a raw header value to a
    /// [`HeaderValue`](http::header::HeaderValue).
    DecodeHeaderValue { value: Vec<u8>, cause: BoxError },

    /// Stream read failed.
    StreamReadFailed(BoxError),

    /// The `Content-Type` is not a `multipart/*` media type.
    NoMultipart,

    /// Failed to convert the `Content-Type` to a [`mime::Mime`] type.
    DecodeContentType(mime::FromStrError),

    /// No boundary found in the `Content-Type` header.
    NoBoundary,

    /// Failed to decode the part body as JSON in
    /// [`part.json()`](crate::Part::json).
    #[cfg(feature = "json")]
    DecodeJson(serde_json::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingInitialBoundary => {
                write!(f, "invalid multipart stream: missing initial boundary")
            }
            Error::MalformedBoundary => write!(f, "malformed boundary delimiter"),
            Error::IncompleteStream => write!(f, "unexpected end of stream"),
            Error::DataAfterEof => write!(f, "unexpected data after end of stream"),
            Error::HeaderSizeExceeded { limit } => {
                write!(f, "part headers exceeded the maximum size limit: {} bytes", limit)
            }
            Error::FileSizeExceeded { limit } => {
                write!(f, "part body exceeded the maximum size limit: {} bytes", limit)
            }
            Error::IncompletePartData => write!(f, "part received with incomplete body data"),
            Error::BodyConsumed => write!(f, "part body has already been consumed"),
            Error::IncompleteHeaders => write!(f, "failed to read complete part headers"),
            Error::ReadHeaderFailed(err) => write!(f, "failed to read part headers: {}", err),
            Error::DecodeHeaderName { name, cause } => {
                write!(f, "failed to decode raw header name: {:?} {}", name, cause)
            }
            Error::DecodeHeaderValue { cause, .. } => {
                write!(f, "failed to decode raw header value: {}", cause)
            }
            Error::StreamReadFailed(err) => write!(f, "stream read failed: {}", err),
            Error::NoMultipart => write!(f, "Content-Type is not a multipart media type"),
            Error::DecodeContentType(err) => {
                write!(f, "failed to convert Content-Type to `mime::Mime` type: {}", err)
            }
            Error::NoBoundary => write!(f, "multipart boundary not found in Content-Type"),
            #[cfg(feature = "json")]
            Error::DecodeJson(err) => write!(f, "failed to decode part body as JSON: {}", err),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}

//! An incremental, push-based parser for `multipart/*` byte streams.
//!
//! `streampart` consumes arbitrarily-chunked byte streams and emits
//! structured [`Part`]s, each with lazily-parsed headers and a body that can
//! be read while the rest of the message is still arriving. No part of the
//! message is buffered in full: boundary tokens split across chunk edges are
//! detected via partial-tail matching, and configurable [`Limits`] bound the
//! memory a hostile stream can consume.
//!
//! # Examples
//!
//! ```
//! use bytes::Bytes;
//! use futures_util::stream::once;
//! use std::convert::Infallible;
//! use streampart::MultipartParser;
//!
//! # async fn run() -> streampart::Result<()> {
//! let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
//! let stream = once(async move { Result::<Bytes, Infallible>::Ok(Bytes::from(data)) });
//!
//! MultipartParser::new("X-BOUNDARY")
//!     .parse(stream, |mut part| async move {
//!         println!("Part: {:?}", part.text().await?);
//!         Ok(())
//!     })
//!     .await
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(run()).unwrap();
//! ```

pub use error::Error;
pub use limits::Limits;
pub use multipart::MultipartParser;
pub use part::Part;

mod body;
mod constants;
mod content_disposition;
mod error;
mod helpers;
mod limits;
mod multipart;
mod part;
mod search;
mod state;

/// A Result type often returned from methods that can have `streampart`
/// errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Parses the `Content-Type` header to extract the boundary value.
pub fn parse_boundary<T: AsRef<str>>(content_type: T) -> crate::Result<String> {
    let m = content_type
        .as_ref()
        .parse::<mime::Mime>()
        .map_err(crate::Error::DecodeContentType)?;

    if m.type_() != mime::MULTIPART {
        return Err(crate::Error::NoMultipart);
    }

    m.get_param(mime::BOUNDARY)
        .map(|name| name.as_str().to_owned())
        .ok_or(crate::Error::NoBoundary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boundary() {
        let content_type = "multipart/form-data; boundary=ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("ABCDEFG".to_owned()));

        let content_type = "multipart/mixed; boundary=------ABCDEFG";
        assert_eq!(parse_boundary(content_type), Ok("------ABCDEFG".to_owned()));

        let content_type = "boundary=------ABCDEFG";
        assert!(parse_boundary(content_type).is_err());

        let content_type = "text/plain";
        assert!(parse_boundary(content_type).is_err());

        let content_type = "text/plain; boundary=------ABCDEFG";
        assert!(parse_boundary(content_type).is_err());
    }
}

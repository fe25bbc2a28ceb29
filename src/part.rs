use std::borrow::Cow;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use encoding_rs::{Encoding, UTF_8};
use futures_util::stream::{Stream, StreamExt};
use http::header::{self, HeaderMap};
#[cfg(feature = "json")]
use serde::de::DeserializeOwned;

use crate::body::BodyStream;
use crate::constants;
use crate::content_disposition::ContentDisposition;
use crate::helpers;

/// A single part of a multipart stream, handed to the parse handler as soon
/// as its header block is complete.
///
/// The body may still be arriving at that point: it can be read incrementally
/// through the [`Stream`](https://docs.rs/futures/0.3/futures/stream/trait.Stream.html)
/// implementation or [`chunk()`](Part::chunk), or drained in one go with
/// [`bytes()`](Part::bytes) / [`text()`](Part::text). Draining is allowed at
/// most once per part.
///
/// Headers are parsed lazily from the captured raw bytes on first access and
/// cached afterwards.
pub struct Part {
    raw_headers: Bytes,
    body: BodyStream,
    headers: Option<HeaderMap>,
    content_disposition: Option<ContentDisposition>,
    media_type: Option<mime::Mime>,
    body_used: bool,
    idx: usize,
}

impl Part {
    pub(crate) fn new(raw_headers: Bytes, body: BodyStream, idx: usize) -> Self {
        Part {
            raw_headers,
            body,
            headers: None,
            content_disposition: None,
            media_type: None,
            body_used: false,
            idx,
        }
    }

    /// Returns the part's headers, parsing the raw header bytes on first
    /// access.
    pub fn headers(&mut self) -> crate::Result<&HeaderMap> {
        if self.headers.is_none() {
            let headers = self.parse_raw_headers()?;

            self.content_disposition = Some(ContentDisposition::parse(&headers));
            self.media_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|val| val.to_str().ok())
                .and_then(|val| val.parse::<mime::Mime>().ok());

            self.headers = Some(headers);
        }

        Ok(self.headers.get_or_insert_with(HeaderMap::new))
    }

    fn parse_raw_headers(&self) -> crate::Result<HeaderMap> {
        let mut scratch = [httparse::EMPTY_HEADER; constants::MAX_HEADERS];

        match httparse::parse_headers(&self.raw_headers, &mut scratch) {
            Ok(httparse::Status::Complete((_, raw_headers))) => {
                helpers::convert_raw_headers_to_header_map(raw_headers)
            }
            Ok(httparse::Status::Partial) => Err(crate::Error::IncompleteHeaders),
            Err(err) => Err(crate::Error::ReadHeaderFailed(err)),
        }
    }

    /// The field name from the `Content-Disposition` header, if any.
    pub fn name(&mut self) -> Option<&str> {
        self.headers().ok()?;
        self.content_disposition.as_ref()?.field_name.as_deref()
    }

    /// The file name from the `Content-Disposition` header, if any.
    pub fn file_name(&mut self) -> Option<&str> {
        self.headers().ok()?;
        self.content_disposition.as_ref()?.file_name.as_deref()
    }

    /// The part's media type from the `Content-Type` header, if any.
    pub fn content_type(&mut self) -> Option<&mime::Mime> {
        self.headers().ok()?;
        self.media_type.as_ref()
    }

    /// Whether this part carries a file: it has a file name or declares an
    /// `application/octet-stream` media type.
    pub fn is_file(&mut self) -> bool {
        if self.file_name().is_some() {
            return true;
        }

        self.content_type()
            .map(|mime| mime.type_() == mime::APPLICATION && mime.subtype() == mime::OCTET_STREAM)
            .unwrap_or(false)
    }

    /// The zero-based position of this part in the stream.
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Yields the next body chunk if available.
    pub async fn chunk(&mut self) -> crate::Result<Option<Bytes>> {
        self.body.next().await.transpose()
    }

    /// Drains the remaining body into one contiguous buffer.
    ///
    /// The body can be drained at most once; a second call fails with
    /// [`Error::BodyConsumed`](crate::Error::BodyConsumed).
    pub async fn bytes(&mut self) -> crate::Result<Bytes> {
        if self.body_used {
            return Err(crate::Error::BodyConsumed);
        }
        self.body_used = true;

        let mut buf = BytesMut::new();

        while let Some(bytes) = self.chunk().await? {
            buf.extend_from_slice(&bytes);
        }

        Ok(buf.freeze())
    }

    /// Drains the body and decodes it as text, honoring the `charset`
    /// parameter of the part's `Content-Type` and defaulting to UTF-8.
    pub async fn text(&mut self) -> crate::Result<String> {
        self.text_with_charset("utf-8").await
    }

    /// Drains the body and decodes it as text with the given default charset.
    pub async fn text_with_charset(&mut self, default_encoding: &str) -> crate::Result<String> {
        let encoding_name = self
            .content_type()
            .and_then(|mime| mime.get_param(mime::CHARSET))
            .map(|charset| charset.as_str().to_owned())
            .unwrap_or_else(|| default_encoding.to_owned());

        let encoding = Encoding::for_label(encoding_name.as_bytes()).unwrap_or(UTF_8);

        let bytes = self.bytes().await?;

        let (text, _, _) = encoding.decode(&bytes);

        match text {
            Cow::Owned(s) => Ok(s),
            Cow::Borrowed(s) => Ok(String::from(s)),
        }
    }

    /// Drains the body and decodes it as JSON.
    ///
    /// # Optional
    ///
    /// This requires the optional `json` feature to be enabled.
    #[cfg(feature = "json")]
    pub async fn json<T: DeserializeOwned>(&mut self) -> crate::Result<T> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes).map_err(crate::Error::DecodeJson)
    }
}

impl Stream for Part {
    type Item = crate::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.body).poll_next(cx)
    }
}

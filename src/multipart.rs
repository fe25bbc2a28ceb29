use std::convert::Infallible;
use std::future::Future;

use bytes::{Buf, Bytes};
use futures_util::future::{self, Either};
use futures_util::pin_mut;
use futures_util::stream::{self, FuturesUnordered, Stream, StreamExt, TryStreamExt};
#[cfg(feature = "tokio-io")]
use tokio::io::AsyncRead;
#[cfg(feature = "tokio-io")]
use tokio_util::io::ReaderStream;

use crate::body;
use crate::constants;
use crate::limits::Limits;
use crate::part::Part;
use crate::search::Needle;
use crate::state::{MultipartState, StreamingStage};
use crate::Error;

/// A push-based parser for one `multipart/*` message.
///
/// Construct it with the boundary token taken from the `Content-Type` header
/// (see [`parse_boundary`](crate::parse_boundary)), then drive it with one of
/// the `parse*` methods. The handler is invoked once per part, in wire order,
/// as soon as that part's header block is complete; the part's body keeps
/// streaming in while the handler runs, so handlers for earlier parts may
/// still be draining their bodies while later parts are being parsed.
///
/// A parser instance consumes exactly one message.
///
/// # Examples
///
/// ```
/// use streampart::MultipartParser;
///
/// # async fn run() -> streampart::Result<()> {
/// let data = "--X-BOUNDARY\r\nContent-Disposition: form-data; name=\"my_text_field\"\r\n\r\nabcd\r\n--X-BOUNDARY--\r\n";
///
/// MultipartParser::new("X-BOUNDARY")
///     .parse_bytes(data, |mut part| async move {
///         let name = part.name().map(ToOwned::to_owned);
///         let text = part.text().await?;
///         println!("Part {:?}: {:?}", name, text);
///         Ok(())
///     })
///     .await
/// # }
/// # tokio::runtime::Runtime::new().unwrap().block_on(run()).unwrap();
/// ```
pub struct MultipartParser {
    state: MultipartState,
    limits: Limits,
    opening_boundary: Needle,
    delimiter: Needle,
    header_terminator: Needle,
}

impl MultipartParser {
    /// Constructs a new `MultipartParser` for the given boundary token, with
    /// default [`Limits`].
    pub fn new<B: Into<String>>(boundary: B) -> MultipartParser {
        MultipartParser::new_with_limits(boundary, Limits::default())
    }

    /// Constructs a new `MultipartParser` with explicit size limits.
    pub fn new_with_limits<B: Into<String>>(boundary: B, limits: Limits) -> MultipartParser {
        let boundary = boundary.into();

        let opening_boundary = Needle::new(format!("{}{}", constants::BOUNDARY_EXT, boundary));
        let delimiter = Needle::new(format!(
            "{}{}{}",
            constants::CRLF,
            constants::BOUNDARY_EXT,
            boundary
        ));
        let header_terminator = Needle::new(constants::CRLF_CRLF.as_bytes());

        MultipartParser {
            state: MultipartState::new(),
            limits,
            opening_boundary,
            delimiter,
            header_terminator,
        }
    }

    /// Parses a chunked byte stream, invoking `handler` for every part.
    ///
    /// Handler futures are driven concurrently with stream consumption and
    /// are all awaited before this method returns. A handler error does not
    /// stop parsing; the first one is returned once the stream has been fully
    /// processed, unless a parse error takes precedence.
    pub async fn parse<S, O, E, H, F>(mut self, stream: S, mut handler: H) -> crate::Result<()>
    where
        S: Stream<Item = Result<O, E>>,
        O: Into<Bytes>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
        H: FnMut(Part) -> F,
        F: Future<Output = crate::Result<()>>,
    {
        let stream = stream
            .map_ok(|chunk| chunk.into())
            .map_err(|err| Error::StreamReadFailed(err.into()));
        pin_mut!(stream);

        let mut handlers = FuturesUnordered::new();
        let mut handler_error = None;
        let mut emitted = Vec::new();

        loop {
            let next_chunk = if handlers.is_empty() {
                stream.next().await
            } else {
                match future::select(stream.next(), handlers.next()).await {
                    Either::Left((chunk, _)) => chunk,
                    Either::Right((Some(result), _)) => {
                        record_handler_result(result, &mut handler_error);
                        continue;
                    }
                    Either::Right((None, _)) => continue,
                }
            };

            let chunk = match next_chunk {
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => {
                    self.abort();
                    drain_handlers(&mut handlers, &mut handler_error).await;
                    return Err(err);
                }
                None => break,
            };

            let write_result = self.write(chunk, &mut emitted);

            // Parts whose headers completed during this write are handed to
            // the handler even when the write failed further in, so their
            // in-flight readers can observe the failure.
            for part in emitted.drain(..) {
                handlers.push(handler(part));
            }

            if let Err(err) = write_result {
                self.abort();
                drain_handlers(&mut handlers, &mut handler_error).await;
                return Err(err);
            }
        }

        if self.state.stage != StreamingStage::Eof {
            self.abort();
            drain_handlers(&mut handlers, &mut handler_error).await;
            return Err(Error::IncompleteStream);
        }

        drain_handlers(&mut handlers, &mut handler_error).await;

        match handler_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Parses a complete message held in a single buffer.
    pub async fn parse_bytes<B, H, F>(self, buffer: B, handler: H) -> crate::Result<()>
    where
        B: Into<Bytes>,
        H: FnMut(Part) -> F,
        F: Future<Output = crate::Result<()>>,
    {
        let stream = stream::once(future::ready(Ok::<Bytes, Infallible>(buffer.into())));
        self.parse(stream, handler).await
    }

    /// Parses a message delivered as a synchronous sequence of buffers.
    pub async fn parse_iter<I, O, H, F>(self, chunks: I, handler: H) -> crate::Result<()>
    where
        I: IntoIterator<Item = O>,
        O: Into<Bytes>,
        H: FnMut(Part) -> F,
        F: Future<Output = crate::Result<()>>,
    {
        let stream = stream::iter(chunks.into_iter().map(Ok::<O, Infallible>));
        self.parse(stream, handler).await
    }

    /// Parses a message read from an
    /// [`AsyncRead`](https://docs.rs/tokio/1/tokio/io/trait.AsyncRead.html)
    /// source.
    ///
    /// # Optional
    ///
    /// This requires the optional `tokio-io` feature to be enabled.
    #[cfg(feature = "tokio-io")]
    pub async fn parse_reader<R, H, F>(self, reader: R, handler: H) -> crate::Result<()>
    where
        R: AsyncRead,
        H: FnMut(Part) -> F,
        F: Future<Output = crate::Result<()>>,
    {
        self.parse(ReaderStream::new(reader), handler).await
    }

    /// Feeds one chunk through the state machine. Parts whose header blocks
    /// completed during this write are appended to `emitted`.
    fn write(&mut self, chunk: Bytes, emitted: &mut Vec<Part>) -> crate::Result<()> {
        self.state.buf.extend_from_slice(&chunk);

        loop {
            match self.state.stage {
                StreamingStage::ReadingInitialBoundary => {
                    let opening_len = self.opening_boundary.len();

                    if self.state.buf.len() < opening_len {
                        // reject early when the buffered prefix already
                        // diverges from the opening boundary
                        let have = self.state.buf.len();
                        if self.state.buf[..] != self.opening_boundary.as_bytes()[..have] {
                            return Err(Error::MissingInitialBoundary);
                        }
                        return Ok(());
                    }

                    if &self.state.buf[..opening_len] != self.opening_boundary.as_bytes() {
                        return Err(Error::MissingInitialBoundary);
                    }

                    self.state.buf.advance(opening_len);
                    self.state.stage = StreamingStage::DeterminingBoundaryType;
                }
                StreamingStage::DeterminingBoundaryType => {
                    if self.state.buf.len() < 2 {
                        return Ok(());
                    }

                    if &self.state.buf[..2] == constants::BOUNDARY_EXT.as_bytes() {
                        self.state.buf.advance(2);
                        self.state.stage = StreamingStage::Eof;
                    } else if &self.state.buf[..2] == constants::CRLF.as_bytes() {
                        self.state.buf.advance(2);
                        self.state.stage = StreamingStage::ReadingPartHeaders;
                    } else {
                        return Err(Error::MalformedBoundary);
                    }
                }
                StreamingStage::ReadingPartHeaders => {
                    match self.header_terminator.find_full(&self.state.buf, 0) {
                        Some(idx) => {
                            if idx > self.limits.max_header_size {
                                return Err(Error::HeaderSizeExceeded {
                                    limit: self.limits.max_header_size,
                                });
                            }

                            let header_bytes = self
                                .state
                                .buf
                                .split_to(idx + constants::CRLF_CRLF.len())
                                .freeze();

                            let (sink, body_stream) = body::channel();
                            let part_idx = self.state.next_part_idx;
                            self.state.next_part_idx += 1;

                            self.state.body_sink = Some(sink);
                            self.state.curr_body_size_counter = 0;
                            self.state.stage = StreamingStage::ReadingPartBody;

                            emitted.push(Part::new(header_bytes, body_stream, part_idx));
                        }
                        None => {
                            // a tail that might become the terminator once
                            // the next chunk arrives does not count against
                            // the cap
                            let effective = self
                                .header_terminator
                                .find_partial_tail(&self.state.buf)
                                .unwrap_or_else(|| self.state.buf.len());

                            if effective > self.limits.max_header_size {
                                return Err(Error::HeaderSizeExceeded {
                                    limit: self.limits.max_header_size,
                                });
                            }
                            return Ok(());
                        }
                    }
                }
                StreamingStage::ReadingPartBody => match self.delimiter.find_full(&self.state.buf, 0) {
                    Some(idx) => {
                        let body_bytes = self.state.buf.split_to(idx).freeze();
                        self.state.buf.advance(self.delimiter.len());

                        self.push_body_bytes(body_bytes)?;

                        if let Some(sink) = self.state.body_sink.take() {
                            sink.close();
                        }

                        self.state.stage = StreamingStage::DeterminingBoundaryType;
                    }
                    None => {
                        // hold back a tail that might become a boundary once
                        // the next chunk arrives
                        let body_bytes = match self.delimiter.find_partial_tail(&self.state.buf) {
                            Some(idx) => self.state.buf.split_to(idx).freeze(),
                            None => self.state.buf.split_to(self.state.buf.len()).freeze(),
                        };

                        self.push_body_bytes(body_bytes)?;
                        return Ok(());
                    }
                },
                StreamingStage::Eof => {
                    // tolerate the customary trailing CRLF after the closing
                    // delimiter, however it is chunked
                    while let Some(&byte) = self.state.buf.first() {
                        if byte != b'\r' && byte != b'\n' {
                            return Err(Error::DataAfterEof);
                        }
                        self.state.buf.advance(1);
                    }
                    return Ok(());
                }
            }
        }
    }

    fn push_body_bytes(&mut self, bytes: Bytes) -> crate::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        self.state.curr_body_size_counter += bytes.len() as u64;

        if self.state.curr_body_size_counter > self.limits.max_file_size {
            let limit = self.limits.max_file_size;

            if let Some(sink) = self.state.body_sink.take() {
                sink.fail(Error::FileSizeExceeded { limit });
            }

            return Err(Error::FileSizeExceeded { limit });
        }

        if let Some(sink) = self.state.body_sink.as_mut() {
            sink.push(bytes);
        }

        Ok(())
    }

    /// Drops the active body sink, failing any in-flight body reader.
    fn abort(&mut self) {
        self.state.body_sink.take();
    }
}

async fn drain_handlers<F>(handlers: &mut FuturesUnordered<F>, first_error: &mut Option<Error>)
where
    F: Future<Output = crate::Result<()>>,
{
    while let Some(result) = handlers.next().await {
        record_handler_result(result, first_error);
    }
}

fn record_handler_result(result: crate::Result<()>, first_error: &mut Option<Error>) {
    if let Err(err) = result {
        #[cfg(feature = "log")]
        log::debug!("part handler failed: {}", err);

        first_error.get_or_insert(err);
    }
}

use bytes::BytesMut;

use crate::body::BodySink;

pub(crate) struct MultipartState {
    /// Unconsumed tail bytes carried across writes. A chunk is appended here
    /// before the stage logic runs, so a transition decision is always made
    /// over the carry plus the new bytes.
    pub(crate) buf: BytesMut,
    pub(crate) stage: StreamingStage,
    /// Write half of the current part's body channel. Present only while the
    /// stage is `ReadingPartBody`.
    pub(crate) body_sink: Option<BodySink>,
    pub(crate) curr_body_size_counter: u64,
    pub(crate) next_part_idx: usize,
}

impl MultipartState {
    pub(crate) fn new() -> Self {
        MultipartState {
            buf: BytesMut::new(),
            stage: StreamingStage::ReadingInitialBoundary,
            body_sink: None,
            curr_body_size_counter: 0,
            next_part_idx: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamingStage {
    ReadingInitialBoundary,
    DeterminingBoundaryType,
    ReadingPartHeaders,
    ReadingPartBody,
    Eof,
}

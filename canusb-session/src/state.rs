//! Receive state machine states

/// Receive detection state
///
/// # State Transitions
/// ```text
/// WaitStart -> FrameInfo               (on 0xAA)
/// FrameInfo -> ControllerStatus        (on 0x55)
/// FrameInfo -> IdStd | IdExt           (on control byte, DLC <= 8)
/// FrameInfo -> FrameInfo               (on any other byte)
/// IdStd     -> Data                    (after 2 id bytes)
/// IdExt     -> Data                    (after 4 id bytes)
/// IdStd | IdExt -> Eof                 (after the id bytes when DLC == 0)
/// Data      -> Eof                     (after DLC data bytes)
/// Eof       -> WaitStart               (always)
/// ControllerStatus -> WaitStart        (bad discriminator, or after the checksum byte)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DetectState {
    /// Hunting for a start byte (initial state)
    #[default]
    WaitStart,
    /// Start byte seen, waiting for a control byte or the status marker
    FrameInfo,
    /// Collecting the 2 bytes of a standard identifier
    IdStd,
    /// Collecting the 4 bytes of an extended identifier
    IdExt,
    /// Collecting data bytes
    Data,
    /// Waiting for the frame terminator
    Eof,
    /// Collecting a fixed-length controller status report
    ControllerStatus,
}

impl DetectState {
    /// Check whether a message is partially assembled
    pub fn in_progress(&self) -> bool {
        !matches!(self, DetectState::WaitStart)
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectState::WaitStart => "WaitStart",
            DetectState::FrameInfo => "FrameInfo",
            DetectState::IdStd => "IdStd",
            DetectState::IdExt => "IdExt",
            DetectState::Data => "Data",
            DetectState::Eof => "Eof",
            DetectState::ControllerStatus => "ControllerStatus",
        }
    }
}

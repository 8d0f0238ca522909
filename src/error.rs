use std::error::Error;
use std::fmt::{Display, Formatter};

/// Everything that can go wrong computing or applying an [`crate::EditScript`].
///
/// This mirrors the negative sentinels returned by the original C `ComputeEditScript` /
/// `ApplyEditScript` routines one-for-one; see the doc comment on each variant for the sentinel
/// it replaces.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiffError {
    /// `Compute` sentinel `-1`: the caller's script buffer is too small to hold the script.
    ScriptBufferTooSmall,
    /// `Compute` sentinel `-2`: the trace arena could not be sized within the caller-supplied
    /// capacity hint.
    ArenaAllocFailed,
    /// `Compute` sentinel `-3`: the search loop ran past its bound without reaching the goal
    /// entry, or the script builder handed the encoder an opcode kind it doesn't recognise.
    /// Both indicate an internal bug rather than caller misuse.
    SearchExhausted,
    /// `Apply` sentinel `-1`: the destination buffer is too small for the reconstructed bytes.
    ApplyBufferTooSmall,
    /// Raised only by [`crate::apply_checked`]: the script contains a `Noop` opcode tag or an
    /// `Insert` whose declared payload runs past the end of the script. The unchecked
    /// `apply_into` trusts its input, per the wire format's contract, and never returns this.
    CorruptScript,
}

impl Display for DiffError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffError::ScriptBufferTooSmall => write!(f, "script buffer too small"),
            DiffError::ArenaAllocFailed => write!(f, "trace arena allocation failed"),
            DiffError::SearchExhausted => write!(f, "search exhausted without reaching the goal (internal error)"),
            DiffError::ApplyBufferTooSmall => write!(f, "destination buffer too small"),
            DiffError::CorruptScript => write!(f, "corrupt edit script"),
        }
    }
}

impl Error for DiffError {}

//! # DSP Building Blocks
//!
//! Leaf components of the delay, each owning its own state:
//!
//! - **`delay_line`**: the circular tape, with cubic fractional reads.
//! - **`modulation`**: tempo-synced base time, LFO, and random drift.
//! - **`pan`**: the three pan modes and the click-free mode switch.
//! - **`ducking`**: envelope follower that turns the wet signal down
//!   while the input is loud.
//! - **`filter`**: one/two/four-pole and state-variable filters.
//! - **`drive`**: iterative stateful saturation for the feedback path.
//!
//! [`crate::engine::DelayEngine`] wires these together per sample.
//!
//! The choice enums (`TempoSync`, `PanMode`, `FilterMode`) implement
//! `TryFrom<i32>` and `from_raw` for callers that drive the engine with
//! raw choice indices, such as preset data or another host wrapper. The
//! nih-plug shell gets typed values from `EnumParam` and doesn't use them.

use thiserror::Error;

pub mod delay_line;
pub mod drive;
pub mod ducking;
pub mod filter;
pub mod modulation;
pub mod pan;

/// A raw choice-parameter index that doesn't name any variant.
///
/// Returned by the `TryFrom<i32>` conversions on the choice enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{index} is not a valid {param} index")]
pub struct ParamIndexError {
    pub param: &'static str,
    pub index: i32,
}

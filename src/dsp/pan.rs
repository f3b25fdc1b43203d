//! # Stereo Panning
//!
//! Three pan modes share one `Panning` knob:
//!
//! - **Static**: the knob balances the input as it is written to the tape.
//! - **Ping Pong**: same balance, but the write swaps left and right, so
//!   each repeat lands on the opposite side from the one before it.
//! - **Circular**: the knob instead rotates the delayed signal as it is
//!   read back. Because the rotated signal feeds back into the tape, every
//!   repeat is rotated once more, and the echoes circle the stereo field.
//!
//! Switching modes instantly would reroute the feedback loop mid-waveform
//! and click. Instead the write gain fades to zero, the mode flips while
//! the tape input is silent, and the gain fades back in.

use nih_plug::prelude::Enum;

use crate::dsp::ParamIndexError;

/// Rate of the mode-switch fade, in full-scale units per second.
const MODE_FADE_RATE: f64 = 100.0;

/// Rate of the pan amount smoothers, in Hz.
const PAN_SMOOTHING_RATE: f64 = 100.0;

#[derive(Enum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanMode {
    #[default]
    #[id = "static"]
    #[name = "Static"]
    Stationary,
    #[id = "ping-pong"]
    #[name = "Ping Pong"]
    PingPong,
    #[id = "circular"]
    #[name = "Circular"]
    Circular,
}

impl PanMode {
    pub const ALL: [PanMode; 3] = [PanMode::Stationary, PanMode::PingPong, PanMode::Circular];

    /// Convert a raw host index, falling back to [`PanMode::Stationary`].
    pub fn from_raw(index: i32) -> Self {
        Self::try_from(index).unwrap_or_default()
    }
}

impl TryFrom<i32> for PanMode {
    type Error = ParamIndexError;

    fn try_from(index: i32) -> Result<Self, Self::Error> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ParamIndexError {
                param: "pan mode",
                index,
            })
    }
}

/// Rotate a stereo pair by `angle` radians.
///
/// An angle of zero is the identity. The rotation preserves
/// `l² + r²`, so panning never changes the total power of the pair.
#[inline]
pub fn adjust_panning(l: f64, r: f64, angle: f64) -> (f64, f64) {
    let (s, c) = angle.sin_cos();
    (l * c - r * s, l * s + r * c)
}

/// Smoothed pan state: the active mode, the mode-switch fade, and one
/// smoothed amount per panning style.
#[derive(Debug, Clone)]
pub struct PanState {
    current_mode: PanMode,
    change_volume: f64,
    stationary_amount: f64,
    circular_amount: f64,
}

impl Default for PanState {
    fn default() -> Self {
        Self {
            current_mode: PanMode::Stationary,
            change_volume: 1.0,
            stationary_amount: 0.0,
            circular_amount: 0.0,
        }
    }
}

impl PanState {
    /// Mode currently applied to the tape. Lags the requested mode while
    /// a switch is fading out.
    pub fn current_mode(&self) -> PanMode {
        self.current_mode
    }

    /// Gain applied to everything written to the tape, in `[0, 1]`.
    pub fn change_volume(&self) -> f64 {
        self.change_volume
    }

    /// Write-side balance angle (already halved).
    pub fn write_angle(&self) -> f64 {
        self.stationary_amount * 0.5
    }

    /// Read-side rotation angle.
    pub fn read_angle(&self) -> f64 {
        self.circular_amount
    }

    /// Whether the tape write should swap channels.
    pub fn swaps_channels(&self) -> bool {
        self.current_mode == PanMode::PingPong
    }

    /// Advance the fade and the amount smoothers by one sample.
    pub fn update(&mut self, target_mode: PanMode, pan: f64, dt: f64) {
        if self.current_mode != target_mode {
            self.change_volume -= MODE_FADE_RATE * dt;
            if self.change_volume <= 0.0 {
                self.change_volume = 0.0;
                self.current_mode = target_mode;
            }
        } else if self.change_volume < 1.0 {
            self.change_volume = (self.change_volume + MODE_FADE_RATE * dt).min(1.0);
        }

        let stationary_target = match self.current_mode {
            PanMode::Stationary | PanMode::PingPong => pan,
            PanMode::Circular => 0.0,
        };
        let circular_target = match self.current_mode {
            PanMode::Circular => pan,
            PanMode::Stationary | PanMode::PingPong => 0.0,
        };
        self.stationary_amount +=
            (stationary_target - self.stationary_amount) * PAN_SMOOTHING_RATE * dt;
        self.circular_amount += (circular_target - self.circular_amount) * PAN_SMOOTHING_RATE * dt;
    }
}

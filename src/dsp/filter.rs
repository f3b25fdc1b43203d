//! # Multi-Mode Filters
//!
//! The delayed signal passes through a lowpass and a highpass on its way
//! back into the tape, so every repeat is band-limited once more than the
//! one before it. Repeats get progressively darker (and thinner), the way
//! they do on analog tape and bucket-brigade echoes.
//!
//! ## Topologies
//!
//! All filters here are *topology-preserving transform* (TPT) designs: the
//! analog integrator is discretized with the trapezoidal rule, and the
//! cutoff is pre-warped with `tan()`. Compared to the textbook
//! `y[n] = (1 - a) * x[n] + a * y[n-1]` one-pole, this keeps the cutoff
//! accurate right up to Nyquist and stays well behaved when the cutoff is
//! modulated every sample.
//!
//! | Mode | Slope | Built from |
//! |------|-------|------------|
//! | 1 Pole | 6 dB/oct | one TPT integrator |
//! | 2 Pole | 12 dB/oct | two cascaded one-poles |
//! | 4 Pole | 24 dB/oct | two cascaded two-poles |
//! | State Variable | 12 dB/oct | TPT state-variable filter, Butterworth damping |
//!
//! ## Cutoff Mapping
//!
//! Cutoff parameters are normalized to `0..=1` and mapped exponentially:
//!
//! ```text
//! cutoff_hz = 20 * 1000^cutoff
//! ```
//!
//! so `0.0` is 20 Hz, `0.5` is ~632 Hz and `1.0` is 20 kHz. Equal knob
//! travel gives an equal musical interval, matching how we hear pitch.

use std::f64::consts::{PI, SQRT_2};

use nih_plug::prelude::Enum;

use crate::dsp::ParamIndexError;

const MIN_CUTOFF_HZ: f64 = 20.0;
const CUTOFF_RANGE: f64 = 1000.0;

#[derive(Enum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    #[default]
    #[id = "1-pole"]
    #[name = "1 Pole"]
    OnePole,
    #[id = "2-pole"]
    #[name = "2 Pole"]
    TwoPole,
    #[id = "4-pole"]
    #[name = "4 Pole"]
    FourPole,
    #[id = "state-variable"]
    #[name = "State Variable"]
    StateVariable,
}

impl FilterMode {
    pub const ALL: [FilterMode; 4] = [
        FilterMode::OnePole,
        FilterMode::TwoPole,
        FilterMode::FourPole,
        FilterMode::StateVariable,
    ];

    /// Convert a raw host index, falling back to [`FilterMode::OnePole`].
    pub fn from_raw(index: i32) -> Self {
        Self::try_from(index).unwrap_or_default()
    }
}

impl TryFrom<i32> for FilterMode {
    type Error = ParamIndexError;

    fn try_from(index: i32) -> Result<Self, Self::Error> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ParamIndexError {
                param: "filter mode",
                index,
            })
    }
}

/// Map a normalized cutoff to Hz.
pub fn cutoff_to_hz(cutoff: f64) -> f64 {
    MIN_CUTOFF_HZ * CUTOFF_RANGE.powf(cutoff)
}

/// Pre-warped integrator gain `g = tan(pi * fc / fs)` for a normalized
/// cutoff. The cutoff is clamped just below Nyquist so `tan()` stays
/// finite.
fn integrator_gain(cutoff: f64, dt: f64) -> f64 {
    let nyquist_guard = 0.49 / dt;
    let hz = cutoff_to_hz(cutoff).clamp(MIN_CUTOFF_HZ.min(nyquist_guard), nyquist_guard);
    (PI * hz * dt).tan()
}

/// A mono filter that can produce either a lowpass or a highpass output.
pub trait Filter: Default {
    /// Process one sample. `cutoff` is normalized (see [`cutoff_to_hz`]).
    fn process(&mut self, dt: f64, input: f64, cutoff: f64, high_pass: bool) -> f64;

    /// Clear the filter's memory.
    fn reset(&mut self);
}

/// A one-pole (6 dB/octave) TPT filter.
#[derive(Debug, Clone, Default)]
pub struct OnePoleFilter {
    /// Integrator state, the filter's only memory.
    state: f64,
}

impl Filter for OnePoleFilter {
    fn process(&mut self, dt: f64, input: f64, cutoff: f64, high_pass: bool) -> f64 {
        let g = integrator_gain(cutoff, dt);
        let v = (input - self.state) * g / (1.0 + g);
        let low = v + self.state;
        self.state = low + v;
        if high_pass {
            input - low
        } else {
            low
        }
    }

    fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// Two one-poles in series (12 dB/octave).
#[derive(Debug, Clone, Default)]
pub struct TwoPoleFilter {
    stages: [OnePoleFilter; 2],
}

impl Filter for TwoPoleFilter {
    fn process(&mut self, dt: f64, input: f64, cutoff: f64, high_pass: bool) -> f64 {
        self.stages
            .iter_mut()
            .fold(input, |x, stage| stage.process(dt, x, cutoff, high_pass))
    }

    fn reset(&mut self) {
        self.stages.iter_mut().for_each(|stage| stage.reset());
    }
}

/// Two two-poles in series (24 dB/octave).
#[derive(Debug, Clone, Default)]
pub struct FourPoleFilter {
    stages: [TwoPoleFilter; 2],
}

impl Filter for FourPoleFilter {
    fn process(&mut self, dt: f64, input: f64, cutoff: f64, high_pass: bool) -> f64 {
        self.stages
            .iter_mut()
            .fold(input, |x, stage| stage.process(dt, x, cutoff, high_pass))
    }

    fn reset(&mut self) {
        self.stages.iter_mut().for_each(|stage| stage.reset());
    }
}

/// TPT state-variable filter with Butterworth damping (Q = 1/sqrt(2)).
#[derive(Debug, Clone, Default)]
pub struct StateVariableFilter {
    ic1: f64,
    ic2: f64,
}

impl Filter for StateVariableFilter {
    fn process(&mut self, dt: f64, input: f64, cutoff: f64, high_pass: bool) -> f64 {
        let g = integrator_gain(cutoff, dt);
        let k = SQRT_2;
        let a1 = 1.0 / (1.0 + g * (g + k));
        let a2 = g * a1;
        let a3 = g * a2;

        let v3 = input - self.ic2;
        let v1 = a1 * self.ic1 + a2 * v3;
        let v2 = self.ic2 + a2 * self.ic1 + a3 * v3;
        self.ic1 = 2.0 * v1 - self.ic1;
        self.ic2 = 2.0 * v2 - self.ic2;

        if high_pass {
            input - k * v1 - v2
        } else {
            v2
        }
    }

    fn reset(&mut self) {
        self.ic1 = 0.0;
        self.ic2 = 0.0;
    }
}

/// A left/right pair of identical filters.
#[derive(Debug, Clone, Default)]
pub struct DualFilter<F: Filter> {
    left: F,
    right: F,
}

impl<F: Filter> DualFilter<F> {
    pub fn process(
        &mut self,
        dt: f64,
        (l, r): (f64, f64),
        cutoff: f64,
        high_pass: bool,
    ) -> (f64, f64) {
        (
            self.left.process(dt, l, cutoff, high_pass),
            self.right.process(dt, r, cutoff, high_pass),
        )
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

/// A stereo filter whose topology is chosen by [`FilterMode`].
///
/// Every topology keeps its own state, but only the active one runs. When
/// the mode changes, the newly selected topology is cleared first so it
/// doesn't resume from history that is arbitrarily old.
#[derive(Debug, Clone, Default)]
pub struct MultiFilter {
    high_pass: bool,
    mode: FilterMode,
    one_pole: DualFilter<OnePoleFilter>,
    two_pole: DualFilter<TwoPoleFilter>,
    four_pole: DualFilter<FourPoleFilter>,
    state_variable: DualFilter<StateVariableFilter>,
}

impl MultiFilter {
    pub fn low_pass() -> Self {
        Self::default()
    }

    pub fn high_pass() -> Self {
        Self {
            high_pass: true,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        match mode {
            FilterMode::OnePole => self.one_pole.reset(),
            FilterMode::TwoPole => self.two_pole.reset(),
            FilterMode::FourPole => self.four_pole.reset(),
            FilterMode::StateVariable => self.state_variable.reset(),
        }
    }

    pub fn process(&mut self, dt: f64, input: (f64, f64), cutoff: f64) -> (f64, f64) {
        let high_pass = self.high_pass;
        match self.mode {
            FilterMode::OnePole => self.one_pole.process(dt, input, cutoff, high_pass),
            FilterMode::TwoPole => self.two_pole.process(dt, input, cutoff, high_pass),
            FilterMode::FourPole => self.four_pole.process(dt, input, cutoff, high_pass),
            FilterMode::StateVariable => {
                self.state_variable.process(dt, input, cutoff, high_pass)
            }
        }
    }

    pub fn reset(&mut self) {
        self.one_pole.reset();
        self.two_pole.reset();
        self.four_pole.reset();
        self.state_variable.reset();
    }
}

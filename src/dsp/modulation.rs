//! # Delay-Time Modulation
//!
//! The delay time heard at any moment is built from three pieces:
//!
//! 1. A **base time**: either the free-running `Delay Time` knob in
//!    seconds, or a musical note length derived from the host tempo.
//! 2. An **LFO**: a sine wave that wobbles the time periodically
//!    (chorus-like pitch vibrato on the repeats).
//! 3. **Drift**: a damped random walk that wanders slowly, like the speed
//!    instability of an old tape transport.
//!
//! ## Why exponentiation?
//!
//! Both modulators are applied as exponents rather than offsets:
//!
//! ```text
//! time = base ^ (1 + amount * sin(phase))
//! ```
//!
//! The same knob setting therefore produces a proportionate wobble whether
//! the base time is a 1/64 note or a whole note, instead of a fixed number
//! of milliseconds that would be enormous on short delays and inaudible on
//! long ones.

use std::f64::consts::TAU;

use nih_plug::prelude::Enum;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::dsp::ParamIndexError;

/// Tempo used when the host doesn't report one.
pub const DEFAULT_BPM: f64 = 120.0;

/// Musical note division used for tempo-synced delay times.
#[derive(Enum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TempoSync {
    #[default]
    #[id = "off"]
    #[name = "Off"]
    Off,
    #[id = "1"]
    #[name = "1"]
    Whole,
    #[id = "1/2d"]
    #[name = "1/2D"]
    DottedHalf,
    #[id = "1/2"]
    #[name = "1/2"]
    Half,
    #[id = "1/2t"]
    #[name = "1/2T"]
    TripletHalf,
    #[id = "1/4d"]
    #[name = "1/4D"]
    DottedQuarter,
    #[id = "1/4"]
    #[name = "1/4"]
    Quarter,
    #[id = "1/4t"]
    #[name = "1/4T"]
    TripletQuarter,
    #[id = "1/8d"]
    #[name = "1/8D"]
    DottedEighth,
    #[id = "1/8"]
    #[name = "1/8"]
    Eighth,
    #[id = "1/8t"]
    #[name = "1/8T"]
    TripletEighth,
    #[id = "1/16d"]
    #[name = "1/16D"]
    DottedSixteenth,
    #[id = "1/16"]
    #[name = "1/16"]
    Sixteenth,
    #[id = "1/16t"]
    #[name = "1/16T"]
    TripletSixteenth,
    #[id = "1/32d"]
    #[name = "1/32D"]
    DottedThirtySecond,
    #[id = "1/32"]
    #[name = "1/32"]
    ThirtySecond,
    #[id = "1/32t"]
    #[name = "1/32T"]
    TripletThirtySecond,
    #[id = "1/64d"]
    #[name = "1/64D"]
    DottedSixtyFourth,
    #[id = "1/64"]
    #[name = "1/64"]
    SixtyFourth,
    #[id = "1/64t"]
    #[name = "1/64T"]
    TripletSixtyFourth,
}

impl TempoSync {
    pub const ALL: [TempoSync; 20] = [
        TempoSync::Off,
        TempoSync::Whole,
        TempoSync::DottedHalf,
        TempoSync::Half,
        TempoSync::TripletHalf,
        TempoSync::DottedQuarter,
        TempoSync::Quarter,
        TempoSync::TripletQuarter,
        TempoSync::DottedEighth,
        TempoSync::Eighth,
        TempoSync::TripletEighth,
        TempoSync::DottedSixteenth,
        TempoSync::Sixteenth,
        TempoSync::TripletSixteenth,
        TempoSync::DottedThirtySecond,
        TempoSync::ThirtySecond,
        TempoSync::TripletThirtySecond,
        TempoSync::DottedSixtyFourth,
        TempoSync::SixtyFourth,
        TempoSync::TripletSixtyFourth,
    ];

    /// Length of this division in quarter-note beats, or `None` when sync
    /// is off.
    ///
    /// Dotted values are 1.5x and triplets 2/3 of the plain division.
    pub fn beats(self) -> Option<f64> {
        let beats = match self {
            TempoSync::Off => return None,
            TempoSync::Whole => 4.0,
            TempoSync::DottedHalf => 3.0,
            TempoSync::Half => 2.0,
            TempoSync::TripletHalf => 4.0 / 3.0,
            TempoSync::DottedQuarter => 3.0 / 2.0,
            TempoSync::Quarter => 1.0,
            TempoSync::TripletQuarter => 2.0 / 3.0,
            TempoSync::DottedEighth => 3.0 / 4.0,
            TempoSync::Eighth => 1.0 / 2.0,
            TempoSync::TripletEighth => 1.0 / 3.0,
            TempoSync::DottedSixteenth => 3.0 / 8.0,
            TempoSync::Sixteenth => 1.0 / 4.0,
            TempoSync::TripletSixteenth => 1.0 / 6.0,
            TempoSync::DottedThirtySecond => 3.0 / 16.0,
            TempoSync::ThirtySecond => 1.0 / 8.0,
            TempoSync::TripletThirtySecond => 1.0 / 12.0,
            TempoSync::DottedSixtyFourth => 3.0 / 32.0,
            TempoSync::SixtyFourth => 1.0 / 16.0,
            TempoSync::TripletSixtyFourth => 1.0 / 24.0,
        };
        Some(beats)
    }

    /// Convert a raw host index, falling back to [`TempoSync::Off`].
    pub fn from_raw(index: i32) -> Self {
        Self::try_from(index).unwrap_or_default()
    }
}

impl TryFrom<i32> for TempoSync {
    type Error = ParamIndexError;

    fn try_from(index: i32) -> Result<Self, Self::Error> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(ParamIndexError {
                param: "tempo sync",
                index,
            })
    }
}

/// Unmodulated delay time in seconds.
///
/// `bpm` falls back to [`DEFAULT_BPM`] when the host has no tempo.
pub fn base_delay_time(free_time: f64, sync: TempoSync, bpm: Option<f64>) -> f64 {
    match sync.beats() {
        None => free_time,
        Some(beats) => {
            let bpm = bpm.filter(|b| b.is_finite() && *b > 0.0).unwrap_or(DEFAULT_BPM);
            60.0 / bpm * beats
        }
    }
}

/// Apply the exponential modulation law: `time ^ (1 + amount * wave)`.
///
/// A zero amount leaves the time bit-for-bit unchanged.
#[inline]
pub fn modulate(time: f64, amount: f64, wave: f64) -> f64 {
    if amount == 0.0 {
        time
    } else {
        time.powf(1.0 + amount * wave)
    }
}

/// Sine LFO with a phase in `[0, 1)`.
#[derive(Debug, Clone, Default)]
pub struct Lfo {
    phase: f64,
}

impl Lfo {
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Current output, in `[-1, 1]`.
    pub fn value(&self) -> f64 {
        (self.phase * TAU).sin()
    }

    pub fn advance(&mut self, frequency: f64, dt: f64) {
        self.phase += frequency * dt;
        if self.phase >= 1.0 || self.phase < 0.0 {
            self.phase = self.phase.rem_euclid(1.0);
        }
    }
}

/// Damped random walk that drives the tape-drift modulation.
///
/// Each tick the velocity is kicked by a uniform random impulse scaled by
/// `speed`, then damped in proportion to `sqrt(speed)`. The phase
/// integrates the velocity and is used as the argument of a sine, so it
/// can grow without bound while the modulation itself stays in `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct Drift {
    rng: ChaCha8Rng,
    velocity: f64,
    phase: f64,
}

impl Drift {
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            rng,
            velocity: 0.0,
            phase: 0.0,
        }
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Current output, in `[-1, 1]`.
    pub fn value(&self) -> f64 {
        self.phase.sin()
    }

    pub fn advance(&mut self, speed: f64, dt: f64) {
        let kick: f64 = self.rng.gen_range(-1.0..1.0);
        self.velocity += kick * 10_000.0 * speed * dt;
        self.velocity -= self.velocity * 2.0 * speed.max(0.0).sqrt() * dt;
        self.phase += self.velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn quarter_secs(bpm: f64) -> f64 {
        base_delay_time(0.2, TempoSync::Quarter, Some(bpm))
    }

    #[test]
    fn test_sync_off_uses_free_time() {
        assert_eq!(base_delay_time(0.37, TempoSync::Off, Some(90.0)), 0.37);
        assert_eq!(base_delay_time(0.37, TempoSync::Off, None), 0.37);
    }

    #[test]
    fn test_quarter_note_at_120_is_half_a_second() {
        assert!((quarter_secs(120.0) - 0.5).abs() < 1e-12);
        let fallback = base_delay_time(0.2, TempoSync::Quarter, None);
        assert!((fallback - 0.5).abs() < 1e-12, "missing tempo should mean 120 BPM");
    }

    #[test]
    fn test_sync_ratios_are_consistent() {
        let bpm = 97.0;
        let q = quarter_secs(bpm);
        let t = |s| base_delay_time(0.2, s, Some(bpm));

        assert!((t(TempoSync::Whole) - 4.0 * q).abs() < 1e-12);
        assert!((t(TempoSync::Half) - 2.0 * q).abs() < 1e-12);
        assert!((t(TempoSync::Eighth) - 0.5 * q).abs() < 1e-12);
        assert!((t(TempoSync::Sixteenth) - 0.25 * q).abs() < 1e-12);
        assert!((t(TempoSync::SixtyFourth) - q / 16.0).abs() < 1e-12);

        let plain = [
            (TempoSync::DottedHalf, TempoSync::Half, TempoSync::TripletHalf),
            (TempoSync::DottedQuarter, TempoSync::Quarter, TempoSync::TripletQuarter),
            (TempoSync::DottedEighth, TempoSync::Eighth, TempoSync::TripletEighth),
            (TempoSync::DottedSixteenth, TempoSync::Sixteenth, TempoSync::TripletSixteenth),
            (
                TempoSync::DottedThirtySecond,
                TempoSync::ThirtySecond,
                TempoSync::TripletThirtySecond,
            ),
            (TempoSync::DottedSixtyFourth, TempoSync::SixtyFourth, TempoSync::TripletSixtyFourth),
        ];
        for (dotted, straight, triplet) in plain {
            assert!((t(dotted) - 1.5 * t(straight)).abs() < 1e-12, "{dotted:?}");
            assert!((t(triplet) - 2.0 / 3.0 * t(straight)).abs() < 1e-12, "{triplet:?}");
        }
    }

    #[test]
    fn test_straight_divisions_shrink_monotonically() {
        let order = [
            TempoSync::Whole,
            TempoSync::Half,
            TempoSync::Quarter,
            TempoSync::Eighth,
            TempoSync::Sixteenth,
            TempoSync::ThirtySecond,
            TempoSync::SixtyFourth,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].beats() > pair[1].beats(), "{:?} vs {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_raw_index_conversion() {
        assert_eq!(TempoSync::try_from(6), Ok(TempoSync::Quarter));
        assert_eq!(TempoSync::from_raw(19), TempoSync::TripletSixtyFourth);
        assert!(TempoSync::try_from(20).is_err());
        assert_eq!(TempoSync::from_raw(-1), TempoSync::Off);
        assert_eq!(TempoSync::from_raw(42), TempoSync::Off);
    }

    #[test]
    fn test_zero_amount_is_exact() {
        assert_eq!(modulate(0.731, 0.0, 0.9), 0.731);
        assert_eq!(modulate(1.7, 0.3, 0.0), 1.7);
    }

    #[test]
    fn test_lfo_phase_wraps() {
        let mut lfo = Lfo::default();
        for _ in 0..10_000 {
            lfo.advance(7.3, 1.0 / 44_100.0);
            assert!((0.0..1.0).contains(&lfo.phase()));
        }
        let expected = (7.3 * 10_000.0 / 44_100.0_f64).fract();
        assert!((lfo.phase() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_drift_stays_damped() {
        let mut drift = Drift::new(ChaCha8Rng::seed_from_u64(7));
        let dt = 1.0 / 48_000.0;
        let mut peak = 0.0_f64;
        for _ in 0..48_000 * 10 {
            drift.advance(10.0, dt);
            peak = peak.max(drift.velocity().abs());
        }
        assert!(drift.phase().is_finite());
        assert!(peak < 1_000.0, "drift velocity ran away: {peak}");
        assert!((-1.0..=1.0).contains(&drift.value()));
    }
}

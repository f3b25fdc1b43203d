//! # Drive (Tape Saturation)
//!
//! The drive stage saturates the delayed signal before it's written back
//! to the tape. Because it sits inside the feedback loop, each repeat is
//! driven once more than the last: early echoes stay clean, late echoes
//! get fuzzier and softer.
//!
//! One drive pass is:
//!
//! ```text
//! x ──► × gain ──► [stateful saturator] ──► ÷ gain ──► [2-pole lowpass] ──►
//! ```
//!
//! Multiplying by the gain pushes the signal further into the curve;
//! dividing it back out afterwards keeps the overall level roughly where
//! it was, so the knob changes *character* rather than loudness. The pass
//! can be repeated up to 16 times per sample for a heavier, more smeared
//! sound; the interstage lowpass keeps the generated harmonics in check.
//!
//! ## The saturator
//!
//! A plain waveshaper (`y = tanh(x)`) has no memory. Ours feeds half of
//! the previous sample's saturation error (`shaped - input`) into the
//! next sample's argument. For small signals the error is ~0 and the
//! stage is transparent; when the curve bends, the error pushes the next
//! sample a little further into it, which softens transients the way
//! magnetic tape does. Output is always bounded by ±1 in the driven
//! domain, and flipping the sign of the input history flips the output.

use crate::dsp::filter::{DualFilter, TwoPoleFilter};

/// Fraction of the previous saturation error fed into the next sample.
const HYSTERESIS: f64 = 0.5;

/// Upper bound on drive passes per sample.
pub const MAX_ITERATIONS: u32 = 16;

/// The memoryless part of the curve: smooth, odd, bounded by ±1.
#[inline]
pub fn saturate(x: f64) -> f64 {
    x.tanh()
}

/// A saturator with one sample of memory. See the module docs.
#[derive(Debug, Clone, Default)]
pub struct StatefulDrive {
    error: f64,
}

impl StatefulDrive {
    /// Saturate `input`, blending `mix` (0 = dry, 1 = fully saturated).
    pub fn process(&mut self, input: f64, mix: f64) -> f64 {
        let shaped = saturate(input + self.error * HYSTERESIS);
        self.error = shaped - input;
        input + (shaped - input) * mix
    }

    pub fn reset(&mut self) {
        self.error = 0.0;
    }
}

/// Per-sample drive settings, copied out of the parameter snapshot.
#[derive(Debug, Clone, Copy)]
pub struct DriveSettings {
    pub gain: f64,
    pub mix: f64,
    pub cutoff: f64,
    pub iterations: u32,
}

/// Stereo drive stage: one saturator per channel plus the interstage
/// lowpass.
#[derive(Debug, Clone, Default)]
pub struct DriveStage {
    left: StatefulDrive,
    right: StatefulDrive,
    filter: DualFilter<TwoPoleFilter>,
}

impl DriveStage {
    /// Run the stage on one stereo sample.
    ///
    /// A gain of zero (or below) bypasses the stage entirely, which also
    /// keeps the `÷ gain` normalization from dividing by zero.
    pub fn process(
        &mut self,
        dt: f64,
        (mut l, mut r): (f64, f64),
        settings: DriveSettings,
    ) -> (f64, f64) {
        if settings.gain <= 0.0 {
            return (l, r);
        }

        let gain = settings.gain;
        for _ in 0..settings.iterations.clamp(1, MAX_ITERATIONS) {
            l = self.left.process(l * gain, settings.mix) / gain;
            r = self.right.process(r * gain, settings.mix) / gain;
            (l, r) = self.filter.process(dt, (l, r), settings.cutoff, false);
        }
        (l, r)
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
        self.filter.reset();
    }
}

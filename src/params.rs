//! # Plugin Parameters
//!
//! Parameters are the knobs and sliders the user sees in the DAW. Each
//! parameter has:
//!
//! - A **unique string ID** (`#[id = "..."]`) that the host uses to
//!   save and recall presets. Once published, never change these IDs
//!   or existing presets will break.
//! - A **human-readable name** shown in the DAW's UI.
//! - A **range** (min, max, and optional skew).
//! - A **default value**.
//!
//! ## No host-side smoothing
//!
//! Unlike most plugins, none of these parameters use nih-plug's
//! smoothers. The engine smooths exactly the values that would click
//! (read-head positions and pan amounts) with its own fixed-rate
//! followers, and reads everything else raw, once per sample, through a
//! [`ParameterSnapshot`].

use std::f32::consts::FRAC_PI_2;

use nih_plug::prelude::*;

use crate::dsp::filter::FilterMode;
use crate::dsp::modulation::TempoSync;
use crate::dsp::pan::PanMode;
use crate::engine::ParameterSnapshot;

/// All user-facing parameters for Cocoa Delay.
#[derive(Params)]
pub struct PluginParams {
    /// **Delay Time** in seconds, used when tempo sync is off.
    #[id = "delayTime"]
    pub delay_time: FloatParam,

    /// **LFO Amount**: depth of the periodic delay-time wobble.
    #[id = "lfoAmount"]
    pub lfo_amount: FloatParam,

    /// **LFO Frequency** in Hz.
    #[id = "lfoFrequency"]
    pub lfo_frequency: FloatParam,

    /// **Drift Amount**: depth of the random tape-speed wander.
    #[id = "driftAmount"]
    pub drift_amount: FloatParam,

    /// **Drift Speed**: how quickly the wander changes direction.
    #[id = "driftSpeed"]
    pub drift_speed: FloatParam,

    /// **Tempo Sync Time**: a note length that overrides `Delay Time`.
    #[id = "tempoSyncTime"]
    pub tempo_sync: EnumParam<TempoSync>,

    /// **Feedback**: how much of each repeat is written back to the tape.
    /// Negative values flip the polarity of every other repeat.
    #[id = "feedback"]
    pub feedback: FloatParam,

    /// **Stereo Offset**: pushes the left and right delay times apart.
    #[id = "stereoOffset"]
    pub stereo_offset: FloatParam,

    #[id = "panMode"]
    pub pan_mode: EnumParam<PanMode>,

    /// **Panning** in radians: a balance angle in Static and Ping Pong
    /// modes, a per-repeat rotation in Circular mode.
    #[id = "pan"]
    pub pan: FloatParam,

    /// **Ducking Amount**: how hard the input pushes the echoes down.
    #[id = "duckAmount"]
    pub duck_amount: FloatParam,

    #[id = "duckAttackSpeed"]
    pub duck_attack_speed: FloatParam,

    #[id = "duckReleaseSpeed"]
    pub duck_release_speed: FloatParam,

    /// **Filter Mode**: topology shared by the lowpass and highpass.
    #[id = "filterMode"]
    pub filter_mode: EnumParam<FilterMode>,

    #[id = "lowPassCutoff"]
    pub low_pass_cutoff: FloatParam,

    #[id = "highPassCutoff"]
    pub high_pass_cutoff: FloatParam,

    /// **Drive Amount**: 0 bypasses the drive stage.
    #[id = "driveGain"]
    pub drive_gain: FloatParam,

    #[id = "driveMix"]
    pub drive_mix: FloatParam,

    #[id = "driveCutoff"]
    pub drive_cutoff: FloatParam,

    /// **Drive Iterations**: drive passes per sample.
    #[id = "driveIterations"]
    pub drive_iterations: IntParam,

    #[id = "dryVolume"]
    pub dry_volume: FloatParam,

    #[id = "wetVolume"]
    pub wet_volume: FloatParam,
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            delay_time: FloatParam::new(
                "Delay Time",
                0.2,
                FloatRange::Skewed {
                    min: 0.001,
                    max: 2.0,
                    // Most of the knob travel goes to short and medium
                    // delays, where small changes are most audible.
                    factor: FloatRange::skew_factor(-1.5),
                },
            )
            .with_unit(" s")
            .with_value_to_string(formatters::v2s_f32_rounded(3)),

            lfo_amount: FloatParam::new(
                "LFO Amount",
                0.0,
                FloatRange::Linear { min: 0.0, max: 0.5 },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(3)),

            lfo_frequency: FloatParam::new(
                "LFO Frequency",
                2.0,
                FloatRange::Skewed {
                    min: 0.1,
                    max: 10.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" Hz")
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            drift_amount: FloatParam::new(
                "Drift Amount",
                0.001,
                FloatRange::Skewed {
                    min: 0.0,
                    max: 0.05,
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(4)),

            drift_speed: FloatParam::new(
                "Drift Speed",
                1.0,
                FloatRange::Skewed {
                    min: 0.1,
                    max: 10.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            tempo_sync: EnumParam::new("Tempo Sync Time", TempoSync::Off),

            feedback: FloatParam::new("Feedback", 0.5, FloatRange::Linear { min: -1.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            stereo_offset: FloatParam::new(
                "Stereo Offset",
                0.0,
                FloatRange::Linear { min: -0.5, max: 0.5 },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(3)),

            pan_mode: EnumParam::new("Pan Mode", PanMode::Stationary),

            pan: FloatParam::new(
                "Panning",
                0.0,
                FloatRange::Linear {
                    min: -FRAC_PI_2,
                    max: FRAC_PI_2,
                },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            duck_amount: FloatParam::new(
                "Ducking Amount",
                0.0,
                FloatRange::Linear { min: 0.0, max: 10.0 },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            duck_attack_speed: FloatParam::new(
                "Ducking Attack",
                10.0,
                FloatRange::Skewed {
                    min: 0.1,
                    max: 100.0,
                    factor: FloatRange::skew_factor(-1.5),
                },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(1)),

            duck_release_speed: FloatParam::new(
                "Ducking Release",
                10.0,
                FloatRange::Skewed {
                    min: 0.1,
                    max: 100.0,
                    factor: FloatRange::skew_factor(-1.5),
                },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(1)),

            filter_mode: EnumParam::new("Filter Mode", FilterMode::OnePole),

            // The cutoffs are already exponential in Hz (see `dsp::filter`),
            // so the knobs stay linear.
            low_pass_cutoff: FloatParam::new(
                "Low Pass Cutoff",
                0.75,
                FloatRange::Linear { min: 0.01, max: 1.0 },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(3)),

            high_pass_cutoff: FloatParam::new(
                "High Pass Cutoff",
                0.001,
                FloatRange::Linear { min: 0.001, max: 0.99 },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(3)),

            drive_gain: FloatParam::new(
                "Drive Amount",
                0.1,
                FloatRange::Skewed {
                    min: 0.0,
                    max: 10.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            drive_mix: FloatParam::new("Drive Mix", 1.0, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            drive_cutoff: FloatParam::new(
                "Drive Filter Cutoff",
                1.0,
                FloatRange::Linear { min: 0.01, max: 1.0 },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(3)),

            drive_iterations: IntParam::new(
                "Drive Iterations",
                1,
                IntRange::Linear { min: 1, max: 16 },
            ),

            dry_volume: FloatParam::new(
                "Dry Volume",
                1.0,
                FloatRange::Linear { min: 0.0, max: 2.0 },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(2)),

            wet_volume: FloatParam::new(
                "Wet Volume",
                0.5,
                FloatRange::Linear { min: 0.0, max: 2.0 },
            )
            .with_value_to_string(formatters::v2s_f32_rounded(2)),
        }
    }
}

impl PluginParams {
    /// Copy every current value into a plain snapshot for the engine.
    ///
    /// Called once per sample on the audio thread; it only performs
    /// atomic loads.
    pub fn snapshot(&self, tempo_bpm: Option<f64>) -> ParameterSnapshot {
        ParameterSnapshot {
            delay_time: self.delay_time.value() as f64,
            lfo_amount: self.lfo_amount.value() as f64,
            lfo_frequency: self.lfo_frequency.value() as f64,
            drift_amount: self.drift_amount.value() as f64,
            drift_speed: self.drift_speed.value() as f64,
            tempo_sync: self.tempo_sync.value(),
            feedback: self.feedback.value() as f64,
            stereo_offset: self.stereo_offset.value() as f64,
            pan_mode: self.pan_mode.value(),
            pan: self.pan.value() as f64,
            duck_amount: self.duck_amount.value() as f64,
            duck_attack_speed: self.duck_attack_speed.value() as f64,
            duck_release_speed: self.duck_release_speed.value() as f64,
            filter_mode: self.filter_mode.value(),
            low_pass_cutoff: self.low_pass_cutoff.value() as f64,
            high_pass_cutoff: self.high_pass_cutoff.value() as f64,
            drive_gain: self.drive_gain.value() as f64,
            drive_mix: self.drive_mix.value() as f64,
            drive_cutoff: self.drive_cutoff.value() as f64,
            drive_iterations: self.drive_iterations.value().clamp(1, 16) as u32,
            dry_volume: self.dry_volume.value() as f64,
            wet_volume: self.wet_volume.value() as f64,
            tempo_bpm,
        }
    }
}

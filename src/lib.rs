//! # Cocoa Delay: a modulated tape-style delay plugin
//!
//! A stereo delay built with [nih-plug](https://github.com/robbert-vdh/nih-plug)
//! and exported as Audio Unit (AUv2), VST3, and CLAP from a single
//! codebase. It behaves like a tape echo with a few extra tricks: tempo
//! sync, LFO and random drift on the delay time, three pan modes, ducking,
//! a multi-mode filter pair and an iterative drive stage, all inside the
//! feedback loop.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬──────────────────────────────────────────────── × dry ────────┐
//!         │                                                               │
//!         ├─► [duck follower] ──────────────────────────────┐             │
//!         │                                                 ▼             │
//!         │    ┌────────────── FEEDBACK LOOP ───────────┐  × wet          │
//!         │    │                                        │  × (1 - duck)   │
//!         └─►(+)─► [Tape] ─► [Circular pan] ─► [LP/HP] ─► [Drive] ─┬─►────(+)──► Output
//!              ▲   (LFO + drift                                    │
//!              │    move the read head)                            │
//!              └──────────────── × feedback ───────────────────────┘
//! ```
//!
//! All of the per-sample DSP lives in [`engine::DelayEngine`]; this file
//! is the host-facing shell around it.

pub mod dsp;
pub mod engine;
pub mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use engine::DelayEngine;
use nih_plug::prelude::*;
use params::PluginParams;

/// Feedback magnitude above which the repeats are treated as infinite.
const SUSTAINING_FEEDBACK: f64 = 0.999;

/// The main plugin struct.
///
/// Parameters (`PluginParams`) are shared with the host via `Arc` and can
/// be read from any thread. The engine (tape, filters, modulators) is
/// owned exclusively by the audio thread and only touched in
/// `initialize()`, `reset()` and `process()`.
struct CocoaDelay {
    params: Arc<PluginParams>,
    engine: DelayEngine,
}

impl Default for CocoaDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            // The tape stays empty until initialize() tells us the sample
            // rate.
            engine: DelayEngine::default(),
        }
    }
}

impl Plugin for CocoaDelay {
    const NAME: &'static str = "Cocoa Delay";
    const VENDOR: &'static str = "Cocoa Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first, since most DAW tracks are stereo. The mono layout
    // runs the same engine with the input mirrored into both tapes.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Pan-mode switches and tempo-sync changes are picked up on the exact
    // sample the host automates them.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the tape for the host's sample rate.
    ///
    /// This is the only place the engine allocates. nih-plug calls it off
    /// the audio thread whenever the sample rate or layout changes, and
    /// always before the next `process()`.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_channels = audio_io_layout
            .main_output_channels
            .map(NonZeroU32::get)
            .unwrap_or(0);
        if num_channels == 0 {
            nih_log!("Refusing layout without main output channels");
            return false;
        }

        self.engine.prepare(buffer_config.sample_rate as f64);
        nih_log!(
            "Initialized at {} Hz, {} channel(s), tape of {} samples",
            self.engine.sample_rate(),
            num_channels,
            self.engine.capacity()
        );

        true
    }

    /// Called when playback stops or the plugin is bypassed. Clears the
    /// tape so stale echoes don't bleed into the next playback.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // The host tempo can only change between blocks.
        let tempo_bpm = context.transport().tempo;

        for mut channel_samples in buffer.iter_samples() {
            let params = self.params.snapshot(tempo_bpm);

            match channel_samples.len() {
                0 => {}
                1 => {
                    let Some(sample) = channel_samples.get_mut(0) else {
                        continue;
                    };
                    *sample = self.engine.process_sample_mono(*sample as f64, &params) as f32;
                }
                _ => {
                    let mut samples = channel_samples.iter_mut();
                    let (Some(left), Some(right)) = (samples.next(), samples.next()) else {
                        continue;
                    };
                    let (out_l, out_r) =
                        self.engine.process_sample(*left as f64, *right as f64, &params);
                    *left = out_l as f32;
                    *right = out_r as f32;
                }
            }
        }

        self.tail_status()
    }
}

impl CocoaDelay {
    /// How long the host should keep calling `process()` after the input
    /// goes silent.
    ///
    /// Each trip around the loop scales the echo by `|feedback|`, so
    /// reaching -60 dB (a factor of 0.001) takes
    ///
    /// ```text
    /// N = log10(0.001) / log10(|feedback|) = -3 / log10(|feedback|)
    /// ```
    ///
    /// repeats, each as long as the longest read head. Near-unity feedback
    /// never decays, so the plugin asks to be kept alive instead.
    fn tail_status(&self) -> ProcessStatus {
        let feedback = (self.params.feedback.value() as f64).abs();
        if feedback >= SUSTAINING_FEEDBACK {
            return ProcessStatus::KeepAlive;
        }

        let (read_l, read_r) = self.engine.read_positions();
        let repeat_samples = read_l.max(read_r).max(1.0);
        let repeats = if feedback > 0.001 {
            1.0 - 3.0 / feedback.log10()
        } else {
            1.0
        };

        ProcessStatus::Tail((repeats * repeat_samples).min(u32::MAX as f64) as u32)
    }
}

impl ClapPlugin for CocoaDelay {
    const CLAP_ID: &'static str = "com.cocoa-audio.cocoa-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A modulated tape-style delay with drift, ducking and drive");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for CocoaDelay {
    const VST3_CLASS_ID: [u8; 16] = *b"CocoaDelay__v001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(CocoaDelay);
nih_export_vst3!(CocoaDelay);

// Wrap the CLAP plugin into AUv2 format for Logic Pro.
clap_wrapper::export_auv2!();

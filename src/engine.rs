//! # The Delay Engine
//!
//! `DelayEngine` owns every piece of audio-rate state: the tape, the
//! read heads, the modulators, the pan and ducking followers, the
//! filters and the drive. The plugin shell hands it one stereo frame at a
//! time together with a [`ParameterSnapshot`], and gets one stereo frame
//! back.
//!
//! ## Per-sample order
//!
//! ```text
//! pan fade / smoothing ─► read-head targets ─► duck follower ─► LFO, drift
//!         │
//!         ▼
//! read tape ─► circular pan ─► lowpass ─► highpass ─► drive ─┬─► × wet × (1 - duck) ─► (+) ─► out
//!                                                            │                        ▲
//! input ─► write-side pan ─► (+ feedback × wet) ─► [ping-pong swap] ─► tape           │
//!   └───────────────────────────────────── × dry ─────────────────────────────────────┘
//! ```
//!
//! Nothing in [`DelayEngine::process_sample`] allocates, locks, or does
//! I/O. The tape is sized in [`DelayEngine::prepare`], which the plugin
//! calls from `initialize()`, off the audio thread.

use nih_plug::{nih_debug_assert, nih_log};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::dsp::delay_line::DelayLine;
use crate::dsp::drive::{DriveSettings, DriveStage};
use crate::dsp::ducking::DuckFollower;
use crate::dsp::filter::{FilterMode, MultiFilter};
use crate::dsp::modulation::{base_delay_time, modulate, Drift, Lfo, TempoSync};
use crate::dsp::pan::{adjust_panning, PanMode, PanState};

/// Length of the tape loop. Bounds the longest reachable delay.
pub const TAPE_LENGTH_SECONDS: f64 = 10.0;

/// Sample rate assumed when the host reports something unusable.
pub const FALLBACK_SAMPLE_RATE: f64 = 44_100.0;

/// Rate at which the read heads chase their targets, in Hz.
const READ_SMOOTHING_RATE: f64 = 10.0;

/// The value of every control for one sample, plus the host tempo.
///
/// The engine only ever reads this. Values are assumed to already be
/// inside their parameter ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSnapshot {
    /// Free-running delay time in seconds.
    pub delay_time: f64,
    pub lfo_amount: f64,
    /// LFO rate in Hz.
    pub lfo_frequency: f64,
    pub drift_amount: f64,
    pub drift_speed: f64,
    pub tempo_sync: TempoSync,
    pub feedback: f64,
    pub stereo_offset: f64,
    pub pan_mode: PanMode,
    /// Pan angle in radians.
    pub pan: f64,
    pub duck_amount: f64,
    /// Envelope attack speed in 1/s.
    pub duck_attack_speed: f64,
    /// Envelope release speed in 1/s.
    pub duck_release_speed: f64,
    pub filter_mode: FilterMode,
    /// Normalized lowpass cutoff.
    pub low_pass_cutoff: f64,
    /// Normalized highpass cutoff.
    pub high_pass_cutoff: f64,
    pub drive_gain: f64,
    pub drive_mix: f64,
    /// Normalized cutoff of the lowpass between drive passes.
    pub drive_cutoff: f64,
    pub drive_iterations: u32,
    pub dry_volume: f64,
    pub wet_volume: f64,
    /// Host tempo, if the host reports one.
    pub tempo_bpm: Option<f64>,
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            delay_time: 0.2,
            lfo_amount: 0.0,
            lfo_frequency: 2.0,
            drift_amount: 0.001,
            drift_speed: 1.0,
            tempo_sync: TempoSync::Off,
            feedback: 0.5,
            stereo_offset: 0.0,
            pan_mode: PanMode::Stationary,
            pan: 0.0,
            duck_amount: 0.0,
            duck_attack_speed: 10.0,
            duck_release_speed: 10.0,
            filter_mode: FilterMode::OnePole,
            low_pass_cutoff: 0.75,
            high_pass_cutoff: 0.001,
            drive_gain: 0.1,
            drive_mix: 1.0,
            drive_cutoff: 1.0,
            drive_iterations: 1,
            dry_volume: 1.0,
            wet_volume: 0.5,
            tempo_bpm: None,
        }
    }
}

impl ParameterSnapshot {
    fn drive_settings(&self) -> DriveSettings {
        DriveSettings {
            gain: self.drive_gain,
            mix: self.drive_mix,
            cutoff: self.drive_cutoff,
            iterations: self.drive_iterations,
        }
    }
}

pub struct DelayEngine {
    sample_rate: f64,
    dt: f64,

    /// Left and right tape. Both advance together, so they always share
    /// one write position.
    tape: [DelayLine; 2],
    read_l: f64,
    read_r: f64,
    /// False until the first sample after `prepare()`/`reset()`, which
    /// snaps the read heads straight to their targets.
    warmed_up: bool,

    pan: PanState,
    duck: DuckFollower,
    lfo: Lfo,
    drift: Drift,

    low_pass: MultiFilter,
    high_pass: MultiFilter,
    drive: DriveStage,
}

impl Default for DelayEngine {
    fn default() -> Self {
        Self::new(ChaCha8Rng::from_entropy())
    }
}

impl DelayEngine {
    /// Build an engine whose drift generator draws from `rng`.
    ///
    /// The tape is empty until [`prepare`](Self::prepare) is called; until
    /// then the wet path is silent.
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            sample_rate: FALLBACK_SAMPLE_RATE,
            dt: 1.0 / FALLBACK_SAMPLE_RATE,
            tape: [DelayLine::default(), DelayLine::default()],
            read_l: 0.0,
            read_r: 0.0,
            warmed_up: false,
            pan: PanState::default(),
            duck: DuckFollower::default(),
            lfo: Lfo::default(),
            drift: Drift::new(rng),
            low_pass: MultiFilter::low_pass(),
            high_pass: MultiFilter::high_pass(),
            drive: DriveStage::default(),
        }
    }

    /// Build an engine with reproducible drift.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Allocate a fresh tape for `sample_rate` and reset all state.
    ///
    /// Must not be called from the audio thread.
    pub fn prepare(&mut self, sample_rate: f64) {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            nih_log!(
                "Unusable sample rate {sample_rate}, falling back to {FALLBACK_SAMPLE_RATE} Hz"
            );
            FALLBACK_SAMPLE_RATE
        };

        self.sample_rate = sample_rate;
        self.dt = 1.0 / sample_rate;

        let capacity = (sample_rate * TAPE_LENGTH_SECONDS).round() as usize;
        self.tape = [DelayLine::new(capacity), DelayLine::new(capacity)];
        self.reset();
    }

    /// Silence the tape and clear filter, drive, ducking and pan history
    /// without reallocating.
    ///
    /// The LFO and drift keep running; they are continuous processes with
    /// no meaningful starting point.
    pub fn reset(&mut self) {
        for line in &mut self.tape {
            line.clear();
        }
        self.read_l = 0.0;
        self.read_r = 0.0;
        self.warmed_up = false;
        self.pan = PanState::default();
        self.duck.reset();
        self.low_pass.reset();
        self.high_pass.reset();
        self.drive.reset();
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Tape length in samples.
    pub fn capacity(&self) -> usize {
        self.tape[0].capacity()
    }

    pub fn write_position(&self) -> usize {
        self.tape[0].write_pos()
    }

    /// Current (smoothed) read-head distances behind the write head, in
    /// samples.
    pub fn read_positions(&self) -> (f64, f64) {
        (self.read_l, self.read_r)
    }

    /// Gain of the pan-mode switch fade, in `[0, 1]`.
    pub fn parameter_change_volume(&self) -> f64 {
        self.pan.change_volume()
    }

    pub fn current_pan_mode(&self) -> PanMode {
        self.pan.current_mode()
    }

    pub fn duck_follower(&self) -> f64 {
        self.duck.level()
    }

    /// Delay time in seconds for the current LFO and drift positions,
    /// before stereo offset.
    pub fn delay_time(&self, params: &ParameterSnapshot) -> f64 {
        let base = base_delay_time(params.delay_time, params.tempo_sync, params.tempo_bpm);
        let time = modulate(base, params.lfo_amount, self.lfo.value());
        modulate(time, params.drift_amount, self.drift.value())
    }

    /// Where the read heads should be, in samples behind the write head.
    fn read_targets(&self, params: &ParameterSnapshot) -> (f64, f64) {
        let offset = params.stereo_offset * 0.5;
        let base = self.delay_time(params);
        (
            base.powf(1.0 + offset) * self.sample_rate,
            base.powf(1.0 - offset) * self.sample_rate,
        )
    }

    /// Process one stereo frame.
    pub fn process_sample(
        &mut self,
        input_l: f64,
        input_r: f64,
        params: &ParameterSnapshot,
    ) -> (f64, f64) {
        self.process_frame((input_l, input_r), input_l + input_r, params)
    }

    /// Process one mono frame. The input is mirrored into both tape
    /// channels so the engine state evolves exactly as in stereo; only
    /// the left output is returned.
    pub fn process_sample_mono(&mut self, input: f64, params: &ParameterSnapshot) -> f64 {
        self.process_frame((input, input), input, params).0
    }

    fn process_frame(
        &mut self,
        input: (f64, f64),
        detector: f64,
        params: &ParameterSnapshot,
    ) -> (f64, f64) {
        let dt = self.dt;

        if !self.warmed_up {
            (self.read_l, self.read_r) = self.read_targets(params);
            self.warmed_up = true;
        }

        self.pan.update(params.pan_mode, params.pan, dt);
        self.low_pass.set_mode(params.filter_mode);
        self.high_pass.set_mode(params.filter_mode);

        let (target_l, target_r) = self.read_targets(params);
        self.read_l += (target_l - self.read_l) * READ_SMOOTHING_RATE * dt;
        self.read_r += (target_r - self.read_r) * READ_SMOOTHING_RATE * dt;
        nih_debug_assert!(self.read_l.is_finite() && self.read_r.is_finite());

        self.duck.update(
            detector,
            params.duck_attack_speed,
            params.duck_release_speed,
            dt,
        );
        self.lfo.advance(params.lfo_frequency, dt);
        self.drift.advance(params.drift_speed, dt);

        let (l, r) = (self.tape[0].read(self.read_l), self.tape[1].read(self.read_r));
        let wet = adjust_panning(l, r, self.pan.read_angle());
        let wet = self.low_pass.process(dt, wet, params.low_pass_cutoff);
        let wet = self.high_pass.process(dt, wet, params.high_pass_cutoff);
        let wet = self.drive.process(dt, wet, params.drive_settings());

        self.write_to_tape(input, wet, params.feedback);
        for line in &mut self.tape {
            line.advance();
        }

        let duck = self.duck.duck_value(params.duck_amount);
        let wet_gain = params.wet_volume * (1.0 - duck);
        (
            input.0 * params.dry_volume + wet.0 * wet_gain,
            input.1 * params.dry_volume + wet.1 * wet_gain,
        )
    }

    fn write_to_tape(&mut self, input: (f64, f64), wet: (f64, f64), feedback: f64) {
        let (l, r) = adjust_panning(input.0, input.1, self.pan.write_angle());
        let l = l + wet.0 * feedback;
        let r = r + wet.1 * feedback;

        let gain = self.pan.change_volume();
        nih_debug_assert!((0.0..=1.0).contains(&gain));
        let (tape_l, tape_r) = if self.pan.swaps_channels() {
            (r, l)
        } else {
            (l, r)
        };
        self.tape[0].write(tape_l * gain);
        self.tape[1].write(tape_r * gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parameters that make the wet path a clean, unmodulated copy of the
    /// tape: no modulation, no drive, no feedback, wide-open filters.
    fn clean(delay_time: f64) -> ParameterSnapshot {
        ParameterSnapshot {
            delay_time,
            drift_amount: 0.0,
            lfo_amount: 0.0,
            feedback: 0.0,
            drive_gain: 0.0,
            low_pass_cutoff: 1.0,
            high_pass_cutoff: 0.001,
            dry_volume: 0.0,
            wet_volume: 1.0,
            ..ParameterSnapshot::default()
        }
    }

    fn energy(samples: &[f64]) -> f64 {
        samples.iter().map(|x| x * x).sum()
    }

    #[test]
    fn test_prepare_sizes_tape() {
        let mut engine = DelayEngine::with_seed(1);
        engine.prepare(48_000.0);
        assert_eq!(engine.capacity(), 480_000);
        assert_eq!(engine.write_position(), 0);
        assert_eq!(engine.sample_rate(), 48_000.0);
    }

    #[test]
    fn test_prepare_falls_back_on_bad_rate() {
        let mut engine = DelayEngine::with_seed(1);
        engine.prepare(0.0);
        assert_eq!(engine.capacity(), 441_000);

        engine.prepare(f64::NAN);
        assert_eq!(engine.sample_rate(), FALLBACK_SAMPLE_RATE);
    }

    #[test]
    fn test_unprepared_engine_is_dry_only() {
        let mut engine = DelayEngine::with_seed(1);
        let params = ParameterSnapshot::default();
        for _ in 0..100 {
            let (l, r) = engine.process_sample(0.3, -0.2, &params);
            assert_eq!((l, r), (0.3, -0.2));
        }
    }

    #[test]
    fn test_silence_in_silence_out() {
        let mut engine = DelayEngine::with_seed(2);
        engine.prepare(44_100.0);
        let params = ParameterSnapshot::default();

        for _ in 0..44_100 {
            let (l, r) = engine.process_sample(0.0, 0.0, &params);
            assert!(l.abs() < 1e-12 && r.abs() < 1e-12, "{l}, {r}");
        }
    }

    #[test]
    fn test_high_feedback_stays_bounded() {
        let mut engine = DelayEngine::with_seed(3);
        let sample_rate = 44_100.0;
        engine.prepare(sample_rate);
        let params = ParameterSnapshot {
            feedback: 0.9,
            drive_gain: 1.0,
            lfo_amount: 0.2,
            ..ParameterSnapshot::default()
        };

        let mut peak = 0.0_f64;
        for i in 0..(sample_rate as usize * 5) {
            let input = if i < 22_050 {
                (2.0 * std::f64::consts::PI * 330.0 * i as f64 / sample_rate).sin() * 0.5
            } else {
                0.0
            };
            let (l, r) = engine.process_sample(input, input, &params);
            assert!(l.is_finite() && r.is_finite());
            peak = peak.max(l.abs()).max(r.abs());
        }
        assert!(peak < 4.0, "output diverged: peak {peak}");
    }

    #[test]
    fn test_echo_arrives_after_delay_time() {
        let mut engine = DelayEngine::with_seed(4);
        engine.prepare(1_000.0);
        let params = clean(0.1);

        let mut out = Vec::new();
        for i in 0..400 {
            let x = if i == 50 { 1.0 } else { 0.0 };
            out.push(engine.process_sample(x, 0.0, &params));
        }

        assert!(out[..150].iter().all(|&(l, r)| l == 0.0 && r == 0.0));
        assert!(out[150].0.abs() > 0.1, "echo missing: {:?}", out[150]);
        assert!(out.iter().all(|&(_, r)| r == 0.0));
    }

    #[test]
    fn test_ping_pong_moves_echo_to_other_channel() {
        let run = |pan_mode| {
            let mut engine = DelayEngine::with_seed(5);
            engine.prepare(1_000.0);
            let params = ParameterSnapshot {
                pan_mode,
                ..clean(0.1)
            };
            let (mut left, mut right) = (Vec::new(), Vec::new());
            for i in 0..400 {
                // Well after the 20 ms mode-switch fade has finished.
                let x = if i == 50 { 1.0 } else { 0.0 };
                let (l, r) = engine.process_sample(x, 0.0, &params);
                left.push(l);
                right.push(r);
            }
            (energy(&left), energy(&right))
        };

        let (stationary_l, stationary_r) = run(PanMode::Stationary);
        assert!(stationary_l > 0.0);
        assert_eq!(stationary_r, 0.0);

        let (ping_pong_l, ping_pong_r) = run(PanMode::PingPong);
        assert_eq!(ping_pong_l, 0.0);
        assert!(ping_pong_r > 0.0);
        assert!((ping_pong_r - stationary_l).abs() < 1e-12);
    }

    #[test]
    fn test_ping_pong_repeats_alternate() {
        let mut engine = DelayEngine::with_seed(6);
        engine.prepare(1_000.0);
        let params = ParameterSnapshot {
            pan_mode: PanMode::PingPong,
            feedback: 1.0,
            low_pass_cutoff: 1.0,
            high_pass_cutoff: 0.001,
            filter_mode: FilterMode::OnePole,
            ..clean(0.1)
        };

        let mut out = Vec::new();
        for i in 0..400 {
            let x = if i == 50 { 1.0 } else { 0.0 };
            out.push(engine.process_sample(x, 0.0, &params));
        }

        // First repeat on the right, second on the left.
        let first = &out[150..250];
        let second = &out[250..350];
        let first_l: f64 = first.iter().map(|(l, _)| l * l).sum();
        let first_r: f64 = first.iter().map(|(_, r)| r * r).sum();
        let second_l: f64 = second.iter().map(|(l, _)| l * l).sum();
        let second_r: f64 = second.iter().map(|(_, r)| r * r).sum();
        assert!(first_r > 10.0 * first_l, "{first_l} vs {first_r}");
        assert!(second_l > 10.0 * second_r, "{second_l} vs {second_r}");
    }

    /// Feed a left-only impulse at sample 500 (long after the pan
    /// smoothers and any mode-switch fade have settled) and return the
    /// per-channel energy of the repeats arriving in each 100-sample
    /// window after it.
    fn repeat_energies(params: &ParameterSnapshot, repeats: usize) -> Vec<(f64, f64)> {
        let mut engine = DelayEngine::with_seed(16);
        engine.prepare(1_000.0);

        let mut out = Vec::new();
        for i in 0..(600 + 100 * repeats) {
            let x = if i == 500 { 1.0 } else { 0.0 };
            out.push(engine.process_sample(x, 0.0, params));
        }

        out[600..]
            .chunks(100)
            .map(|window| {
                let l: f64 = window.iter().map(|(l, _)| l * l).sum();
                let r: f64 = window.iter().map(|(_, r)| r * r).sum();
                (l, r)
            })
            .collect()
    }

    fn assert_balanced((l, r): (f64, f64)) {
        assert!(l > 1e-3, "repeat missing: {l} / {r}");
        assert!((l - r).abs() < 1e-6 * (l + r), "unbalanced: {l} / {r}");
    }

    #[test]
    fn test_stationary_pan_balances_input_once() {
        let params = ParameterSnapshot {
            pan_mode: PanMode::Stationary,
            pan: std::f64::consts::FRAC_PI_2,
            feedback: 0.5,
            filter_mode: FilterMode::OnePole,
            ..clean(0.1)
        };

        let repeats = repeat_energies(&params, 2);
        // Half the pan angle is applied on write, which centres a
        // hard-left input. Feedback joins after the balance, so later
        // repeats stay centred instead of being turned again.
        assert_balanced(repeats[0]);
        assert_balanced(repeats[1]);
        assert!(repeats[1].0 < repeats[0].0);
    }

    #[test]
    fn test_circular_pan_rotates_each_repeat() {
        let params = ParameterSnapshot {
            pan_mode: PanMode::Circular,
            pan: std::f64::consts::FRAC_PI_4,
            feedback: 1.0,
            filter_mode: FilterMode::OnePole,
            ..clean(0.1)
        };

        let repeats = repeat_energies(&params, 3);
        // The hard-left input comes back centred, then on the right, then
        // centred again with the left channel's phase flipped.
        assert_balanced(repeats[0]);
        let (l, r) = repeats[1];
        assert!(r > 1e3 * l, "second repeat should be on the right: {l} / {r}");
        assert_balanced(repeats[2]);
    }

    #[test]
    fn test_pan_mode_switch_fades_out_and_in() {
        let sample_rate = 48_000.0;
        let mut engine = DelayEngine::with_seed(7);
        engine.prepare(sample_rate);
        let mut params = ParameterSnapshot::default();
        for _ in 0..100 {
            engine.process_sample(0.1, 0.1, &params);
        }
        assert_eq!(engine.parameter_change_volume(), 1.0);

        params.pan_mode = PanMode::Circular;
        let mut samples = 0;
        let mut dipped_at = None;
        while dipped_at.is_none() || engine.parameter_change_volume() < 1.0 {
            engine.process_sample(0.1, 0.1, &params);
            samples += 1;
            let volume = engine.parameter_change_volume();
            assert!((0.0..=1.0).contains(&volume), "volume {volume}");
            if volume == 0.0 && dipped_at.is_none() {
                dipped_at = Some(samples);
            }
            assert!(samples < 2_000, "fade never completed");
        }

        // ~10 ms down, ~10 ms back up at 48 kHz.
        let dipped_at = dipped_at.unwrap();
        assert!((470..=490).contains(&dipped_at), "dip after {dipped_at}");
        assert!((940..=980).contains(&samples), "recovered after {samples}");
        assert_eq!(engine.current_pan_mode(), PanMode::Circular);
    }

    #[test]
    fn test_ducking_follows_input_level() {
        let mut engine = DelayEngine::with_seed(8);
        engine.prepare(44_100.0);
        let params = ParameterSnapshot {
            duck_amount: 1.0,
            duck_attack_speed: 10.0,
            duck_release_speed: 10.0,
            ..ParameterSnapshot::default()
        };

        for _ in 0..44_100 {
            engine.process_sample(0.25, 0.25, &params);
        }
        // Detector sees the sum of both channels.
        assert!((engine.duck_follower() - 0.5).abs() < 1e-3);

        for _ in 0..88_200 {
            engine.process_sample(0.0, 0.0, &params);
        }
        assert!(engine.duck_follower() < 1e-6);
    }

    #[test]
    fn test_full_duck_silences_wet() {
        let mut engine = DelayEngine::with_seed(9);
        engine.prepare(1_000.0);
        let params = ParameterSnapshot {
            duck_amount: 10.0,
            duck_attack_speed: 100.0,
            duck_release_speed: 0.1,
            ..clean(0.05)
        };

        let mut out = Vec::new();
        for _ in 0..200 {
            out.push(engine.process_sample(1.0, 1.0, &params));
        }
        // The follower is above 0.1 well before the first echo returns.
        assert!(out[60..].iter().all(|&(l, r)| l == 0.0 && r == 0.0));
    }

    #[test]
    fn test_unmodulated_delay_time_is_exact() {
        let mut engine = DelayEngine::with_seed(10);
        engine.prepare(44_100.0);
        let params = ParameterSnapshot {
            lfo_amount: 0.0,
            drift_amount: 0.0,
            tempo_sync: TempoSync::Quarter,
            tempo_bpm: Some(100.0),
            ..ParameterSnapshot::default()
        };
        for _ in 0..1_000 {
            engine.process_sample(0.0, 0.0, &params);
        }
        assert_eq!(engine.delay_time(&params), 60.0 / 100.0);

        let free = ParameterSnapshot {
            tempo_sync: TempoSync::Off,
            delay_time: 0.123,
            ..params
        };
        assert_eq!(engine.delay_time(&free), 0.123);
    }

    #[test]
    fn test_lfo_modulates_delay_time() {
        let mut engine = DelayEngine::with_seed(11);
        engine.prepare(1_000.0);
        let params = ParameterSnapshot {
            lfo_amount: 0.5,
            lfo_frequency: 1.0,
            drift_amount: 0.0,
            ..ParameterSnapshot::default()
        };

        let mut times = Vec::new();
        for _ in 0..1_000 {
            engine.process_sample(0.0, 0.0, &params);
            times.push(engine.delay_time(&params));
        }
        let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        // 0.2 ^ 1.5 and 0.2 ^ 0.5 at the LFO extremes.
        assert!((min - 0.2_f64.powf(1.5)).abs() < 1e-3, "min {min}");
        assert!((max - 0.2_f64.powf(0.5)).abs() < 1e-3, "max {max}");
    }

    #[test]
    fn test_read_heads_warm_up_then_glide() {
        let mut engine = DelayEngine::with_seed(12);
        engine.prepare(1_000.0);
        let mut params = clean(0.1);

        engine.process_sample(0.0, 0.0, &params);
        let (l, r) = engine.read_positions();
        assert!((l - 100.0).abs() < 1e-9 && (r - 100.0).abs() < 1e-9);

        params.delay_time = 0.2;
        engine.process_sample(0.0, 0.0, &params);
        let (l, _) = engine.read_positions();
        // One 10 Hz smoothing step at 1 kHz covers 1% of the gap.
        assert!((l - 101.0).abs() < 1e-9, "{l}");

        for _ in 0..1_000 {
            engine.process_sample(0.0, 0.0, &params);
        }
        let (l, r) = engine.read_positions();
        assert!((l - 200.0).abs() < 0.01 && (r - 200.0).abs() < 0.01);
    }

    #[test]
    fn test_stereo_offset_splits_read_heads() {
        let mut engine = DelayEngine::with_seed(13);
        engine.prepare(1_000.0);
        let params = ParameterSnapshot {
            stereo_offset: 0.5,
            ..clean(0.2)
        };
        engine.process_sample(0.0, 0.0, &params);

        let (l, r) = engine.read_positions();
        assert!((l - 0.2_f64.powf(1.25) * 1_000.0).abs() < 1e-9);
        assert!((r - 0.2_f64.powf(0.75) * 1_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_mono_matches_left_of_mirrored_stereo() {
        let mut mono = DelayEngine::with_seed(14);
        let mut stereo = DelayEngine::with_seed(14);
        mono.prepare(8_000.0);
        stereo.prepare(8_000.0);
        let params = ParameterSnapshot {
            lfo_amount: 0.1,
            drive_gain: 2.0,
            ..ParameterSnapshot::default()
        };

        for i in 0..16_000 {
            let x = (i as f64 * 0.05).sin() * 0.5;
            let m = mono.process_sample_mono(x, &params);
            let (l, _) = stereo.process_sample(x, x, &params);
            assert_eq!(m, l);
        }
    }

    #[test]
    fn test_reset_silences_tail() {
        let mut engine = DelayEngine::with_seed(15);
        engine.prepare(8_000.0);
        let params = ParameterSnapshot {
            dry_volume: 0.0,
            feedback: 0.8,
            ..ParameterSnapshot::default()
        };
        for _ in 0..8_000 {
            engine.process_sample(0.5, -0.5, &params);
        }

        engine.reset();
        assert_eq!(engine.write_position(), 0);
        assert_eq!(engine.duck_follower(), 0.0);
        for _ in 0..8_000 {
            let (l, r) = engine.process_sample(0.0, 0.0, &params);
            assert!(l.abs() < 1e-12 && r.abs() < 1e-12);
        }
    }
}

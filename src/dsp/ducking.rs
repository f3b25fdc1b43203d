//! Sidechain-style ducking: an envelope follower on the dry input that
//! pushes the wet level down while the player is playing.

/// One-pole envelope follower with separate attack and release speeds.
///
/// Speeds are in reciprocal seconds: a speed of 10 closes ~63% of the gap
/// to the input level in 100 ms. There's no lookahead, so the follower
/// always lags the input.
#[derive(Debug, Clone, Default)]
pub struct DuckFollower {
    level: f64,
}

impl DuckFollower {
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
    }

    /// Track the magnitude of `input` for one sample.
    pub fn update(&mut self, input: f64, attack_speed: f64, release_speed: f64, dt: f64) {
        let magnitude = input.abs();
        let speed = if self.level < magnitude {
            attack_speed
        } else {
            release_speed
        };
        self.level += (magnitude - self.level) * speed * dt;
    }

    /// Wet-path attenuation for the given ducking amount, in `[0, 1]`.
    pub fn duck_value(&self, amount: f64) -> f64 {
        (amount * self.level).clamp(0.0, 1.0)
    }
}

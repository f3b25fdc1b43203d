//! # Delay Line (Tape Loop)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay. Here it plays the role of the "tape" in a tape
//! echo: one fixed-length loop per channel, a write head that moves
//! forward one slot per sample, and a read head that trails behind it by
//! the (constantly modulated) delay time.
//!
//! ## Fractional Reads
//!
//! The read head almost never sits exactly on a stored sample. Delay time
//! is modulated by an LFO and a random drift generator, and both move the
//! read head by fractions of a sample every tick. Snapping to whole
//! samples would produce zipper noise, and linear interpolation dulls the
//! high end as the head moves. Instead we fit a cubic through the four
//! samples surrounding the read position:
//!
//! ```text
//!   y0        y1    ·    y2        y3
//!   |---------|-----x----|---------|
//!  p-1        p   p + x  p+1      p+2
//! ```
//!
//! The kernel is a 4-point, 3rd-order Hermite (Catmull-Rom) spline. It
//! passes exactly through `y1` at `x = 0` and through `y2` at `x = 1`, so
//! reading at a whole-sample position returns the stored value untouched.

/// 4-point, 3rd-order Hermite interpolation (x-form).
///
/// `x` is the fractional distance from `y1` toward `y2`, in `[0, 1)`.
#[inline]
pub fn interpolate(x: f64, y0: f64, y1: f64, y2: f64, y3: f64) -> f64 {
    let c0 = y1;
    let c1 = 0.5 * (y2 - y0);
    let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);
    ((c3 * x + c2) * x + c1) * x + c0
}

/// Wrap a (possibly negative) integer index into `[0, len)`.
#[inline]
fn wrap_index(index: i64, len: usize) -> usize {
    index.rem_euclid(len as i64) as usize
}

/// A circular sample store that acts as one channel of the delay tape.
///
/// The buffer is pre-allocated in [`DelayLine::new`] (called from the
/// plugin's `initialize()`), so no memory allocation ever happens during
/// audio processing. A zero-length line is allowed: it reads as silence
/// and ignores writes, which is what an engine looks like before the host
/// has told us the sample rate.
#[derive(Debug, Clone, Default)]
pub struct DelayLine {
    /// The circular buffer storing audio samples. All values start at
    /// 0.0 (silence).
    buffer: Vec<f64>,

    /// Current write position. Advances by 1 each sample, wrapping to 0
    /// at the end of the buffer.
    write_pos: usize,
}

impl DelayLine {
    /// Create a new delay line holding `capacity` samples of silence.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
        }
    }

    /// Number of samples the tape holds.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Current write head position.
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Write a sample at the current write position.
    ///
    /// **Important:** This does NOT advance the write position. Call
    /// [`advance()`](Self::advance) after both `read()` and `write()` are
    /// complete for the current sample, so the read for this tick still
    /// sees the old contents of the slot.
    pub fn write(&mut self, sample: f64) {
        if let Some(slot) = self.buffer.get_mut(self.write_pos) {
            *slot = sample;
        }
    }

    /// Read the sample at an absolute, fractional tape position.
    ///
    /// `position` may be negative or beyond the end of the buffer; each of
    /// the four neighbouring indices is wrapped individually, so any finite
    /// position is valid.
    pub fn read_at(&self, position: f64) -> f64 {
        let len = self.buffer.len();
        if len == 0 {
            return 0.0;
        }

        let floor = position.floor();
        let ceil = position.ceil();
        let x = position - floor;

        let floor = floor as i64;
        let ceil = ceil as i64;
        let y0 = self.buffer[wrap_index(floor - 1, len)];
        let y1 = self.buffer[wrap_index(floor, len)];
        let y2 = self.buffer[wrap_index(ceil, len)];
        let y3 = self.buffer[wrap_index(ceil + 1, len)];

        interpolate(x, y0, y1, y2, y3)
    }

    /// Read a sample `delay_samples` behind the write head.
    ///
    /// With a delay of `N`, this returns the value written `N` calls to
    /// [`advance()`](Self::advance) ago.
    pub fn read(&self, delay_samples: f64) -> f64 {
        self.read_at(self.write_pos as f64 - delay_samples)
    }

    /// Advance the write position by one sample, wrapping at the end of
    /// the tape.
    pub fn advance(&mut self) {
        let len = self.buffer.len();
        if len > 0 {
            self.write_pos = (self.write_pos + 1) % len;
        }
    }

    /// Clear the entire buffer to silence and reset the write position.
    ///
    /// Called during plugin `reset()` (when the user stops playback)
    /// to prevent stale audio from bleeding into the next play session.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

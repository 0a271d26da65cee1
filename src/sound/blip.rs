//! Band-limited delta-buffer synthesizer
//!
//! Channels emit sparse amplitude *deltas* (a waveform transition, a
//! noise-LFSR flip) rather than a dense sample stream; the blip buffer
//! spreads each delta across a short band-limiting kernel and
//! accumulates a running sum, so reading out PCM samples is just a
//! prefix sum over the accumulator. This is the standalone module the
//! design notes call for: it owns nothing but its own ring buffer and a
//! fixed lookup table.

/// Width of the band-limiting kernel, in output samples. Small and
/// fixed rather than configurable — the kernel shape is baked in below.
const KERNEL_WIDTH: usize = 8;

/// A symmetric band-limiting kernel approximating a low-pass step
/// response. Not a measured sinc table — a small raised-cosine curve
/// good enough to round off the harshest edges of a naive square step.
const KERNEL: [i32; KERNEL_WIDTH] = [2, 10, 22, 34, 34, 22, 10, 2];
const KERNEL_SUM: i32 = 136; // sum(KERNEL)

/// Accumulates amplitude deltas across one tick's worth of samples plus
/// kernel overhang, then drains them into signed 16-bit PCM.
pub struct BlipBuffer {
    /// Delta accumulator, one slot per output sample plus overhang for
    /// the tail of the kernel.
    deltas: Vec<i32>,
    /// Running amplitude carried in from before this buffer's window.
    carry: i32,
}

impl BlipBuffer {
    pub fn new(samples_per_tick: usize) -> Self {
        BlipBuffer {
            deltas: vec![0; samples_per_tick + KERNEL_WIDTH],
            carry: 0,
        }
    }

    pub fn resize(&mut self, samples_per_tick: usize) {
        self.deltas.clear();
        self.deltas.resize(samples_per_tick + KERNEL_WIDTH, 0);
        self.carry = 0;
    }

    /// Record an amplitude step of `delta` at sample offset `at` within
    /// the current tick, spread across the band-limiting kernel.
    pub fn add_delta(&mut self, at: usize, delta: i32) {
        if delta == 0 {
            return;
        }
        for (i, &k) in KERNEL.iter().enumerate() {
            let idx = at + i;
            if idx < self.deltas.len() {
                self.deltas[idx] += delta * k;
            }
        }
    }

    /// Drain `count` samples as a running integral of the accumulated
    /// deltas, carrying remaining energy into the next tick's window.
    pub fn read_samples(&mut self, count: usize) -> Vec<i16> {
        let mut out = Vec::with_capacity(count);
        let mut level = self.carry;
        for i in 0..count {
            level += self.deltas.get(i).copied().unwrap_or(0);
            let sample = (level / KERNEL_SUM).clamp(i16::MIN as i32, i16::MAX as i32);
            out.push(sample as i16);
        }
        // Carry the running level forward so a sustained tone doesn't
        // glitch at the tick boundary, plus the kernel tail beyond
        // `count` that still needs to land in the next tick's window.
        let overhang: i32 = self.deltas[count..].iter().sum();
        self.carry = level + overhang;
        self.deltas.iter_mut().for_each(|d| *d = 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_produces_zero_samples() {
        let mut blip = BlipBuffer::new(64);
        let samples = blip.read_samples(64);
        assert!(samples.iter().all(|&s| s == 0));
    }

    #[test]
    fn a_positive_delta_produces_nonzero_output() {
        let mut blip = BlipBuffer::new(64);
        blip.add_delta(0, 1000);
        let samples = blip.read_samples(64);
        assert!(samples.iter().any(|&s| s != 0));
    }
}

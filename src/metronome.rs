//! Fixed-timestep accumulator
//!
//! Wall-clock time is accumulated and spent on zero or more fixed
//! simulation ticks per rendered frame, keeping the sim rate constant
//! regardless of display refresh rate.

/// Converts variable frame deltas into a fixed tick count
#[derive(Debug, Clone)]
pub struct Metronome {
    tick_len: f64,
    max_ticks: u32,
    accumulator: f64,
    /// Total ticks produced since construction
    pub ticks: u64,
    /// Set whenever the per-frame cap was hit and time had to be dropped
    pub lag: bool,
}

impl Metronome {
    pub fn new(rate: f64, max_ticks_per_frame: u32) -> Self {
        Self {
            tick_len: 1.0 / rate,
            max_ticks: max_ticks_per_frame,
            accumulator: 0.0,
            ticks: 0,
            lag: false,
        }
    }

    /// Feed one frame's wall-clock delta in seconds; returns how many
    /// fixed ticks to run. Capped at `max_ticks_per_frame`; excess
    /// accumulated time is dropped so a long stall cannot snowball.
    pub fn advance(&mut self, dt: f64) -> u32 {
        self.accumulator += dt.max(0.0);

        let mut n = 0;
        while self.accumulator >= self.tick_len && n < self.max_ticks {
            self.accumulator -= self.tick_len;
            n += 1;
        }

        self.lag = n == self.max_ticks && self.accumulator >= self.tick_len;
        if self.lag {
            self.accumulator = 0.0;
        }

        self.ticks += u64::from(n);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_partial_frames() {
        let mut m = Metronome::new(60.0, 8);
        // Two 120 Hz frames make one 60 Hz tick.
        assert_eq!(m.advance(1.0 / 120.0), 0);
        assert_eq!(m.advance(1.0 / 120.0), 1);
        assert_eq!(m.ticks, 1);
    }

    #[test]
    fn caps_ticks_and_drops_backlog() {
        let mut m = Metronome::new(60.0, 8);
        assert_eq!(m.advance(1.0), 8);
        assert!(m.lag);
        // Backlog was dropped, the next frame starts clean.
        assert_eq!(m.advance(1.0 / 120.0), 0);
        assert!(!m.lag);
    }

    #[test]
    fn steady_rate_produces_steady_ticks() {
        let mut m = Metronome::new(60.0, 8);
        let mut total = 0;
        for _ in 0..600 {
            total += m.advance(1.0 / 60.0);
        }
        // Floating point slop may defer the very last tick.
        assert!((599..=600).contains(&total));
    }
}

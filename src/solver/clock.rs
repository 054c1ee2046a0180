//! Simulation clock: dimensionless time and round counter.

/// Advances once per completed time step; restorable from a checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimClock {
    t: f64,
    round: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// Advance one time step.
    pub fn advance(&mut self, delta_t: f64) {
        self.t += delta_t;
        self.round += 1;
    }

    /// Restore from a checkpointed time. The round counter is reconstructed
    /// from the nearest multiple of `delta_t`, which tolerates the rounding
    /// error accumulated by repeated `advance` calls.
    pub fn restore(&mut self, t: f64, delta_t: f64) {
        self.t = t;
        self.round = (t / delta_t).round() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_restore() {
        let mut clock = SimClock::new();
        clock.advance(0.1);
        clock.advance(0.1);
        assert_eq!(clock.round(), 2);

        let mut restored = SimClock::new();
        restored.restore(clock.t(), 0.1);
        assert_eq!(restored.round(), 2);
    }
}

/// Tick counter and elapsed simulation time shared by both populations.
///
/// Every update command advances it once, whichever population it targets.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickClock {
    tick: u64,
    elapsed: f64,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one update command and returns the tick it runs on.
    pub fn advance(&mut self, delta: f32) -> u64 {
        self.tick = self.tick.wrapping_add(1);
        self.elapsed += f64::from(delta);
        self.tick
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_advance_is_tick_one() {
        let mut clock = TickClock::new();
        assert_eq!(clock.advance(16.0), 1);
        assert_eq!(clock.advance(16.0), 2);
        assert_eq!(clock.tick(), 2);
        assert!((clock.elapsed() - 32.0).abs() < 1e-9);
    }
}

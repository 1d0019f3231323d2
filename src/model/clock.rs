/// Elapsed-time clock driven by host timestamps (seconds).
///
/// The first reading starts the clock, so the first frame sees `elapsed == 0`.
/// A host timestamp earlier than the previous one holds elapsed time in place,
/// which keeps `delta` non-negative.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    start: Option<f64>,
    elapsed: f64,
    previous: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockReading {
    pub elapsed: f64,
    pub delta: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the clock at host time `now` and derive the frame delta.
    pub fn tick(&mut self, now: f64) -> ClockReading {
        let start = *self.start.get_or_insert(now);
        self.elapsed = (now - start).max(self.elapsed);

        let delta = self.elapsed - self.previous;
        self.previous = self.elapsed;

        ClockReading { elapsed: self.elapsed, delta }
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.start.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_starts_at_zero() {
        let mut clock = FrameClock::new();
        assert!(!clock.is_running());
        let r = clock.tick(123.5);
        assert_eq!(r.elapsed, 0.0);
        assert_eq!(r.delta, 0.0);
        assert!(clock.is_running());
    }

    #[test]
    fn test_delta_is_difference_of_elapsed() {
        let mut clock = FrameClock::new();
        let stamps = [10.0, 10.016, 10.05, 10.051, 11.0];
        let mut last_elapsed = 0.0;
        for (i, now) in stamps.iter().enumerate() {
            let r = clock.tick(*now);
            if i > 0 {
                assert_eq!(r.delta, r.elapsed - last_elapsed);
            }
            assert!(r.delta >= 0.0);
            last_elapsed = r.elapsed;
        }
        assert!((clock.elapsed() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_backwards_host_time_never_yields_negative_delta() {
        let mut clock = FrameClock::new();
        clock.tick(5.0);
        clock.tick(6.0);
        let r = clock.tick(5.5);
        assert_eq!(r.delta, 0.0);
        assert_eq!(r.elapsed, 1.0);
        let r = clock.tick(6.25);
        assert_eq!(r.delta, 0.25);
    }
}

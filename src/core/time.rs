//! Fixed-step simulation clock

/// Simulation time with a fixed-timestep accumulator.
///
/// The clock only moves when ticks are consumed, so every timestamp the AI
/// stores is a multiple of the fixed step.
#[derive(Debug, Clone)]
pub struct Time {
    /// Seconds of simulated time
    elapsed: f64,
    /// Length of one fixed tick
    fixed_dt: f64,
    /// Unconsumed frame time
    accumulator: f64,
    /// Fixed ticks run so far
    ticks: u64,
}

impl Time {
    /// Upper bound on ticks produced by a single `advance` call.
    const MAX_TICKS_PER_FRAME: u32 = 8;

    /// Create a clock at t = 0 with the given fixed step.
    #[must_use]
    pub fn new(fixed_dt: f64) -> Self {
        Self {
            elapsed: 0.0,
            fixed_dt,
            accumulator: 0.0,
            ticks: 0,
        }
    }

    /// Feed a variable frame delta and return how many fixed ticks are due.
    ///
    /// Backlog beyond `MAX_TICKS_PER_FRAME` is discarded.
    pub fn advance(&mut self, frame_dt: f64) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt;

        let mut due = 0;
        while self.accumulator >= self.fixed_dt && due < Self::MAX_TICKS_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            due += 1;
        }
        if due == Self::MAX_TICKS_PER_FRAME {
            self.accumulator = 0.0;
        }
        due
    }

    /// Move the clock forward by one fixed tick.
    pub fn tick(&mut self) {
        self.elapsed += self.fixed_dt;
        self.ticks += 1;
    }

    /// Simulated seconds since start.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Fixed tick length as `f32`, for kinematics.
    #[must_use]
    pub fn fixed_dt_f32(&self) -> f32 {
        self.fixed_dt as f32
    }

    /// Number of fixed ticks run.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

use std::time::Duration;

pub const MIN_SPEED: u32 = 1;
pub const MAX_SPEED: u32 = 12;
pub const DEFAULT_SPEED: u32 = 7;
pub const DEFAULT_ROUND: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct RoundClock {
    length: Duration,
    time_left: Duration,
    speed: u32,
}

impl RoundClock {
    pub fn new(length: Duration, speed: u32) -> Self {
        Self {
            length,
            time_left: length,
            speed: clamp_speed(speed),
        }
    }

    pub fn advance(&mut self, delta: Duration) {
        self.time_left = self.time_left.saturating_sub(delta);
    }

    pub fn finished(&self) -> bool {
        self.time_left.is_zero()
    }

    pub fn time_left(&self) -> Duration {
        self.time_left
    }

    pub fn elapsed(&self) -> Duration {
        self.length - self.time_left
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Changes the tick rate for the ticks that follow; time already played is kept.
    pub fn set_speed(&mut self, speed: u32) -> u32 {
        self.speed = clamp_speed(speed);
        self.speed
    }

    pub fn tick_interval(&self) -> Duration {
        interval_for(self.speed)
    }
}

pub fn clamp_speed(speed: u32) -> u32 {
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// One second split into `speed` ticks, rounded to the nearest millisecond.
pub fn interval_for(speed: u32) -> Duration {
    let speed = clamp_speed(speed) as u64;
    Duration::from_millis((1000 + speed / 2) / speed)
}

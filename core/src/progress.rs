//! Progress schedules for the simulated waits.
//!
//! A schedule is a lazy, finite iterator of ticks. Nothing here sleeps:
//! the consumer decides whether to honour `at` (the runner in realtime
//! mode) or to drain the schedule instantly (tests). Dropping the
//! iterator cancels it; `restarted()` gives a fresh copy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::TimingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressTick {
    pub step:    u32,
    pub percent: f64,
    /// Offset from the start of the schedule.
    #[serde(with = "millis")]
    pub at:      Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSchedule {
    interval:  Duration,
    increment: f64,
    deadline:  Option<Duration>,
    emitted:   u32,
    done:      bool,
}

impl ProgressSchedule {
    pub fn new(interval: Duration, increment: f64) -> Self {
        assert!(increment > 0.0, "increment must be > 0");
        assert!(!interval.is_zero(), "interval must be > 0");
        Self {
            interval,
            increment,
            deadline: None,
            emitted: 0,
            done: false,
        }
    }

    /// Force completion at `deadline` even if the increments have not
    /// reached 100 by then.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Report generation: +1% every 150 ms, 100 steps.
    pub fn generation(timing: &TimingConfig) -> Self {
        Self::new(
            Duration::from_millis(timing.generation_interval_ms),
            timing.generation_increment,
        )
    }

    /// Sign-up: +2.5% every 100 ms, done at 4 s regardless.
    pub fn sign_up(timing: &TimingConfig) -> Self {
        Self::new(
            Duration::from_millis(timing.signup_interval_ms),
            timing.signup_increment,
        )
        .with_deadline(Duration::from_millis(timing.signup_deadline_ms))
    }

    pub fn restarted(&self) -> Self {
        Self {
            emitted: 0,
            done: false,
            ..self.clone()
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wall time until the final tick.
    pub fn total_duration(&self) -> Duration {
        self.restarted().last().map(|t| t.at).unwrap_or_default()
    }
}

impl Iterator for ProgressSchedule {
    type Item = ProgressTick;

    fn next(&mut self) -> Option<ProgressTick> {
        if self.done {
            return None;
        }
        let step = self.emitted + 1;
        let mut at = self.interval * step;
        let mut percent = (self.increment * step as f64).min(100.0);

        if let Some(deadline) = self.deadline {
            if at >= deadline {
                at = deadline;
                percent = 100.0;
            }
        }
        if percent >= 100.0 {
            self.done = true;
        }
        self.emitted = step;
        Some(ProgressTick { step, percent, at })
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_runs_one_hundred_steps() {
        let ticks: Vec<_> = ProgressSchedule::generation(&TimingConfig::default()).collect();
        assert_eq!(ticks.len(), 100);
        assert_eq!(ticks[0].percent, 1.0);
        assert_eq!(ticks[0].at, Duration::from_millis(150));
        let last = ticks.last().unwrap();
        assert_eq!(last.percent, 100.0);
        assert_eq!(last.at, Duration::from_millis(15_000));
    }

    #[test]
    fn sign_up_completes_at_deadline() {
        let schedule = ProgressSchedule::sign_up(&TimingConfig::default());
        assert_eq!(schedule.total_duration(), Duration::from_secs(4));
        let ticks: Vec<_> = schedule.collect();
        assert_eq!(ticks.len(), 40);
        assert!(ticks.windows(2).all(|w| w[0].percent <= w[1].percent));
        assert_eq!(ticks.last().unwrap().percent, 100.0);
    }

    #[test]
    fn deadline_cuts_a_slow_schedule_short() {
        let ticks: Vec<_> = ProgressSchedule::new(Duration::from_millis(100), 1.0)
            .with_deadline(Duration::from_millis(450))
            .collect();
        assert_eq!(ticks.len(), 5);
        let last = ticks.last().unwrap();
        assert_eq!(last.percent, 100.0);
        assert_eq!(last.at, Duration::from_millis(450));
    }

    #[test]
    fn restart_replays_from_zero() {
        let mut s = ProgressSchedule::new(Duration::from_millis(10), 50.0);
        assert_eq!(s.next().map(|t| t.percent), Some(50.0));
        assert_eq!(s.next().map(|t| t.percent), Some(100.0));
        assert_eq!(s.next(), None);
        let again: Vec<_> = s.restarted().map(|t| t.percent).collect();
        assert_eq!(again, vec![50.0, 100.0]);
    }
}

use std::time::Duration;

/// A cancellable, re-schedulable one-shot task on a caller-supplied clock (seconds).
///
/// Scheduling while already pending pushes the deadline out, so a burst of requests that keep
/// arriving within the quiet period fires exactly once, a quiet period after the last one.
#[derive(Clone, Copy, Debug)]
pub struct DebouncedTask {
    quiet: f64,
    deadline: Option<f64>,
}

impl DebouncedTask {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet: quiet.as_secs_f64(),
            deadline: None,
        }
    }

    pub fn set_quiet_period(&mut self, quiet: Duration) {
        self.quiet = quiet.as_secs_f64();
    }

    /// Cancel any pending run and schedule a new one.
    pub fn schedule(&mut self, now: f64) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Time left until the task is due, if it is pending.
    pub fn remaining(&self, now: f64) -> Option<Duration> {
        let deadline = self.deadline?;
        Some(Duration::from_secs_f64((deadline - now).max(0.0)))
    }

    /// If the task is due, clear it and return `true`.
    pub fn take_due(&mut self, now: f64) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_fires_once_after_the_last_request() {
        let mut task = DebouncedTask::new(Duration::from_millis(400));
        for i in 0..10 {
            task.schedule(f64::from(i) * 0.1);
            assert!(!task.take_due(f64::from(i) * 0.1 + 0.05));
        }
        // Last request at 0.9: due from 1.3 on.
        assert!(!task.take_due(1.25));
        assert!(task.take_due(1.35));
        assert!(!task.take_due(5.0));
        assert!(!task.is_pending());
    }

    #[test]
    fn cancel_discards_pending_run() {
        let mut task = DebouncedTask::new(Duration::from_millis(400));
        task.schedule(0.0);
        task.cancel();
        assert!(!task.take_due(10.0));
        assert_eq!(task.remaining(0.0), None);
    }
}

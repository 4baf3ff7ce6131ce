//! Refresh gating: decides when a new sample is due and owns the countdown.

use chrono::NaiveDateTime;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Idle,
    Due,
    Collecting,
}

/// State machine `Idle -> Due -> Collecting -> Idle`.
///
/// `Collecting` is a mutual-exclusion gate: `poll` never reports `Due` while
/// a cycle is in flight, so timer and manual triggers coalesce into one
/// collection. All state here is ephemeral and process-wide; nothing is
/// persisted across restarts.
#[derive(Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    phase: SchedulerPhase,
    last_refresh_at: Instant,
    last_refresh_timestamp: NaiveDateTime,
    manual_pending: bool,
}

impl RefreshScheduler {
    pub fn new(interval: Duration, now: Instant, timestamp: NaiveDateTime) -> Self {
        Self {
            interval,
            phase: SchedulerPhase::Idle,
            last_refresh_at: now,
            last_refresh_timestamp: timestamp,
            manual_pending: false,
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    /// Non-blocking check. In `Idle`, moves to `Due` once the interval has
    /// elapsed or a manual trigger is pending. Returns the phase after the
    /// check.
    pub fn poll(&mut self, now: Instant) -> SchedulerPhase {
        if self.phase == SchedulerPhase::Idle
            && (now.duration_since(self.last_refresh_at) >= self.interval || self.manual_pending)
        {
            self.phase = SchedulerPhase::Due;
        }
        self.phase
    }

    /// Hands off to the collector. The countdown resets here, at the start of
    /// the cycle, so a slow or failing fetch cannot re-trigger immediately.
    /// Consumes the manual trigger, however many times it was set.
    pub fn begin_collecting(&mut self, now: Instant) {
        debug_assert_eq!(self.phase, SchedulerPhase::Due);
        self.last_refresh_at = now;
        self.manual_pending = false;
        self.phase = SchedulerPhase::Collecting;
    }

    /// Unconditional, whether the cycle succeeded or failed.
    pub fn finish_collecting(&mut self) {
        self.phase = SchedulerPhase::Idle;
    }

    /// Requests an extra collection on the next poll. Idempotent until
    /// consumed.
    pub fn request_refresh(&mut self) {
        self.manual_pending = true;
    }

    /// Records the user-facing "last updated" instant after a successful
    /// cycle.
    pub fn mark_refreshed(&mut self, timestamp: NaiveDateTime) {
        self.last_refresh_timestamp = timestamp;
    }

    pub fn last_refresh_timestamp(&self) -> NaiveDateTime {
        self.last_refresh_timestamp
    }

    /// Remaining countdown until the next automatic refresh; saturates at
    /// zero.
    pub fn time_until_next_refresh(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.duration_since(self.last_refresh_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const INTERVAL: Duration = Duration::from_secs(300);

    fn scheduler(start: Instant) -> RefreshScheduler {
        let timestamp = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        RefreshScheduler::new(INTERVAL, start, timestamp)
    }

    #[test]
    fn idle_until_the_interval_elapses() {
        let start = Instant::now();
        let mut s = scheduler(start);

        assert_eq!(s.poll(start + Duration::from_secs(299)), SchedulerPhase::Idle);
        assert_eq!(s.poll(start + Duration::from_secs(300)), SchedulerPhase::Due);
    }

    #[test]
    fn due_at_301s_and_countdown_fully_resets_on_handoff() {
        let start = Instant::now();
        let mut s = scheduler(start);
        let now = start + Duration::from_secs(301);

        assert_eq!(s.poll(now), SchedulerPhase::Due);
        s.begin_collecting(now);

        assert_eq!(s.time_until_next_refresh(now), Duration::from_secs(300));
    }

    #[test]
    fn countdown_never_goes_negative() {
        let start = Instant::now();
        let s = scheduler(start);

        assert_eq!(
            s.time_until_next_refresh(start + Duration::from_secs(400)),
            Duration::ZERO
        );
    }

    #[test]
    fn manual_trigger_fires_before_the_interval() {
        let start = Instant::now();
        let mut s = scheduler(start);
        let now = start + Duration::from_secs(10);

        assert_eq!(s.poll(now), SchedulerPhase::Idle);
        s.request_refresh();
        assert_eq!(s.poll(now), SchedulerPhase::Due);
    }

    #[test]
    fn repeated_manual_triggers_coalesce_into_one_cycle() {
        let start = Instant::now();
        let mut s = scheduler(start);
        let now = start + Duration::from_secs(10);

        s.request_refresh();
        s.request_refresh();

        assert_eq!(s.poll(now), SchedulerPhase::Due);
        s.begin_collecting(now);
        s.finish_collecting();

        // Both triggers were consumed by the single handoff.
        assert_eq!(
            s.poll(now + Duration::from_secs(1)),
            SchedulerPhase::Idle
        );
    }

    #[test]
    fn poll_does_not_retrigger_while_collecting() {
        let start = Instant::now();
        let mut s = scheduler(start);
        let due_at = start + Duration::from_secs(300);

        s.poll(due_at);
        s.begin_collecting(due_at);

        // A trigger raised mid-cycle waits for the cycle to finish.
        s.request_refresh();
        assert_eq!(
            s.poll(due_at + Duration::from_secs(600)),
            SchedulerPhase::Collecting
        );

        s.finish_collecting();
        assert_eq!(
            s.poll(due_at + Duration::from_secs(601)),
            SchedulerPhase::Due
        );
    }

    #[test]
    fn mark_refreshed_updates_the_displayed_timestamp() {
        let start = Instant::now();
        let mut s = scheduler(start);
        let later = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap();

        s.mark_refreshed(later);
        assert_eq!(s.last_refresh_timestamp(), later);
    }
}

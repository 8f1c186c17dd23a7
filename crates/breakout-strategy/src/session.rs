//! Daily session range tracking.

use breakout_core::{Bar, SessionRange};
use chrono::NaiveTime;
use tracing::{debug, info};

/// What a bar did to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// First bar of a new calendar day (the range was reset)
    NewDay,
    /// Bar was inside the window and folded into the range
    Extended,
    /// First bar after the window; the range is now final
    Finalized,
    /// Nothing changed
    Idle,
}

/// Accumulates the high/low of bars inside `[start, end]` for the current day.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    start: NaiveTime,
    end: NaiveTime,
    range: Option<SessionRange>,
}

impl SessionTracker {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            range: None,
        }
    }

    /// Current day's range, if any bar was seen.
    pub fn range(&self) -> Option<&SessionRange> {
        self.range.as_ref()
    }

    /// Whether today's range is final.
    pub fn is_finalized(&self) -> bool {
        self.range.is_some_and(|r| r.is_finalized)
    }

    /// Fold one bar into the tracker.
    ///
    /// A date change resets the range before the bar is considered, so the
    /// first bar of a day can still extend or finalize it; the returned event
    /// is then `NewDay`. Callers that need to know whether the new-day bar
    /// also finalized the range check [`SessionTracker::is_finalized`].
    pub fn observe(&mut self, bar: &Bar) -> SessionEvent {
        let date = bar.date();
        let mut event = SessionEvent::Idle;

        if self.range.map_or(true, |r| r.date != date) {
            debug!(%date, "session reset for new day");
            self.range = Some(SessionRange::empty(date));
            event = SessionEvent::NewDay;
        }

        let Some(range) = self.range.as_mut() else {
            return event;
        };
        if range.is_finalized {
            return event;
        }

        let time = bar.time();
        if time >= self.start && time <= self.end {
            range.extend(bar.high, bar.low);
            if event == SessionEvent::Idle {
                event = SessionEvent::Extended;
            }
        } else if time > self.end && range.has_observations() {
            range.is_finalized = true;
            info!(
                %date,
                high = ?range.high,
                low = ?range.low,
                width = ?range.width(),
                "session range finalized"
            );
            if event == SessionEvent::Idle {
                event = SessionEvent::Finalized;
            }
        }

        event
    }

    /// Forget all state.
    pub fn reset(&mut self) {
        self.range = None;
    }
}

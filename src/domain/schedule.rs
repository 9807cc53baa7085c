use crate::domain::models::{Settings, TimeOfDay};
use chrono::{DateTime, Utc};

/// True when `now` falls inside `[sleep, wake)`. A sleep time later than the
/// wake time is an overnight period that wraps midnight.
pub fn is_in_sleep_period(settings: &Settings, now: TimeOfDay) -> bool {
    let current = now.minutes_since_midnight();
    let sleep = settings.sleep_time.minutes_since_midnight();
    let wake = settings.wake_time.minutes_since_midnight();

    if sleep > wake {
        current >= sleep || current < wake
    } else {
        current >= sleep && current < wake
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepTransition {
    Sleep,
    Wake,
}

/// Timer bookkeeping for automatic sleep and wake.
///
/// The schedule is edge triggered: only crossing into or out of the sleep
/// period causes a transition, so a manual wake inside the period or a manual
/// sleep outside it is not undone by the next minute's check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SleepTimers {
    last_in_period: Option<bool>,
    resleep_at: Option<DateTime<Utc>>,
}

impl SleepTimers {
    pub fn resleep_at(&self) -> Option<DateTime<Utc>> {
        self.resleep_at
    }

    pub fn arm_resleep(&mut self, now: DateTime<Utc>, settings: &Settings) {
        self.resleep_at = Some(now + settings.resleep_duration());
    }

    pub fn cancel_resleep(&mut self) {
        self.resleep_at = None;
    }

    /// Evaluates the schedule at `now` (`local` is the same instant on the
    /// kiosk's wall clock) and returns the transition to apply, if any.
    pub fn evaluate(
        &mut self,
        settings: &Settings,
        local: TimeOfDay,
        now: DateTime<Utc>,
        asleep: bool,
    ) -> Option<SleepTransition> {
        let in_period = is_in_sleep_period(settings, local);
        let previous = self.last_in_period.replace(in_period);

        let resleep_due = self.resleep_at.is_some_and(|deadline| now >= deadline);
        if resleep_due {
            self.resleep_at = None;
            if in_period && !asleep {
                return Some(SleepTransition::Sleep);
            }
        }

        match (previous, in_period) {
            (None | Some(false), true) if !asleep && self.resleep_at.is_none() => {
                Some(SleepTransition::Sleep)
            }
            (Some(true), false) if asleep => {
                self.resleep_at = None;
                Some(SleepTransition::Wake)
            }
            _ => None,
        }
    }
}

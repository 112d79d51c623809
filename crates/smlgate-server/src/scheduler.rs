//! Timer-driven job scheduler.
//!
//! Each registered job gets its own tokio task that sleeps until the next
//! tick and fires the gateway run in a detached task, so a slow or
//! never-terminating script cannot delay the following tick. Overlapping
//! runs of the same job are possible by design; this layer imposes no
//! per-job mutual exclusion. Jobs live for the process lifetime; there is
//! no unregistration.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde::Deserialize;
use tokio::task::JoinHandle;

use smlgate_core::{Engine, ScriptGateway};

const DAY_SECS: i64 = 24 * 60 * 60;
const WEEK_SECS: i64 = 7 * DAY_SECS;

/// When a job fires.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    /// Every `seconds` seconds.
    Interval { seconds: u64 },
    /// Once a day at the given local wall-clock time.
    Daily { hour: u32, minute: u32 },
    /// Once a week; `day` counts from Sunday = 0.
    Weekly { day: u32, hour: u32, minute: u32 },
}

impl Cadence {
    /// Time to wait from `now` until the next tick.
    ///
    /// Pure wall-clock arithmetic: a tick landing exactly on `now` waits a
    /// full period rather than firing immediately again.
    pub fn until_next(&self, now: NaiveDateTime) -> Duration {
        let wait = match *self {
            Cadence::Interval { seconds } => return Duration::from_secs(seconds),
            Cadence::Daily { hour, minute } => {
                let mut delta = target_secs(hour, minute) - midnight_secs(now);
                if delta <= 0 {
                    delta += DAY_SECS;
                }
                delta
            }
            Cadence::Weekly { day, hour, minute } => {
                let days_ahead = i64::from((day + 7 - now.weekday().num_days_from_sunday()) % 7);
                let mut delta = days_ahead * DAY_SECS + target_secs(hour, minute) - midnight_secs(now);
                if delta <= 0 {
                    delta += WEEK_SECS;
                }
                delta
            }
        };
        Duration::from_secs(wait as u64)
    }

    /// Reject out-of-range wall-clock fields before a job is spawned.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Cadence::Interval { seconds } if seconds == 0 => {
                Err("interval must be at least one second".to_string())
            }
            Cadence::Interval { .. } => Ok(()),
            Cadence::Daily { hour, minute } => check_clock(hour, minute),
            Cadence::Weekly { day, hour, minute } => {
                if day > 6 {
                    return Err(format!("day {day} out of range (0 = Sunday .. 6)"));
                }
                check_clock(hour, minute)
            }
        }
    }
}

fn check_clock(hour: u32, minute: u32) -> Result<(), String> {
    if hour > 23 || minute > 59 {
        return Err(format!("{hour:02}:{minute:02} is not a wall-clock time"));
    }
    Ok(())
}

fn target_secs(hour: u32, minute: u32) -> i64 {
    i64::from(hour) * 3600 + i64::from(minute) * 60
}

fn midnight_secs(now: NaiveDateTime) -> i64 {
    i64::from(now.num_seconds_from_midnight())
}

/// A registered scheduled script. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Job {
    /// Request path of the script to run.
    pub path: String,
    pub cadence: Cadence,
}

/// Spawn one timer task per job. Jobs with invalid cadences are logged
/// and skipped rather than failing startup.
pub fn spawn_jobs<E: Engine + 'static>(
    jobs: Vec<Job>,
    gateway: Arc<ScriptGateway<E>>,
) -> Vec<JoinHandle<()>> {
    jobs.into_iter()
        .filter_map(|job| {
            if let Err(reason) = job.cadence.validate() {
                tracing::warn!(job = %job.path, %reason, "skipping job with invalid cadence");
                return None;
            }
            tracing::info!(job = %job.path, cadence = ?job.cadence, "scheduled job registered");
            let gateway = gateway.clone();
            Some(tokio::spawn(run_job(job, gateway)))
        })
        .collect()
}

async fn run_job<E: Engine + 'static>(job: Job, gateway: Arc<ScriptGateway<E>>) {
    loop {
        let wait = job.cadence.until_next(Local::now().naive_local());
        tokio::time::sleep(wait).await;

        // Fire and forget: the run must not block the next tick.
        tokio::spawn(fire(gateway.clone(), job.path.clone()));
    }
}

async fn fire<E: Engine + 'static>(gateway: Arc<ScriptGateway<E>>, path: String) {
    let job = path.clone();
    let result = tokio::task::spawn_blocking(move || gateway.run(&path)).await;
    match result {
        Ok(Ok(outcome)) => {
            tracing::info!(job = %job, outcome = outcome.label(), "scheduled run finished");
        }
        Ok(Err(e)) => tracing::warn!(job = %job, error = %e, "scheduled run failed"),
        Err(e) => tracing::error!(job = %job, error = %e, "scheduled run panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Weekday};

    fn at(weekday: Weekday, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        // 2026-08-03 is a Monday; walk forward to the requested weekday.
        let monday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        let date = (0..7)
            .map(|d| monday + chrono::Days::new(d))
            .find(|d| d.weekday() == weekday)
            .unwrap();
        date.and_hms_opt(hour, minute, second).unwrap()
    }

    #[test]
    fn interval_waits_the_fixed_period() {
        let cadence = Cadence::Interval { seconds: 90 };
        let now = at(Weekday::Mon, 12, 0, 0);
        assert_eq!(cadence.until_next(now), Duration::from_secs(90));
    }

    #[test]
    fn daily_waits_until_the_wall_clock_time() {
        let cadence = Cadence::Daily { hour: 3, minute: 0 };

        let before = at(Weekday::Mon, 1, 30, 0);
        assert_eq!(cadence.until_next(before), Duration::from_secs(90 * 60));

        let after = at(Weekday::Mon, 4, 0, 0);
        assert_eq!(cadence.until_next(after), Duration::from_secs(23 * 3600));
    }

    #[test]
    fn daily_ticks_are_a_full_day_apart() {
        let cadence = Cadence::Daily { hour: 3, minute: 0 };
        let on_the_tick = at(Weekday::Mon, 3, 0, 0);
        assert_eq!(
            cadence.until_next(on_the_tick),
            Duration::from_secs(DAY_SECS as u64)
        );
    }

    #[test]
    fn weekly_waits_across_days() {
        // Sunday = 0, so day 3 is Wednesday.
        let cadence = Cadence::Weekly {
            day: 3,
            hour: 6,
            minute: 0,
        };
        let now = at(Weekday::Mon, 6, 0, 0);
        assert_eq!(
            cadence.until_next(now),
            Duration::from_secs(2 * DAY_SECS as u64)
        );

        let thursday = at(Weekday::Thu, 6, 0, 0);
        assert_eq!(
            cadence.until_next(thursday),
            Duration::from_secs(6 * DAY_SECS as u64)
        );
    }

    #[test]
    fn weekly_on_the_tick_waits_a_week() {
        let cadence = Cadence::Weekly {
            day: 1,
            hour: 0,
            minute: 0,
        };
        let now = at(Weekday::Mon, 0, 0, 0);
        assert_eq!(
            cadence.until_next(now),
            Duration::from_secs(WEEK_SECS as u64)
        );
    }

    #[test]
    fn out_of_range_cadences_are_rejected() {
        assert!(Cadence::Daily { hour: 24, minute: 0 }.validate().is_err());
        assert!(
            Cadence::Weekly {
                day: 7,
                hour: 0,
                minute: 0
            }
            .validate()
            .is_err()
        );
        assert!(Cadence::Interval { seconds: 0 }.validate().is_err());
        assert!(Cadence::Daily { hour: 3, minute: 0 }.validate().is_ok());
    }

    #[test]
    fn jobs_deserialize_from_tagged_json() {
        let job: Job = serde_json::from_str(
            r#"{"path": "/sys/cleanup.sml", "cadence": {"kind": "daily", "hour": 3, "minute": 0}}"#,
        )
        .unwrap();
        assert_eq!(job.path, "/sys/cleanup.sml");
        assert_eq!(job.cadence, Cadence::Daily { hour: 3, minute: 0 });
    }
}

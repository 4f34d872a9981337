//! Recurrence schedules
//!
//! A [`ScheduledRuleConfig`] describes when a scheduled rule fires: once, at
//! a time of day (daily), on a weekday (weekly), on a day of the month
//! (monthly) or by cron expression. The scheduler is polled: callers ask
//! whether a schedule matches "now" at least once a minute, and cache
//! [`ScheduledRuleConfig::next_execution`] for display and ordering.
//!
//! All instants are UTC. Cron expressions are accepted by validation but are
//! not evaluated yet; see [`ScheduledRuleConfig::ensure_supported`].

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

use crate::automation::{Automation, AutomationResult};

/// Schedule validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("{field} is required for {schedule_type} schedules")]
    MissingField {
        field: &'static str,
        schedule_type: ScheduleType,
    },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },

    #[error("end_time must be after start_time")]
    EndBeforeStart,

    #[error("{0} schedules are not supported yet")]
    Unsupported(ScheduleType),
}

/// Result type for schedule operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Recurrence kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    Once,
    Daily,
    Weekly,
    Monthly,
    Cron,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Once => "once",
            ScheduleType::Daily => "daily",
            ScheduleType::Weekly => "weekly",
            ScheduleType::Monthly => "monthly",
            ScheduleType::Cron => "cron",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of when a scheduled rule fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledRuleConfig {
    #[serde(rename = "type")]
    pub schedule_type: ScheduleType,

    /// Cron expression (cron schedules only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expr: Option<String>,

    /// Firing instant (once schedules only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// After this instant the schedule never fires again
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// 0 = Sunday .. 6 = Saturday (weekly schedules only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u32>,

    /// 1..=31 (monthly schedules only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,

    #[serde(default)]
    pub hour: u32,

    #[serde(default)]
    pub minute: u32,
}

impl ScheduledRuleConfig {
    fn base(schedule_type: ScheduleType, hour: u32, minute: u32) -> Self {
        Self {
            schedule_type,
            cron_expr: None,
            start_time: None,
            end_time: None,
            day_of_week: None,
            day_of_month: None,
            hour,
            minute,
        }
    }

    /// Fire once at `start_time`
    pub fn once(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(start_time),
            ..Self::base(ScheduleType::Once, 0, 0)
        }
    }

    /// Fire every day at `hour:minute`
    pub fn daily(hour: u32, minute: u32) -> Self {
        Self::base(ScheduleType::Daily, hour, minute)
    }

    /// Fire every week on `day_of_week` (0 = Sunday) at `hour:minute`
    pub fn weekly(day_of_week: u32, hour: u32, minute: u32) -> Self {
        Self {
            day_of_week: Some(day_of_week),
            ..Self::base(ScheduleType::Weekly, hour, minute)
        }
    }

    /// Fire every month on `day_of_month` at `hour:minute`
    pub fn monthly(day_of_month: u32, hour: u32, minute: u32) -> Self {
        Self {
            day_of_month: Some(day_of_month),
            ..Self::base(ScheduleType::Monthly, hour, minute)
        }
    }

    /// Cron schedule (not evaluated yet)
    pub fn cron(expr: impl Into<String>) -> Self {
        Self {
            cron_expr: Some(expr.into()),
            ..Self::base(ScheduleType::Cron, 0, 0)
        }
    }

    /// Stop firing after `end_time`
    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Check the structural invariants of the schedule
    ///
    /// Returns the first violated field.
    pub fn validate(&self) -> ScheduleResult<()> {
        let missing = |field| ScheduleError::MissingField {
            field,
            schedule_type: self.schedule_type,
        };

        match self.schedule_type {
            ScheduleType::Once => {
                if self.start_time.is_none() {
                    return Err(missing("start_time"));
                }
            }
            ScheduleType::Daily => {}
            ScheduleType::Weekly => {
                let day = self.day_of_week.ok_or_else(|| missing("day_of_week"))?;
                check_range("day_of_week", day, 0, 6)?;
            }
            ScheduleType::Monthly => {
                let day = self.day_of_month.ok_or_else(|| missing("day_of_month"))?;
                check_range("day_of_month", day, 1, 31)?;
            }
            ScheduleType::Cron => {
                if self.cron_expr.as_deref().map_or(true, |e| e.trim().is_empty()) {
                    return Err(missing("cron_expr"));
                }
            }
        }

        check_range("hour", self.hour, 0, 23)?;
        check_range("minute", self.minute, 0, 59)?;

        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end <= start {
                return Err(ScheduleError::EndBeforeStart);
            }
        }

        Ok(())
    }

    /// Fail for schedule kinds that are accepted but never fire
    pub fn ensure_supported(&self) -> ScheduleResult<()> {
        match self.schedule_type {
            ScheduleType::Cron => Err(ScheduleError::Unsupported(ScheduleType::Cron)),
            _ => Ok(()),
        }
    }

    /// Whether the schedule matches `now` (minute resolution)
    ///
    /// A once schedule matches during the minute starting at `start_time`.
    /// Cron schedules never match.
    pub fn should_run_now(&self, now: DateTime<Utc>) -> bool {
        if self.is_ended(now) {
            return false;
        }

        let result = match self.schedule_type {
            ScheduleType::Once => self.start_time.is_some_and(|start| {
                now >= start && once_window_end(start).map_or(true, |end| now < end)
            }),
            ScheduleType::Daily => self.matches_time_of_day(now),
            ScheduleType::Weekly => {
                self.matches_time_of_day(now)
                    && self.day_of_week == Some(now.weekday().num_days_from_sunday())
            }
            ScheduleType::Monthly => {
                self.matches_time_of_day(now)
                    && self.day_of_month.is_some_and(|day| {
                        now.day() == clamp_day(now.year(), now.month(), day)
                    })
            }
            ScheduleType::Cron => false,
        };

        trace!(schedule_type = %self.schedule_type, %now, result, "Schedule checked");
        result
    }

    /// Next instant strictly after `after` at which the schedule fires
    ///
    /// Returns `None` when the schedule is exhausted (a once schedule in the
    /// past, an instant beyond `end_time`) or not evaluated (cron).
    ///
    /// Monthly schedules for a day the month does not have (e.g. the 31st in
    /// April) fire on the month's last day.
    pub fn next_execution(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let next = match self.schedule_type {
            ScheduleType::Once => self.start_time.filter(|start| *start > after),
            ScheduleType::Daily => {
                let date = after.date_naive();
                self.instant_on(date)
                    .filter(|candidate| *candidate > after)
                    .or_else(|| date.succ_opt().and_then(|d| self.instant_on(d)))
            }
            ScheduleType::Weekly => {
                let weekday = self.day_of_week?;
                let start = after.date_naive();
                (0..=7u64).find_map(|offset| {
                    let date = start.checked_add_days(Days::new(offset))?;
                    if date.weekday().num_days_from_sunday() != weekday {
                        return None;
                    }
                    self.instant_on(date).filter(|candidate| *candidate > after)
                })
            }
            ScheduleType::Monthly => {
                let day = self.day_of_month?;
                let (year, month) = (after.year(), after.month());
                self.monthly_instant(year, month, day)
                    .filter(|candidate| *candidate > after)
                    .or_else(|| {
                        let (next_year, next_month) = next_month(year, month);
                        self.monthly_instant(next_year, next_month, day)
                    })
            }
            ScheduleType::Cron => {
                debug!("Cron schedules are not evaluated");
                None
            }
        };

        next.filter(|instant| self.end_time.map_or(true, |end| *instant <= end))
    }

    fn is_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time.is_some_and(|end| now > end)
    }

    fn matches_time_of_day(&self, now: DateTime<Utc>) -> bool {
        now.hour() == self.hour && now.minute() == self.minute
    }

    fn instant_on(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let naive = date.and_hms_opt(self.hour, self.minute, 0)?;
        Some(Utc.from_utc_datetime(&naive))
    }

    fn monthly_instant(&self, year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
        let date = NaiveDate::from_ymd_opt(year, month, clamp_day(year, month, day))?;
        self.instant_on(date)
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> ScheduleResult<()> {
    if value < min || value > max {
        return Err(ScheduleError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(28, |last| last.day())
}

/// End of the minute in which a once schedule may fire
///
/// `None` near the end of representable time; the window is then open-ended.
fn once_window_end(start: DateTime<Utc>) -> Option<DateTime<Utc>> {
    start.checked_add_signed(Duration::minutes(1))
}

fn clamp_day(year: i32, month: u32, day: u32) -> u32 {
    day.min(days_in_month(year, month))
}

/// An automation fired by a recurrence schedule
#[derive(Debug, Clone)]
pub struct ScheduledAutomationRule {
    automation: Automation,
    schedule: ScheduledRuleConfig,
    last_executed_at: Option<DateTime<Utc>>,
    next_execution_at: Option<DateTime<Utc>>,
}

impl ScheduledAutomationRule {
    /// Attach a validated schedule to an automation
    pub fn new(
        automation: Automation,
        schedule: ScheduledRuleConfig,
        now: DateTime<Utc>,
    ) -> AutomationResult<Self> {
        schedule.validate()?;
        let next_execution_at = schedule.next_execution(now);
        Ok(Self {
            automation,
            schedule,
            last_executed_at: None,
            next_execution_at,
        })
    }

    /// Rebuild from persisted bookkeeping
    pub fn reconstruct(
        automation: Automation,
        schedule: ScheduledRuleConfig,
        last_executed_at: Option<DateTime<Utc>>,
        next_execution_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            automation,
            schedule,
            last_executed_at,
            next_execution_at,
        }
    }

    pub fn automation(&self) -> &Automation {
        &self.automation
    }

    pub fn automation_mut(&mut self) -> &mut Automation {
        &mut self.automation
    }

    pub fn schedule(&self) -> &ScheduledRuleConfig {
        &self.schedule
    }

    pub fn last_executed_at(&self) -> Option<DateTime<Utc>> {
        self.last_executed_at
    }

    pub fn next_execution_at(&self) -> Option<DateTime<Utc>> {
        self.next_execution_at
    }

    /// Whether the rule should fire at `now`
    ///
    /// Polling more than once a minute does not fire the rule twice.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.automation.is_enabled()
            && self.schedule.should_run_now(now)
            && !self.executed_in_minute_of(now)
    }

    /// Record an execution and recompute the next one
    pub fn mark_executed(&mut self, now: DateTime<Utc>) {
        self.last_executed_at = Some(now);
        self.next_execution_at = match self.schedule.schedule_type {
            ScheduleType::Once => None,
            _ => self.schedule.next_execution(now),
        };
        debug!(
            automation_id = %self.automation.id(),
            next_execution_at = ?self.next_execution_at,
            "Scheduled rule executed"
        );
    }

    /// Whether the rule will never fire again
    pub fn is_exhausted(&self, now: DateTime<Utc>) -> bool {
        match self.schedule.schedule_type {
            ScheduleType::Once => {
                self.last_executed_at.is_some()
                    || self.schedule.is_ended(now)
                    || self.schedule.start_time.map_or(true, |start| {
                        once_window_end(start).is_some_and(|end| now >= end)
                    })
            }
            ScheduleType::Cron => false,
            _ => self.schedule.is_ended(now),
        }
    }

    fn executed_in_minute_of(&self, now: DateTime<Utc>) -> bool {
        self.last_executed_at.is_some_and(|last| {
            last.date_naive() == now.date_naive()
                && last.hour() == now.hour()
                && last.minute() == now.minute()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::{AutomationType, Trigger};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn scheduled_automation() -> Automation {
        Automation::new(
            AutomationType::Scheduled,
            None,
            "tenant-a",
            "Weekly report",
            Trigger::Scheduled,
        )
        .unwrap()
    }

    #[test]
    fn test_weekly_requires_day_of_week() {
        let config = ScheduledRuleConfig {
            day_of_week: None,
            ..ScheduledRuleConfig::weekly(1, 9, 0)
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("day_of_week is required"));
    }

    #[test]
    fn test_validate_per_type() {
        assert!(ScheduledRuleConfig::daily(14, 30).validate().is_ok());
        assert!(ScheduledRuleConfig::weekly(6, 0, 0).validate().is_ok());
        assert!(ScheduledRuleConfig::monthly(31, 23, 59).validate().is_ok());
        assert!(ScheduledRuleConfig::cron("0 8 * * *").validate().is_ok());

        let once = ScheduledRuleConfig {
            start_time: None,
            ..ScheduledRuleConfig::once(Utc::now())
        };
        assert!(once
            .validate()
            .unwrap_err()
            .to_string()
            .contains("start_time is required"));

        let monthly = ScheduledRuleConfig {
            day_of_month: None,
            ..ScheduledRuleConfig::monthly(1, 0, 0)
        };
        assert!(monthly
            .validate()
            .unwrap_err()
            .to_string()
            .contains("day_of_month is required"));

        assert!(matches!(
            ScheduledRuleConfig::cron("  ").validate(),
            Err(ScheduleError::MissingField {
                field: "cron_expr",
                ..
            })
        ));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(matches!(
            ScheduledRuleConfig::daily(24, 0).validate(),
            Err(ScheduleError::OutOfRange { field: "hour", .. })
        ));
        assert!(matches!(
            ScheduledRuleConfig::daily(0, 60).validate(),
            Err(ScheduleError::OutOfRange { field: "minute", .. })
        ));
        assert!(matches!(
            ScheduledRuleConfig::weekly(7, 0, 0).validate(),
            Err(ScheduleError::OutOfRange {
                field: "day_of_week",
                ..
            })
        ));
        assert!(matches!(
            ScheduledRuleConfig::monthly(0, 0, 0).validate(),
            Err(ScheduleError::OutOfRange {
                field: "day_of_month",
                ..
            })
        ));
        assert!(matches!(
            ScheduledRuleConfig::monthly(32, 0, 0).validate(),
            Err(ScheduleError::OutOfRange {
                field: "day_of_month",
                ..
            })
        ));
    }

    #[test]
    fn test_type_checks_come_before_time_of_day() {
        let config = ScheduledRuleConfig {
            day_of_week: None,
            hour: 99,
            ..ScheduledRuleConfig::weekly(1, 0, 0)
        };
        assert!(matches!(
            config.validate(),
            Err(ScheduleError::MissingField {
                field: "day_of_week",
                ..
            })
        ));
    }

    #[test]
    fn test_end_before_start() {
        let start = at(2026, 3, 1, 10, 0, 0);
        let config = ScheduledRuleConfig::once(start).with_end_time(start);
        assert_eq!(config.validate(), Err(ScheduleError::EndBeforeStart));
    }

    #[test]
    fn test_daily_should_run_now() {
        let config = ScheduledRuleConfig::daily(14, 30);
        assert!(config.should_run_now(at(2026, 3, 2, 14, 30, 0)));
        assert!(config.should_run_now(at(2026, 3, 2, 14, 30, 59)));
        assert!(!config.should_run_now(at(2026, 3, 2, 14, 31, 0)));
        assert!(!config.should_run_now(at(2026, 3, 2, 15, 30, 0)));
    }

    #[test]
    fn test_daily_matches_once_per_day() {
        let config = ScheduledRuleConfig::daily(14, 30);
        let start = at(2026, 3, 2, 0, 0, 0);
        let matches = (0..24 * 60)
            .map(|m| start + Duration::minutes(m))
            .filter(|t| config.should_run_now(*t))
            .count();
        assert_eq!(matches, 1);
    }

    #[test]
    fn test_once_window() {
        let start = at(2026, 3, 2, 9, 15, 0);
        let config = ScheduledRuleConfig::once(start);

        assert!(!config.should_run_now(start - Duration::seconds(1)));
        assert!(config.should_run_now(start));
        assert!(config.should_run_now(start + Duration::seconds(59)));
        assert!(!config.should_run_now(start + Duration::minutes(1)));
    }

    #[test]
    fn test_weekly_and_monthly_should_run_now() {
        // 2026-03-02 is a Monday
        let weekly = ScheduledRuleConfig::weekly(1, 8, 0);
        assert!(weekly.should_run_now(at(2026, 3, 2, 8, 0, 0)));
        assert!(!weekly.should_run_now(at(2026, 3, 3, 8, 0, 0)));

        let monthly = ScheduledRuleConfig::monthly(15, 8, 0);
        assert!(monthly.should_run_now(at(2026, 3, 15, 8, 0, 0)));
        assert!(!monthly.should_run_now(at(2026, 3, 16, 8, 0, 0)));
    }

    #[test]
    fn test_end_time_stops_firing() {
        let end = at(2026, 3, 2, 12, 0, 0);
        let config = ScheduledRuleConfig::daily(14, 30).with_end_time(end);

        assert!(!config.should_run_now(at(2026, 3, 2, 14, 30, 0)));
        assert_eq!(config.next_execution(at(2026, 3, 2, 10, 0, 0)), None);

        let config = ScheduledRuleConfig::daily(9, 0).with_end_time(end);
        assert!(config.should_run_now(at(2026, 3, 2, 9, 0, 0)));
        assert_eq!(
            config.next_execution(at(2026, 3, 2, 8, 0, 0)),
            Some(at(2026, 3, 2, 9, 0, 0))
        );
    }

    #[test]
    fn test_cron_never_fires() {
        let config = ScheduledRuleConfig::cron("* * * * *");
        assert!(!config.should_run_now(Utc::now()));
        assert_eq!(config.next_execution(Utc::now()), None);
        assert_eq!(
            config.ensure_supported(),
            Err(ScheduleError::Unsupported(ScheduleType::Cron))
        );
        assert!(ScheduledRuleConfig::daily(0, 0).ensure_supported().is_ok());
    }

    #[test]
    fn test_next_execution_once() {
        let start = at(2026, 3, 2, 9, 15, 0);
        let config = ScheduledRuleConfig::once(start);

        assert_eq!(config.next_execution(at(2026, 3, 1, 0, 0, 0)), Some(start));
        assert_eq!(config.next_execution(start), None);
        assert_eq!(config.next_execution(at(2026, 4, 1, 0, 0, 0)), None);
    }

    #[test]
    fn test_next_execution_daily() {
        let config = ScheduledRuleConfig::daily(14, 30);

        assert_eq!(
            config.next_execution(at(2026, 3, 2, 10, 0, 0)),
            Some(at(2026, 3, 2, 14, 30, 0))
        );
        // Exactly at the firing instant moves to tomorrow
        assert_eq!(
            config.next_execution(at(2026, 3, 2, 14, 30, 0)),
            Some(at(2026, 3, 3, 14, 30, 0))
        );
        // Across a year boundary
        assert_eq!(
            config.next_execution(at(2026, 12, 31, 20, 0, 0)),
            Some(at(2027, 1, 1, 14, 30, 0))
        );
    }

    #[test]
    fn test_next_execution_weekly() {
        // Friday 2026-03-06; next Monday 08:00 is 2026-03-09
        let config = ScheduledRuleConfig::weekly(1, 8, 0);
        assert_eq!(
            config.next_execution(at(2026, 3, 6, 12, 0, 0)),
            Some(at(2026, 3, 9, 8, 0, 0))
        );
        // Monday after the firing time wraps a full week
        assert_eq!(
            config.next_execution(at(2026, 3, 9, 8, 0, 0)),
            Some(at(2026, 3, 16, 8, 0, 0))
        );
        // Monday before the firing time stays on the same day
        assert_eq!(
            config.next_execution(at(2026, 3, 9, 7, 59, 0)),
            Some(at(2026, 3, 9, 8, 0, 0))
        );
    }

    #[test]
    fn test_next_execution_monthly() {
        let config = ScheduledRuleConfig::monthly(15, 8, 0);
        assert_eq!(
            config.next_execution(at(2026, 3, 10, 0, 0, 0)),
            Some(at(2026, 3, 15, 8, 0, 0))
        );
        assert_eq!(
            config.next_execution(at(2026, 3, 15, 9, 0, 0)),
            Some(at(2026, 4, 15, 8, 0, 0))
        );
        assert_eq!(
            config.next_execution(at(2026, 12, 20, 0, 0, 0)),
            Some(at(2027, 1, 15, 8, 0, 0))
        );
    }

    #[test]
    fn test_monthly_clamps_to_last_day() {
        let config = ScheduledRuleConfig::monthly(31, 10, 0);

        // April has 30 days
        assert_eq!(
            config.next_execution(at(2026, 3, 31, 11, 0, 0)),
            Some(at(2026, 4, 30, 10, 0, 0))
        );
        assert!(config.should_run_now(at(2026, 4, 30, 10, 0, 0)));

        // February in a non-leap and a leap year
        assert_eq!(
            config.next_execution(at(2026, 2, 1, 0, 0, 0)),
            Some(at(2026, 2, 28, 10, 0, 0))
        );
        assert_eq!(
            config.next_execution(at(2028, 2, 1, 0, 0, 0)),
            Some(at(2028, 2, 29, 10, 0, 0))
        );
    }

    #[test]
    fn test_next_execution_is_after_input() {
        let configs = [
            ScheduledRuleConfig::daily(0, 0),
            ScheduledRuleConfig::daily(23, 59),
            ScheduledRuleConfig::weekly(0, 12, 0),
            ScheduledRuleConfig::weekly(6, 23, 59),
            ScheduledRuleConfig::monthly(1, 0, 0),
            ScheduledRuleConfig::monthly(31, 23, 59),
        ];
        let start = at(2026, 1, 1, 0, 0, 0);

        for config in &configs {
            for step in 0..400 {
                let after = start + Duration::hours(step * 7) + Duration::minutes(step % 60);
                let next = config.next_execution(after).unwrap();
                assert!(next > after, "{config:?} at {after}: {next}");
            }
        }
    }

    #[test]
    fn test_scheduled_rule_new_validates() {
        let config = ScheduledRuleConfig {
            day_of_week: None,
            ..ScheduledRuleConfig::weekly(1, 9, 0)
        };
        let result = ScheduledAutomationRule::new(scheduled_automation(), config, Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn test_scheduled_rule_mark_executed() {
        let now = at(2026, 3, 2, 14, 30, 0);
        let mut rule = ScheduledAutomationRule::new(
            scheduled_automation(),
            ScheduledRuleConfig::daily(14, 30),
            at(2026, 3, 2, 10, 0, 0),
        )
        .unwrap();

        assert_eq!(rule.next_execution_at(), Some(now));
        assert!(rule.is_due(now));

        rule.mark_executed(now);
        assert_eq!(rule.last_executed_at(), Some(now));
        assert_eq!(rule.next_execution_at(), Some(at(2026, 3, 3, 14, 30, 0)));

        // Same minute, polled again
        assert!(!rule.is_due(now + Duration::seconds(30)));
        // Next day
        assert!(rule.is_due(at(2026, 3, 3, 14, 30, 5)));
    }

    #[test]
    fn test_once_rule_is_cleared_after_execution() {
        let start = at(2026, 3, 2, 9, 0, 0);
        let mut rule = ScheduledAutomationRule::new(
            scheduled_automation(),
            ScheduledRuleConfig::once(start),
            at(2026, 3, 1, 0, 0, 0),
        )
        .unwrap();

        assert!(!rule.is_exhausted(at(2026, 3, 1, 0, 0, 0)));
        rule.mark_executed(start);
        assert_eq!(rule.next_execution_at(), None);
        assert!(rule.is_exhausted(start));
    }

    #[test]
    fn test_disabled_rule_is_never_due() {
        let now = at(2026, 3, 2, 14, 30, 0);
        let mut rule = ScheduledAutomationRule::new(
            scheduled_automation(),
            ScheduledRuleConfig::daily(14, 30),
            now,
        )
        .unwrap();
        rule.automation_mut().disable();
        assert!(!rule.is_due(now));
    }

    #[test]
    fn test_schedule_deserialize() {
        let config: ScheduledRuleConfig = serde_json::from_value(serde_json::json!({
            "type": "weekly",
            "day_of_week": 5,
            "hour": 17,
            "minute": 45
        }))
        .unwrap();

        assert_eq!(config, ScheduledRuleConfig::weekly(5, 17, 45));
    }

    #[test]
    fn test_once_at_end_of_time_does_not_overflow() {
        let start = DateTime::<Utc>::MAX_UTC - Duration::seconds(30);
        let config = ScheduledRuleConfig::once(start);
        assert!(config.validate().is_ok());

        let rule =
            ScheduledAutomationRule::new(scheduled_automation(), config.clone(), Utc::now())
                .unwrap();
        assert!(!rule.is_exhausted(Utc::now()));
        assert!(!rule.is_exhausted(DateTime::<Utc>::MAX_UTC));
        assert!(!config.should_run_now(Utc::now()));
        assert!(config.should_run_now(DateTime::<Utc>::MAX_UTC));
    }
}

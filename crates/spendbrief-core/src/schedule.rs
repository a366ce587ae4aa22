//! Report schedules
//!
//! Schedules are standard five-field cron expressions
//! (`MINUTE HOUR DAY-OF-MONTH MONTH DAY-OF-WEEK`), evaluated by the `cron`
//! crate. Day-of-week accepts numbers (0 or 7 = Sunday), three-letter names,
//! lists, ranges and steps.
//!
//! - `SPENDBRIEF_SCHEDULES`: `;`-separated expressions (default: `0 10 * * 1`,
//!   Mondays at 10:00 local time)

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Weekday};
use cron::Schedule;

use crate::error::{Error, Result};

pub const SCHEDULES_ENV: &str = "SPENDBRIEF_SCHEDULES";
pub const DEFAULT_SCHEDULE: &str = "0 10 * * 1";

const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// When the report is sent
#[derive(Debug, Clone)]
pub struct ReportSchedule {
    expression: String,
    days: Vec<Weekday>,
    schedule: Schedule,
}

impl ReportSchedule {
    pub fn parse(expression: &str) -> Result<Self> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let &[minute, hour, day_of_month, month, weekdays] = fields.as_slice() else {
            return Err(schedule_error(expression, "expected 5 fields"));
        };

        let days = parse_weekdays(weekdays)
            .ok_or_else(|| schedule_error(expression, "day-of-week must be *, 0-7 or sun-sat"))?;

        // The cron crate wants a leading seconds field and numbers weekdays
        // from 1 = Sunday, so weekdays are handed over by name
        let weekday_field = if weekdays == "*" {
            "*".to_string()
        } else {
            days.iter()
                .map(|day| WEEKDAY_NAMES[day.num_days_from_sunday() as usize])
                .collect::<Vec<_>>()
                .join(",")
        };
        let cron_expression = format!(
            "0 {} {} {} {} {}",
            minute, hour, day_of_month, month, weekday_field
        );
        let schedule = Schedule::from_str(&cron_expression)
            .map_err(|e| schedule_error(expression, &e.to_string()))?;

        Ok(Self {
            expression: fields.join(" "),
            days,
            schedule,
        })
    }

    /// Days of the week the schedule may fire on, Sunday first
    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// The next firing strictly after `now`
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedule.after(now).next()
    }
}

impl PartialEq for ReportSchedule {
    fn eq(&self, other: &Self) -> bool {
        self.expression == other.expression
    }
}

impl Eq for ReportSchedule {}

impl FromStr for ReportSchedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ReportSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

fn schedule_error(expression: &str, reason: &str) -> Error {
    Error::Schedule(format!("Invalid schedule {:?}: {}", expression, reason))
}

/// Day-of-week number, 0 through 7 with both ends meaning Sunday
fn weekday_number(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse::<u32>() {
        return (n <= 7).then_some(n);
    }
    WEEKDAY_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(token))
        .map(|n| n as u32)
}

fn parse_weekdays(field: &str) -> Option<Vec<Weekday>> {
    let mut numbers: Vec<u32> = Vec::new();

    for part in field.split(',') {
        let (base, step) = match part.split_once('/') {
            Some((base, step)) => (base, step.parse::<usize>().ok().filter(|s| *s > 0)?),
            None => (part, 1),
        };

        let (start, end) = if base == "*" {
            (0, 6)
        } else if let Some((start, end)) = base.split_once('-') {
            (weekday_number(start)?, weekday_number(end)?)
        } else {
            let n = weekday_number(base)?;
            // `n/step` runs from n to the end of the week
            (n, if part.contains('/') { 6u32.max(n) } else { n })
        };

        if start > end {
            return None;
        }
        numbers.extend((start..=end).step_by(step));
    }

    let mut days: Vec<u32> = numbers.into_iter().map(|n| n % 7).collect();
    days.sort_unstable();
    days.dedup();

    Some(days.into_iter().map(weekday_from_sunday).collect())
}

fn weekday_from_sunday(n: u32) -> Weekday {
    match n {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

/// The set of schedules the report runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub schedules: Vec<ReportSchedule>,
}

impl ScheduleConfig {
    /// Parse a `;`-separated list of expressions
    pub fn parse(list: &str) -> Result<Self> {
        let schedules = list
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ReportSchedule::parse)
            .collect::<Result<Vec<_>>>()?;

        if schedules.is_empty() {
            return Err(Error::Schedule("No schedules configured".into()));
        }

        Ok(Self { schedules })
    }

    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let list = std::env::var(SCHEDULES_ENV)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());
        Self::parse(&list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_parse_monday_morning() {
        let schedule = ReportSchedule::parse("0  10 * *   1").unwrap();
        assert_eq!(schedule.days(), &[Weekday::Mon]);
        assert_eq!(schedule.to_string(), "0 10 * * 1");
    }

    #[test]
    fn test_parse_weekday_lists_ranges_and_names() {
        let schedule = ReportSchedule::parse("30 18 * * 7,mon-TUE,0").unwrap();
        assert_eq!(schedule.days(), &[Weekday::Sun, Weekday::Mon, Weekday::Tue]);

        let every_day = ReportSchedule::parse("0 6 * * *").unwrap();
        assert_eq!(every_day.days().len(), 7);

        let weekend = ReportSchedule::parse("0 9 * * 6-7").unwrap();
        assert_eq!(weekend.days(), &[Weekday::Sun, Weekday::Sat]);
    }

    #[test]
    fn test_parse_weekday_steps() {
        let schedule = ReportSchedule::parse("0 8 * * */2").unwrap();
        assert_eq!(
            schedule.days(),
            &[Weekday::Sun, Weekday::Tue, Weekday::Thu, Weekday::Sat]
        );

        let schedule = ReportSchedule::parse("0 8 * * 1-5/2").unwrap();
        assert_eq!(schedule.days(), &[Weekday::Mon, Weekday::Wed, Weekday::Fri]);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        for expr in [
            "",
            "0 10 * *",
            "0 10 * * 1 2026",
            "60 10 * * 1",
            "0 24 * * 1",
            "0 10 * * 8",
            "0 10 * * 5-1",
            "0 10 * * funday",
            "0 10 * * 1/0",
            "0 10 * * 1,",
        ] {
            let result = ReportSchedule::parse(expr);
            assert!(matches!(result, Err(Error::Schedule(_))), "accepted {:?}", expr);
        }
    }

    #[test]
    fn test_next_after_later_same_week() {
        let schedule = ReportSchedule::parse("0 10 * * 1").unwrap();
        // 2024-03-13 is a Wednesday
        let next = schedule.next_after(&utc(2024, 3, 13, 12, 0)).unwrap();
        assert_eq!(next, utc(2024, 3, 18, 10, 0));
    }

    #[test]
    fn test_next_after_same_day_before_and_after() {
        let schedule = ReportSchedule::parse("0 18 * * 2").unwrap();
        // 2024-03-12 is a Tuesday
        assert_eq!(
            schedule.next_after(&utc(2024, 3, 12, 9, 0)).unwrap(),
            utc(2024, 3, 12, 18, 0)
        );
        // Exactly at the firing time moves to next week
        assert_eq!(
            schedule.next_after(&utc(2024, 3, 12, 18, 0)).unwrap(),
            utc(2024, 3, 19, 18, 0)
        );
    }

    #[test]
    fn test_next_after_multiple_days() {
        let schedule = ReportSchedule::parse("15 7 * * mon,fri").unwrap();
        assert_eq!(
            schedule.next_after(&utc(2024, 3, 13, 0, 0)).unwrap(),
            utc(2024, 3, 15, 7, 15)
        );
    }

    #[test]
    fn test_next_after_minute_steps() {
        let schedule = ReportSchedule::parse("*/15 9 * * 1-5").unwrap();
        assert_eq!(
            schedule.next_after(&utc(2024, 3, 13, 9, 20)).unwrap(),
            utc(2024, 3, 13, 9, 30)
        );
    }

    #[test]
    fn test_next_after_day_of_month() {
        let schedule = ReportSchedule::parse("0 9 1 * *").unwrap();
        assert_eq!(
            schedule.next_after(&utc(2024, 3, 13, 0, 0)).unwrap(),
            utc(2024, 4, 1, 9, 0)
        );
    }

    #[test]
    fn test_schedule_config_parse() {
        let config = ScheduleConfig::parse("0 10 * * 1; 0 18 * * 2").unwrap();
        assert_eq!(config.schedules.len(), 2);
        assert_eq!(config.schedules[1].to_string(), "0 18 * * 2");

        assert!(ScheduleConfig::parse(" ; ").is_err());
        assert!(ScheduleConfig::parse("0 10 * * 1;bad").is_err());
    }

    #[test]
    fn test_default_schedule_is_monday_morning() {
        let config = ScheduleConfig::parse(DEFAULT_SCHEDULE).unwrap();
        assert_eq!(config.schedules.len(), 1);
        assert_eq!(config.schedules[0].days(), &[Weekday::Mon]);
        assert_eq!(
            config.schedules[0]
                .next_after(&utc(2024, 3, 17, 23, 0))
                .unwrap(),
            utc(2024, 3, 18, 10, 0)
        );
    }
}

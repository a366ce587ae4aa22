//! Report windows
//!
//! Derives the six calendar windows the weekly report compares:
//! the four most recent completed Sunday-to-Saturday weeks, the current
//! month to date, and the whole previous month.
//!
//! All windows are inclusive calendar-day ranges. The current date is always
//! passed in explicitly; only [`ReportWindows::current`] reads the clock.

use std::fmt;

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Identifies one of the six report windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    LastWeek,
    TwoWeeksAgo,
    ThreeWeeksAgo,
    FourWeeksAgo,
    ThisMonth,
    LastMonth,
}

impl WindowKind {
    pub const ALL: [WindowKind; 6] = [
        WindowKind::LastWeek,
        WindowKind::TwoWeeksAgo,
        WindowKind::ThreeWeeksAgo,
        WindowKind::FourWeeksAgo,
        WindowKind::ThisMonth,
        WindowKind::LastMonth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::LastWeek => "Last Week",
            Self::TwoWeeksAgo => "2 Weeks Ago",
            Self::ThreeWeeksAgo => "3 Weeks Ago",
            Self::FourWeeksAgo => "4 Weeks Ago",
            Self::ThisMonth => "This Month",
            Self::LastMonth => "Last Month",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The six windows of one report run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindows {
    pub last_week: DateWindow,
    pub two_weeks_ago: DateWindow,
    pub three_weeks_ago: DateWindow,
    pub four_weeks_ago: DateWindow,
    pub this_month: DateWindow,
    pub last_month: DateWindow,
}

impl ReportWindows {
    /// Derive the windows for a report run on `today`
    ///
    /// Weeks count back from the most recent Sunday (today, if today is a
    /// Sunday), so "last week" is always a completed Sunday-to-Saturday week.
    pub fn for_date(today: NaiveDate) -> Self {
        let week_start = today - Days::new(u64::from(today.weekday().num_days_from_sunday()));
        let week = |weeks_back: u64| {
            let start = week_start - Days::new(7 * weeks_back);
            DateWindow::new(start, start + Days::new(6))
        };

        let month_start = first_of_month(today);
        let last_month_end = month_start - Days::new(1);

        Self {
            last_week: week(1),
            two_weeks_ago: week(2),
            three_weeks_ago: week(3),
            four_weeks_ago: week(4),
            this_month: DateWindow::new(month_start, today),
            last_month: DateWindow::new(first_of_month(last_month_end), last_month_end),
        }
    }

    /// Derive the windows for today's local date
    pub fn current() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    pub fn get(&self, kind: WindowKind) -> DateWindow {
        match kind {
            WindowKind::LastWeek => self.last_week,
            WindowKind::TwoWeeksAgo => self.two_weeks_ago,
            WindowKind::ThreeWeeksAgo => self.three_weeks_ago,
            WindowKind::FourWeeksAgo => self.four_weeks_ago,
            WindowKind::ThisMonth => self.this_month,
            WindowKind::LastMonth => self.last_month,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (WindowKind, DateWindow)> + '_ {
        WindowKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Earliest day covered by any window
    ///
    /// Early in a month the fourth week back can start before the previous
    /// month does, so this is not always the start of last month.
    pub fn history_start(&self) -> NaiveDate {
        self.iter()
            .map(|(_, window)| window.start)
            .min()
            .unwrap_or(self.last_month.start)
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weeks_from_a_wednesday() {
        // 2024-03-13 is a Wednesday; the current week started Sunday 2024-03-10
        let windows = ReportWindows::for_date(date(2024, 3, 13));

        assert_eq!(windows.last_week, DateWindow::new(date(2024, 3, 3), date(2024, 3, 9)));
        assert_eq!(windows.two_weeks_ago, DateWindow::new(date(2024, 2, 25), date(2024, 3, 2)));
        assert_eq!(windows.three_weeks_ago, DateWindow::new(date(2024, 2, 18), date(2024, 2, 24)));
        assert_eq!(windows.four_weeks_ago, DateWindow::new(date(2024, 2, 11), date(2024, 2, 17)));
    }

    #[test]
    fn test_weeks_are_sunday_to_saturday() {
        let windows = ReportWindows::for_date(date(2024, 3, 13));
        for window in [
            windows.last_week,
            windows.two_weeks_ago,
            windows.three_weeks_ago,
            windows.four_weeks_ago,
        ] {
            assert_eq!(window.start.weekday(), Weekday::Sun);
            assert_eq!(window.end.weekday(), Weekday::Sat);
            assert_eq!(window.days(), 7);
        }
    }

    #[test]
    fn test_four_weeks_ago_is_21_days_before_last_week() {
        let windows = ReportWindows::for_date(date(2024, 3, 13));
        assert_eq!(
            (windows.last_week.start - windows.four_weeks_ago.start).num_days(),
            21
        );
    }

    #[test]
    fn test_weeks_on_a_sunday_count_from_today() {
        // 2024-03-10 is a Sunday: last week ended yesterday
        let windows = ReportWindows::for_date(date(2024, 3, 10));
        assert_eq!(windows.last_week, DateWindow::new(date(2024, 3, 3), date(2024, 3, 9)));
    }

    #[test]
    fn test_month_windows() {
        let windows = ReportWindows::for_date(date(2024, 3, 13));
        assert_eq!(windows.this_month, DateWindow::new(date(2024, 3, 1), date(2024, 3, 13)));
        // Leap year February
        assert_eq!(windows.last_month, DateWindow::new(date(2024, 2, 1), date(2024, 2, 29)));
    }

    #[test]
    fn test_month_windows_in_january() {
        let windows = ReportWindows::for_date(date(2025, 1, 1));
        assert_eq!(windows.this_month, DateWindow::new(date(2025, 1, 1), date(2025, 1, 1)));
        assert_eq!(windows.last_month, DateWindow::new(date(2024, 12, 1), date(2024, 12, 31)));
    }

    #[test]
    fn test_history_start_covers_early_weeks() {
        // 2024-03-13: last month starts before the fourth week
        let windows = ReportWindows::for_date(date(2024, 3, 13));
        assert_eq!(windows.history_start(), date(2024, 2, 1));

        // 2024-03-02 (Saturday): week started 2024-02-25, fourth week starts 2024-01-28
        let windows = ReportWindows::for_date(date(2024, 3, 2));
        assert_eq!(windows.four_weeks_ago.start, date(2024, 1, 28));
        assert_eq!(windows.history_start(), date(2024, 1, 28));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let window = DateWindow::new(date(2024, 3, 3), date(2024, 3, 9));
        assert!(window.contains(date(2024, 3, 3)));
        assert!(window.contains(date(2024, 3, 9)));
        assert!(!window.contains(date(2024, 3, 2)));
        assert!(!window.contains(date(2024, 3, 10)));
    }

    #[test]
    fn test_iter_order_and_labels() {
        let windows = ReportWindows::for_date(date(2024, 3, 13));
        let kinds: Vec<_> = windows.iter().map(|(kind, _)| kind).collect();
        assert_eq!(kinds, WindowKind::ALL.to_vec());
        assert_eq!(WindowKind::FourWeeksAgo.to_string(), "4 Weeks Ago");
    }

    #[test]
    fn test_deterministic() {
        let today = date(2024, 7, 17);
        assert_eq!(ReportWindows::for_date(today), ReportWindows::for_date(today));
    }
}

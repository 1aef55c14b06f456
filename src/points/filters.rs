// Query-string filters shared by the point pages
use chrono::{DateTime, Months, TimeZone, Utc};

use super::domain::PointStatus;

/// Status tabs on the seller and map pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Active,
    Sold,
    All,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [StatusFilter::Active, StatusFilter::Sold, StatusFilter::All];

    pub fn status(&self) -> Option<PointStatus> {
        match self {
            StatusFilter::Active => Some(PointStatus::Active),
            StatusFilter::Sold => Some(PointStatus::Sold),
            StatusFilter::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Active => "active",
            StatusFilter::Sold => "sold",
            StatusFilter::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::Active => "Available",
            StatusFilter::Sold => "Sold",
            StatusFilter::All => "All",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(StatusFilter::Active),
            "sold" => Some(StatusFilter::Sold),
            "all" => Some(StatusFilter::All),
            _ => None,
        }
    }
}

/// Time ranges on the logs page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogRange {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl LogRange {
    pub const ALL: [LogRange; 4] = [LogRange::All, LogRange::Today, LogRange::Week, LogRange::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogRange::All => "all",
            LogRange::Today => "today",
            LogRange::Week => "week",
            LogRange::Month => "month",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogRange::All => "All",
            LogRange::Today => "Today",
            LogRange::Week => "Last 7 days",
            LogRange::Month => "Last month",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(LogRange::All),
            "today" => Some(LogRange::Today),
            "week" => Some(LogRange::Week),
            "month" => Some(LogRange::Month),
            _ => None,
        }
    }

    /// Lower bound for `sold_at`, relative to `now` in the viewer's time zone.
    pub fn since<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
        match self {
            LogRange::All => None,
            LogRange::Today => start_of_day(now),
            LogRange::Week => Some(now.with_timezone(&Utc) - chrono::Duration::days(7)),
            LogRange::Month => now
                .with_timezone(&Utc)
                .checked_sub_months(Months::new(1)),
        }
    }
}

/// Local midnight of the day containing `now`, in UTC.
pub fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<DateTime<Utc>> {
    let midnight = now.date_naive().and_hms_opt(0, 0, 0)?;
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn status_filter_parsing() {
        assert_eq!(StatusFilter::default(), StatusFilter::Active);
        assert_eq!(StatusFilter::parse("bogus"), None);
        assert_eq!(StatusFilter::parse("all").map(|f| f.status()), Some(None));
        assert_eq!(
            StatusFilter::parse("sold").and_then(|f| f.status()),
            Some(PointStatus::Sold)
        );
    }

    #[test]
    fn today_starts_at_local_midnight() {
        let riyadh = FixedOffset::east_opt(3 * 3600).unwrap();
        let now = riyadh.with_ymd_and_hms(2024, 5, 2, 1, 30, 0).unwrap();
        let since = LogRange::Today.since(&now).unwrap();
        assert_eq!(since, Utc.with_ymd_and_hms(2024, 5, 1, 21, 0, 0).unwrap());
    }

    #[test]
    fn week_and_month_are_rolling() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        assert_eq!(
            LogRange::Week.since(&now),
            Some(Utc.with_ymd_and_hms(2024, 3, 24, 12, 0, 0).unwrap())
        );
        assert_eq!(
            LogRange::Month.since(&now),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
        );
        assert_eq!(LogRange::All.since(&now), None);
    }

    #[test]
    fn unknown_range_is_rejected() {
        assert_eq!(LogRange::parse("year"), None);
        assert_eq!(LogRange::parse("week"), Some(LogRange::Week));
    }
}

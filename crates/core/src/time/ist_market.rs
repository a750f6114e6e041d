use anyhow::Context;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike, Utc};
use std::collections::HashSet;

// India does not observe DST, so IST is a fixed UTC+05:30.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

// NSE cash session, inclusive at both ends.
const OPEN_HOUR: u32 = 9;
const OPEN_MINUTE: u32 = 15;
const CLOSE_HOUR: u32 = 15;
const CLOSE_MINUTE: u32 = 30;

pub fn ist() -> anyhow::Result<FixedOffset> {
    FixedOffset::east_opt(IST_OFFSET_SECS).context("invalid IST offset")
}

/// Wall-clock reading in IST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketTime {
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
    /// 0 = Sunday .. 6 = Saturday.
    pub weekday: u32,
}

impl MarketTime {
    pub fn from_utc(now_utc: DateTime<Utc>) -> anyhow::Result<Self> {
        let now_ist = now_utc.with_timezone(&ist()?);
        Ok(Self {
            date: now_ist.date_naive(),
            hour: now_ist.hour(),
            minute: now_ist.minute(),
            weekday: now_ist.weekday().num_days_from_sunday(),
        })
    }
}

pub fn is_weekday(weekday: u32) -> bool {
    (1..=5).contains(&weekday)
}

pub fn is_market_hours(hour: u32, minute: u32) -> bool {
    let after_open = hour > OPEN_HOUR || (hour == OPEN_HOUR && minute >= OPEN_MINUTE);
    let before_close = hour < CLOSE_HOUR || (hour == CLOSE_HOUR && minute <= CLOSE_MINUTE);
    after_open && before_close
}

#[derive(Debug, Clone, Default)]
pub struct MarketCalendar {
    holidays: HashSet<NaiveDate>,
}

impl MarketCalendar {
    pub fn new(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Parses `"YYYY-MM-DD,YYYY-MM-DD"`. Blank parts are skipped; malformed dates are an error
    /// so a typo in the holiday list does not silently keep the board refreshing.
    pub fn from_holiday_list(list: Option<&str>) -> anyhow::Result<Self> {
        let mut out = HashSet::new();
        for part in list.unwrap_or_default().split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let d = NaiveDate::parse_from_str(part, "%Y-%m-%d")
                .with_context(|| format!("invalid market holiday date: {part}"))?;
            out.insert(d);
        }
        Ok(Self { holidays: out })
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_open_at(&self, t: &MarketTime) -> bool {
        is_weekday(t.weekday) && is_market_hours(t.hour, t.minute) && !self.is_holiday(t.date)
    }

    pub fn should_refresh(&self, now_utc: DateTime<Utc>) -> anyhow::Result<bool> {
        Ok(self.is_open_at(&MarketTime::from_utc(now_utc)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2024-01-01 is a Monday.
    fn ist_utc(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        ist()
            .unwrap()
            .with_ymd_and_hms(2024, 1, day, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn converts_utc_to_ist_wall_clock() {
        // 2024-01-01 03:45 UTC = 09:15 IST
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 3, 45, 0).unwrap();
        let t = MarketTime::from_utc(now).unwrap();
        assert_eq!((t.hour, t.minute, t.weekday), (9, 15, 1));
    }

    #[test]
    fn date_rolls_over_at_ist_midnight() {
        // Sunday 19:00 UTC is already Monday 00:30 IST.
        let now = Utc.with_ymd_and_hms(2023, 12, 31, 19, 0, 0).unwrap();
        let t = MarketTime::from_utc(now).unwrap();
        assert_eq!(t.weekday, 1);
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn market_hours_boundaries() {
        assert!(!is_market_hours(9, 14));
        assert!(is_market_hours(9, 15));
        assert!(is_market_hours(12, 0));
        assert!(is_market_hours(15, 30));
        assert!(!is_market_hours(15, 31));
        assert!(!is_market_hours(8, 59));
        assert!(!is_market_hours(16, 0));
    }

    #[test]
    fn monday_session_edges() {
        let cal = MarketCalendar::default();
        assert!(!cal.should_refresh(ist_utc(1, 9, 14)).unwrap());
        assert!(cal.should_refresh(ist_utc(1, 9, 15)).unwrap());
        assert!(cal.should_refresh(ist_utc(1, 15, 30)).unwrap());
        assert!(!cal.should_refresh(ist_utc(1, 15, 31)).unwrap());
    }

    #[test]
    fn weekend_is_closed_regardless_of_hour() {
        // 2024-01-06 is a Saturday, 2024-01-07 a Sunday.
        let sat = MarketTime::from_utc(ist_utc(6, 10, 0)).unwrap();
        assert_eq!(sat.weekday, 6);
        assert!(!is_weekday(sat.weekday));
        assert!(!MarketCalendar::default().is_open_at(&sat));
        assert!(!MarketCalendar::default().should_refresh(ist_utc(7, 12, 0)).unwrap());
    }

    #[test]
    fn configured_holiday_closes_the_session() {
        let cal = MarketCalendar::from_holiday_list(Some("2024-01-01, ,2024-01-26")).unwrap();
        assert!(!cal.should_refresh(ist_utc(1, 10, 0)).unwrap());
        assert!(cal.should_refresh(ist_utc(2, 10, 0)).unwrap());
        assert!(cal.is_holiday(NaiveDate::from_ymd_opt(2024, 1, 26).unwrap()));
    }

    #[test]
    fn rejects_malformed_holiday() {
        assert!(MarketCalendar::from_holiday_list(Some("2024-13-01")).is_err());
        assert!(MarketCalendar::from_holiday_list(None).is_ok());
    }
}

use chrono::{DateTime, Months, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Deserializer};

/// Wire format for calendar days (`2026-01-01`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CalendarError {
    #[display(fmt = "end date {} is before start date {}", end, start)]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl std::error::Error for CalendarError {}

/// Inclusive range of calendar days. `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CalendarError> {
        if end < start {
            return Err(CalendarError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a range, pulling `end` up to `start` when it lies before it.
    pub fn clamped(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive day count, never zero.
    pub fn len_days(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(DateRange { start, end })
    }

    /// Ordered days from start to end. The range is `Copy`, so every call
    /// starts a fresh walk.
    pub fn days(&self) -> Days {
        Days {
            next: Some(self.start),
            end: self.end,
        }
    }
}

impl IntoIterator for DateRange {
    type Item = NaiveDate;
    type IntoIter = Days;

    fn into_iter(self) -> Days {
        self.days()
    }
}

impl IntoIterator for &DateRange {
    type Item = NaiveDate;
    type IntoIter = Days;

    fn into_iter(self) -> Days {
        self.days()
    }
}

#[derive(Debug, Clone)]
pub struct Days {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.filter(|day| *day <= self.end)?;
        self.next = current.succ_opt();
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next {
            Some(day) if day <= self.end => (self.end - day).num_days() as usize + 1,
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Days {}

/// Inclusive number of days from `start` to `end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> Result<u32, CalendarError> {
    Ok(DateRange::new(start, end)?.len_days())
}

pub fn enumerate_days(start: NaiveDate, end: NaiveDate) -> Result<DateRange, CalendarError> {
    DateRange::new(start, end)
}

pub fn format_date(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// Accepts a plain `YYYY-MM-DD` day or an RFC 3339 timestamp. Timestamps are
/// truncated to their UTC calendar day.
pub fn parse_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
    let input = input.trim();
    match NaiveDate::parse_from_str(input, DATE_FORMAT) {
        Ok(day) => Ok(day),
        Err(date_err) => DateTime::parse_from_rfc3339(input)
            .map(|ts| calendar_day(ts.with_timezone(&Utc)))
            .map_err(|_| date_err),
    }
}

pub fn calendar_day(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Calendar-month addition, clamped to the last day of the target month.
pub fn add_months(day: NaiveDate, months: u32) -> Option<NaiveDate> {
    day.checked_add_months(Months::new(months))
}

pub fn deserialize_calendar_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub fn deserialize_optional_calendar_day<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_date(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Source of "today" for horizon and expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        calendar_day(self.now())
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl FixedClock {
    /// Noon UTC on the given day.
    pub fn on(day: NaiveDate) -> Self {
        Self(day.and_hms_opt(12, 0, 0).unwrap().and_utc())
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

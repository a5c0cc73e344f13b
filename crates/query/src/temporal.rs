//! Calendar and fiscal calendar arithmetic.
//!
//! Calendar windows are computed on local dates of a fixed UTC offset and
//! converted back to UTC instants. Weeks start on Sunday. A fiscal year is
//! named by the calendar year in which it starts.

use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use fetchkit_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Fiscal period template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiscalPeriodTemplate {
    #[default]
    Annually,
    SemiAnnually,
    Quarterly,
    Monthly,
    /// Thirteen 28-day periods; the last one absorbs the remainder of the year.
    FourWeek,
}

impl FiscalPeriodTemplate {
    /// Number of periods in a fiscal year.
    pub fn periods(&self) -> u32 {
        match self {
            FiscalPeriodTemplate::Annually => 1,
            FiscalPeriodTemplate::SemiAnnually => 2,
            FiscalPeriodTemplate::Quarterly => 4,
            FiscalPeriodTemplate::Monthly => 12,
            FiscalPeriodTemplate::FourWeek => 13,
        }
    }

    fn months_per_period(&self) -> Option<u32> {
        match self {
            FiscalPeriodTemplate::FourWeek => None,
            other => Some(12 / other.periods()),
        }
    }
}

/// Fiscal calendar configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiscalSettings {
    /// Month (1-12) the fiscal year starts in.
    pub start_month: u32,
    /// Day of month the fiscal year starts on; clamped to the month length.
    pub start_day: u32,
    pub template: FiscalPeriodTemplate,
}

impl Default for FiscalSettings {
    fn default() -> Self {
        Self {
            start_month: 1,
            start_day: 1,
            template: FiscalPeriodTemplate::Annually,
        }
    }
}

impl FiscalSettings {
    /// Creates validated fiscal settings.
    pub fn new(start_month: u32, start_day: u32, template: FiscalPeriodTemplate) -> Result<Self> {
        let settings = Self {
            start_month,
            start_day,
            template,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Checks the start month and day ranges.
    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.start_month) {
            return Err(Error::configuration(format!(
                "Fiscal year start month must be between 1 and 12, got {}",
                self.start_month
            )));
        }
        if !(1..=31).contains(&self.start_day) {
            return Err(Error::configuration(format!(
                "Fiscal year start day must be between 1 and 31, got {}",
                self.start_day
            )));
        }
        Ok(())
    }

    /// Number of periods per fiscal year.
    pub fn periods(&self) -> u32 {
        self.template.periods()
    }

    /// First day of the fiscal year named `year`.
    pub fn year_start(&self, year: i32) -> NaiveDate {
        clamped_date(year, self.start_month, self.start_day)
    }

    /// Fiscal year containing `date`.
    pub fn year_of(&self, date: NaiveDate) -> i32 {
        if date >= self.year_start(date.year()) {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// Inclusive first and last day of a fiscal year.
    pub fn year_bounds(&self, year: i32) -> (NaiveDate, NaiveDate) {
        (self.year_start(year), previous_day(self.year_start(year.saturating_add(1))))
    }

    /// Returns true if every day of the fiscal year `year` is a
    /// representable date.
    pub fn contains_year(&self, year: i32) -> bool {
        let first = NaiveDate::from_ymd_opt(year, 1, 1);
        let after = year.checked_add(2).and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1));
        first.is_some() && after.is_some()
    }

    /// Inclusive first and last day of a fiscal period.
    pub fn period_bounds(&self, year: i32, period: u32) -> Result<(NaiveDate, NaiveDate)> {
        let periods = self.periods();
        if period == 0 || period > periods {
            return Err(Error::invalid_argument(format!(
                "Fiscal period must be between 1 and {periods}, got {period}"
            )));
        }
        let year_start = self.year_start(year);
        match self.template.months_per_period() {
            Some(months) => {
                let start = add_months(year_start, i64::from((period - 1) * months));
                let end = previous_day(add_months(year_start, i64::from(period * months)));
                Ok((start, end))
            }
            None => {
                let out_of_range = || Error::invalid_argument(format!("Fiscal year {year} is out of range"));
                let start = year_start
                    .checked_add_days(Days::new(28 * u64::from(period - 1)))
                    .ok_or_else(out_of_range)?;
                let end = if period == periods {
                    previous_day(self.year_start(year.saturating_add(1)))
                } else {
                    start.checked_add_days(Days::new(27)).ok_or_else(out_of_range)?
                };
                Ok((start, end))
            }
        }
    }

    /// Fiscal year and period containing `date`.
    pub fn period_of(&self, date: NaiveDate) -> (i32, u32) {
        let year = self.year_of(date);
        let periods = self.periods();
        match self.template.months_per_period() {
            Some(months) => {
                let start = self.year_start(year);
                let mut period = 1;
                while period < periods
                    && date >= add_months(start, i64::from(period * months))
                {
                    period += 1;
                }
                (year, period)
            }
            None => {
                let days = (date - self.year_start(year)).num_days();
                let period = (days / 28 + 1).clamp(1, i64::from(periods));
                (year, period as u32)
            }
        }
    }

    /// Moves a (year, period) pair by `delta` periods. Returns `None` when
    /// the resulting year does not fit in an `i32`.
    pub fn offset_period(&self, year: i32, period: u32, delta: i64) -> Option<(i32, u32)> {
        let periods = i64::from(self.periods());
        let index = (i64::from(year) * periods + i64::from(period) - 1).checked_add(delta)?;
        let new_year = i32::try_from(index.div_euclid(periods)).ok()?;
        let new_period = index.rem_euclid(periods) + 1;
        Some((new_year, new_period as u32))
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

/// Adds (or subtracts) calendar months, clamping the day to the month
/// length. Returns `None` outside the representable date range.
pub fn checked_add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

/// Like [`checked_add_months`], leaving `date` unchanged on overflow.
pub fn add_months(date: NaiveDate, months: i64) -> NaiveDate {
    checked_add_months(date, months).unwrap_or(date)
}

/// Local calendar date of an instant.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// First instant of a local date.
///
/// Saturates to the extremes of [`DateTime<Utc>`] at the ends of the
/// calendar.
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    let shift = Duration::seconds(i64::from(offset.local_minus_utc()));
    match local.checked_sub_signed(shift) {
        Some(utc) => Utc.from_utc_datetime(&utc),
        None if shift > Duration::zero() => DateTime::<Utc>::MIN_UTC,
        None => DateTime::<Utc>::MAX_UTC,
    }
}

/// Last millisecond of a local date.
pub fn end_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    date.succ_opt()
        .map(|next| start_of_day(next, offset))
        .and_then(|next| next.checked_sub_signed(Duration::milliseconds(1)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Instant window covering an inclusive range of local dates.
pub fn day_window(first: NaiveDate, last: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    (start_of_day(first, offset), end_of_day(last, offset))
}

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
        .unwrap_or(NaiveDate::MIN)
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = clamped_date(date.year(), date.month(), 1);
    (first, previous_day(add_months(first, 1)))
}

/// First and last day of the year containing `date`.
pub fn year_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        clamped_date(date.year(), 1, 1),
        clamped_date(date.year(), 12, 31),
    )
}

/// True if the instant falls exactly on a UTC midnight.
pub fn is_midnight(instant: DateTime<Utc>) -> bool {
    instant.time() == NaiveTime::MIN
}

/// Parses a date or date-time string. Values without an offset are UTC.
pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }
    None
}

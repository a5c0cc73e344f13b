//! Rewrites of relative, calendar and fiscal date operators into
//! concrete comparisons.
//!
//! Each rewrite derives a new condition on the same attribute; the input
//! condition is never modified.

use crate::ast::{ConditionNode, ConditionOperator};
use crate::coercion::{safe_to_int, INT_SENTINEL};
use crate::temporal::{
    checked_add_months, day_window, end_of_day, local_date, month_bounds, start_of_day, week_start,
    year_bounds, FiscalSettings,
};
use chrono::{DateTime, FixedOffset, Months, NaiveDate, TimeDelta, Utc};
use fetchkit_core::{Error, Result, Value};

/// Inputs shared by every rewrite of one query.
#[derive(Clone, Copy, Debug)]
pub struct WindowContext {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
    pub fiscal: FiscalSettings,
}

impl WindowContext {
    fn today(&self) -> NaiveDate {
        local_date(self.now, self.offset)
    }
}

fn between(cond: &ConditionNode, from: DateTime<Utc>, to: DateTime<Utc>) -> ConditionNode {
    cond.derive(
        ConditionOperator::Between,
        vec![Value::DateTime(from), Value::DateTime(to)],
    )
}

fn days(cond: &ConditionNode, first: NaiveDate, last: NaiveDate, ctx: &WindowContext) -> ConditionNode {
    let (from, to) = day_window(first, last, ctx.offset);
    between(cond, from, to)
}

fn on_day(cond: &ConditionNode, day: NaiveDate) -> ConditionNode {
    cond.derive(
        ConditionOperator::On,
        vec![Value::String(day.format("%Y-%m-%d").to_string())],
    )
}

/// Reads the integer operand of an `x` operator.
fn count_operand(cond: &ConditionNode, values: &[Value], minimum: i64) -> Result<i64> {
    let raw = values.first().map(safe_to_int).unwrap_or(INT_SENTINEL);
    if raw == INT_SENTINEL || raw < minimum {
        return Err(Error::invalid_argument(format!(
            "Condition operator {} on attribute '{}' requires an integer value of at least {minimum}",
            cond.operator, cond.attribute
        )));
    }
    Ok(raw)
}

fn fiscal_operand(cond: &ConditionNode, value: Option<&Value>, what: &str) -> Result<i64> {
    let raw = value.map(safe_to_int).unwrap_or(INT_SENTINEL);
    if raw == INT_SENTINEL || raw < 0 {
        return Err(Error::invalid_argument(format!(
            "Condition operator {} on attribute '{}' requires an integer fiscal {what}",
            cond.operator, cond.attribute
        )));
    }
    Ok(raw)
}

fn fiscal_period(cond: &ConditionNode, value: Option<&Value>) -> Result<u32> {
    u32::try_from(fiscal_operand(cond, value, "period")?)
        .map_err(|_| Error::invalid_argument(format!("Fiscal period out of range on '{}'", cond.attribute)))
}

fn fiscal_year(cond: &ConditionNode, value: Option<&Value>) -> Result<i32> {
    i32::try_from(fiscal_operand(cond, value, "year")?)
        .map_err(|_| Error::invalid_argument(format!("Fiscal year out of range on '{}'", cond.attribute)))
}

fn out_of_range(cond: &ConditionNode) -> Error {
    Error::invalid_argument(format!(
        "Condition operator {} on attribute '{}' reaches past the supported date range",
        cond.operator, cond.attribute
    ))
}

fn shift_days(cond: &ConditionNode, date: NaiveDate, days: i64) -> Result<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(cond))
}

fn shift_months(cond: &ConditionNode, date: NaiveDate, months: i64) -> Result<NaiveDate> {
    checked_add_months(date, months).ok_or_else(|| out_of_range(cond))
}

fn shift_instant(cond: &ConditionNode, now: DateTime<Utc>, delta: Option<TimeDelta>) -> Result<DateTime<Utc>> {
    delta
        .and_then(|delta| now.checked_add_signed(delta))
        .ok_or_else(|| out_of_range(cond))
}

fn shift_instant_months(cond: &ConditionNode, now: DateTime<Utc>, months: i64) -> Result<DateTime<Utc>> {
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range(cond))?;
    let shifted = if months >= 0 {
        now.checked_add_months(Months::new(magnitude))
    } else {
        now.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(|| out_of_range(cond))
}

fn scaled(cond: &ConditionNode, x: i64, factor: i64) -> Result<i64> {
    x.checked_mul(factor).ok_or_else(|| out_of_range(cond))
}

fn fiscal_year_bounds(cond: &ConditionNode, fiscal: &FiscalSettings, year: i32) -> Result<(NaiveDate, NaiveDate)> {
    if !fiscal.contains_year(year) {
        return Err(out_of_range(cond));
    }
    Ok(fiscal.year_bounds(year))
}

fn fiscal_period_bounds(
    cond: &ConditionNode,
    fiscal: &FiscalSettings,
    (year, period): (i32, u32),
) -> Result<(NaiveDate, NaiveDate)> {
    if !fiscal.contains_year(year) {
        return Err(out_of_range(cond));
    }
    fiscal.period_bounds(year, period)
}

fn offset_period(
    cond: &ConditionNode,
    fiscal: &FiscalSettings,
    (year, period): (i32, u32),
    delta: i64,
) -> Result<(i32, u32)> {
    fiscal
        .offset_period(year, period, delta)
        .ok_or_else(|| out_of_range(cond))
}

/// Rewrites a date window operator. Returns `None` for operators that are
/// compiled directly.
///
/// Windows reaching past the representable calendar fail with
/// [`Error::InvalidArgument`].
pub fn rewrite(
    cond: &ConditionNode,
    values: &[Value],
    ctx: &WindowContext,
) -> Result<Option<ConditionNode>> {
    use ConditionOperator as Op;

    let now = ctx.now;
    let today = ctx.today();
    let fiscal = &ctx.fiscal;

    let derived = match cond.operator {
        Op::Today => on_day(cond, today),
        Op::Yesterday => on_day(cond, shift_days(cond, today, -1)?),
        Op::Tomorrow => on_day(cond, shift_days(cond, today, 1)?),

        Op::Last7Days => between(cond, shift_instant(cond, now, TimeDelta::try_days(-7))?, now),
        Op::Next7Days => between(cond, now, shift_instant(cond, now, TimeDelta::try_days(7))?),

        Op::LastWeek | Op::ThisWeek | Op::NextWeek => {
            let shift = match cond.operator {
                Op::LastWeek => -7,
                Op::NextWeek => 7,
                _ => 0,
            };
            let first = shift_days(cond, week_start(today), shift)?;
            days(cond, first, shift_days(cond, first, 6)?, ctx)
        }
        Op::LastMonth | Op::ThisMonth | Op::NextMonth => {
            let shift = match cond.operator {
                Op::LastMonth => -1,
                Op::NextMonth => 1,
                _ => 0,
            };
            let (first, last) = month_bounds(shift_months(cond, today, shift)?);
            days(cond, first, last, ctx)
        }
        Op::LastYear | Op::ThisYear | Op::NextYear => {
            let shift = match cond.operator {
                Op::LastYear => -12,
                Op::NextYear => 12,
                _ => 0,
            };
            let (first, last) = year_bounds(shift_months(cond, today, shift)?);
            days(cond, first, last, ctx)
        }

        Op::LastXHours => {
            let x = count_operand(cond, values, 0)?;
            between(cond, shift_instant(cond, now, TimeDelta::try_hours(-x))?, now)
        }
        Op::NextXHours => {
            let x = count_operand(cond, values, 0)?;
            between(cond, now, shift_instant(cond, now, TimeDelta::try_hours(x))?)
        }
        Op::LastXDays | Op::LastXWeeks => {
            let x = count_operand(cond, values, 0)?;
            let span = if cond.operator == Op::LastXWeeks { scaled(cond, x, 7)? } else { x };
            between(cond, start_of_day(shift_days(cond, today, -span)?, ctx.offset), now)
        }
        Op::NextXDays | Op::NextXWeeks => {
            let x = count_operand(cond, values, 0)?;
            let span = if cond.operator == Op::NextXWeeks { scaled(cond, x, 7)? } else { x };
            between(cond, now, end_of_day(shift_days(cond, today, span)?, ctx.offset))
        }
        Op::LastXMonths | Op::LastXYears => {
            let x = count_operand(cond, values, 0)?;
            let months = if cond.operator == Op::LastXYears { scaled(cond, x, 12)? } else { x };
            between(cond, start_of_day(shift_months(cond, today, -months)?, ctx.offset), now)
        }
        Op::NextXMonths | Op::NextXYears => {
            let x = count_operand(cond, values, 0)?;
            let months = if cond.operator == Op::NextXYears { scaled(cond, x, 12)? } else { x };
            between(cond, now, end_of_day(shift_months(cond, today, months)?, ctx.offset))
        }

        Op::OlderThanXMinutes
        | Op::OlderThanXHours
        | Op::OlderThanXDays
        | Op::OlderThanXWeeks
        | Op::OlderThanXMonths
        | Op::OlderThanXYears => {
            let x = count_operand(cond, values, 1)?;
            let cutoff = match cond.operator {
                Op::OlderThanXMinutes => shift_instant(cond, now, TimeDelta::try_minutes(-x))?,
                Op::OlderThanXHours => shift_instant(cond, now, TimeDelta::try_hours(-x))?,
                Op::OlderThanXDays => shift_instant(cond, now, TimeDelta::try_days(-x))?,
                Op::OlderThanXWeeks => shift_instant(cond, now, TimeDelta::try_weeks(-x))?,
                Op::OlderThanXMonths => shift_instant_months(cond, now, -x)?,
                _ => shift_instant_months(cond, now, -scaled(cond, x, 12)?)?,
            };
            cond.derive(Op::LessThan, vec![Value::DateTime(cutoff)])
        }

        Op::ThisFiscalYear | Op::LastFiscalYear | Op::NextFiscalYear => {
            let shift = match cond.operator {
                Op::LastFiscalYear => -1,
                Op::NextFiscalYear => 1,
                _ => 0,
            };
            let year = fiscal.year_of(today).checked_add(shift).ok_or_else(|| out_of_range(cond))?;
            let (first, last) = fiscal_year_bounds(cond, fiscal, year)?;
            days(cond, first, last, ctx)
        }
        Op::ThisFiscalPeriod | Op::LastFiscalPeriod | Op::NextFiscalPeriod => {
            let shift = match cond.operator {
                Op::LastFiscalPeriod => -1,
                Op::NextFiscalPeriod => 1,
                _ => 0,
            };
            let target = offset_period(cond, fiscal, fiscal.period_of(today), shift)?;
            let (first, last) = fiscal_period_bounds(cond, fiscal, target)?;
            days(cond, first, last, ctx)
        }
        Op::LastXFiscalYears | Op::NextXFiscalYears => {
            let x = count_operand(cond, values, 1)?;
            let x = i32::try_from(x).map_err(|_| out_of_range(cond))?;
            let current = fiscal.year_of(today);
            let (from_year, to_year) = if cond.operator == Op::LastXFiscalYears {
                (current.checked_sub(x), current.checked_sub(1))
            } else {
                (current.checked_add(1), current.checked_add(x))
            };
            let from_year = from_year.ok_or_else(|| out_of_range(cond))?;
            let to_year = to_year.ok_or_else(|| out_of_range(cond))?;
            let first = fiscal_year_bounds(cond, fiscal, from_year)?.0;
            let last = fiscal_year_bounds(cond, fiscal, to_year)?.1;
            days(cond, first, last, ctx)
        }
        Op::LastXFiscalPeriods | Op::NextXFiscalPeriods => {
            let x = count_operand(cond, values, 1)?;
            let current = fiscal.period_of(today);
            let (first_shift, last_shift) = if cond.operator == Op::LastXFiscalPeriods {
                (-x, -1)
            } else {
                (1, x)
            };
            let first = offset_period(cond, fiscal, current, first_shift)?;
            let last = offset_period(cond, fiscal, current, last_shift)?;
            days(
                cond,
                fiscal_period_bounds(cond, fiscal, first)?.0,
                fiscal_period_bounds(cond, fiscal, last)?.1,
                ctx,
            )
        }
        Op::InFiscalYear => {
            let year = fiscal_year(cond, values.first())?;
            let (first, last) = fiscal_year_bounds(cond, fiscal, year)?;
            days(cond, first, last, ctx)
        }
        Op::InFiscalPeriod => {
            let period = fiscal_period(cond, values.first())?;
            let (first, last) = fiscal_period_bounds(cond, fiscal, (fiscal.year_of(today), period))?;
            days(cond, first, last, ctx)
        }
        Op::InFiscalPeriodAndYear
        | Op::InOrBeforeFiscalPeriodAndYear
        | Op::InOrAfterFiscalPeriodAndYear => {
            let period = fiscal_period(cond, values.first())?;
            let year = fiscal_year(cond, values.get(1))?;
            let (first, last) = fiscal_period_bounds(cond, fiscal, (year, period))?;
            let from = start_of_day(first, ctx.offset);
            let to = end_of_day(last, ctx.offset);
            match cond.operator {
                Op::InOrBeforeFiscalPeriodAndYear => between(cond, DateTime::<Utc>::MIN_UTC, to),
                Op::InOrAfterFiscalPeriodAndYear => between(cond, from, DateTime::<Utc>::MAX_UTC),
                _ => between(cond, from, to),
            }
        }

        _ => return Ok(None),
    };
    Ok(Some(derived))
}

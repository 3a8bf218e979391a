//! Date/time functions
//!
//! Dates are `DateTime` values and times of day are `Duration`s, so
//! `DATE(...) + TIME(...)` yields a point in time and the difference of two
//! dates is a duration.

use super::Arguments;
use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

fn to_i32(function: &'static str, n: i64) -> EvalResult<Value> {
    i32::try_from(n)
        .map(Value::Int32)
        .map_err(|_| EvalError::Overflow(function))
}

/// DATE(year, month, day)
pub fn fn_date(args: &Arguments<'_>) -> EvalResult<Value> {
    let year = args.i32(0)?;
    let month = args.i32(1)?;
    let day = args.i32(2)?;

    u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Value::DateTime)
        .ok_or_else(|| args.invalid(format!("{year}-{month}-{day} is not a valid date")))
}

/// TIME(hour, minute, second)
pub fn fn_time(args: &Arguments<'_>) -> EvalResult<Value> {
    let hours = i64::from(args.i32(0)?);
    let minutes = i64::from(args.i32(1)?);
    let seconds = i64::from(args.i32(2)?);
    Ok(Value::Duration(Duration::seconds(
        hours * 3_600 + minutes * 60 + seconds,
    )))
}

/// YEAR(date)
pub fn fn_year(args: &Arguments<'_>) -> EvalResult<Value> {
    Ok(Value::Int32(args.date_time(0)?.year()))
}

/// MONTH(date)
pub fn fn_month(args: &Arguments<'_>) -> EvalResult<Value> {
    Ok(Value::Int32(args.date_time(0)?.month() as i32))
}

/// DAY(date)
pub fn fn_day(args: &Arguments<'_>) -> EvalResult<Value> {
    Ok(Value::Int32(args.date_time(0)?.day() as i32))
}

/// Time-of-day component of a date, or the matching component of a duration
///
/// Duration components keep the duration's sign: the hour of `-03:03:03` is -3.
fn time_part(
    args: &Arguments<'_>,
    of_date: fn(&NaiveDateTime) -> u32,
    of_duration: fn(&Duration) -> i64,
) -> EvalResult<Value> {
    match args.value(0)? {
        Value::DateTime(t) => Ok(Value::Int32(of_date(&t) as i32)),
        Value::Duration(d) => Ok(Value::Int32(of_duration(&d) as i32)),
        other => Err(args.type_error(0, "a date or duration", other.kind())),
    }
}

/// HOUR(date_or_duration)
pub fn fn_hour(args: &Arguments<'_>) -> EvalResult<Value> {
    time_part(args, |t| t.hour(), |d| d.num_hours() % 24)
}

/// MINUTE(date_or_duration)
pub fn fn_minute(args: &Arguments<'_>) -> EvalResult<Value> {
    time_part(args, |t| t.minute(), |d| d.num_minutes() % 60)
}

/// SECOND(date_or_duration)
pub fn fn_second(args: &Arguments<'_>) -> EvalResult<Value> {
    time_part(args, |t| t.second(), |d| d.num_seconds() % 60)
}

/// WEEKDAY(date), 1 = Sunday through 7 = Saturday
pub fn fn_weekday(args: &Arguments<'_>) -> EvalResult<Value> {
    let t = args.date_time(0)?;
    Ok(Value::Int32(t.weekday().number_from_sunday() as i32))
}

/// Whole months from `start` to `end` (`start <= end`)
fn whole_months(start: &NaiveDateTime, end: &NaiveDateTime) -> i64 {
    let mut months = i64::from(end.year() - start.year()) * 12
        + i64::from(end.month()) - i64::from(start.month());
    let end_in_month = (end.day(), end.time());
    let start_in_month = (start.day(), start.time());
    if end_in_month < start_in_month {
        months -= 1;
    }
    months
}

/// DATEDIF(start_date, end_date, unit) with unit "d", "m" or "y"
pub fn fn_datedif(args: &Arguments<'_>) -> EvalResult<Value> {
    let start = args.date_time(0)?;
    let end = args.date_time(1)?;
    let unit = args.text(2)?;

    if start > end {
        return Err(args.invalid("start date is after end date"));
    }

    match unit.to_ascii_lowercase().as_str() {
        "d" => to_i32("DATEDIF", end.signed_duration_since(start).num_days()),
        "m" => to_i32("DATEDIF", whole_months(&start, &end)),
        "y" => to_i32("DATEDIF", whole_months(&start, &end) / 12),
        _ => Err(args.invalid(format!("unknown unit \"{unit}\", expected \"d\", \"m\" or \"y\""))),
    }
}

/// DAYS(end_date, start_date)
pub fn fn_days(args: &Arguments<'_>) -> EvalResult<Value> {
    let end = args.date_time(0)?;
    let start = args.date_time(1)?;
    to_i32("DAYS", end.date().signed_duration_since(start.date()).num_days())
}

// due.rs
//
// Free-form due-date input from the form ("tomorrow", "fri 15:30", "in 3 days",
// "2030-06-01") resolved against the user's clock.

use chrono::{
    DateTime, Datelike, Duration as Dur, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Timelike, Utc, Weekday,
};

use crate::error::ValidationError;

/// A resolved input, still in the user's local terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Target {
    Day(NaiveDate),
    At(NaiveDateTime),
}

fn invalid(msg: impl Into<String>) -> ValidationError {
    ValidationError::InvalidDate(msg.into())
}

pub fn parse_due_date(input: &str) -> Result<DateTime<Utc>, ValidationError> {
    parse_due_date_at(input, Local::now())
}

/// Same as `parse_due_date`, against an explicit "now".
pub fn parse_due_date_at<Tz: TimeZone>(
    input: &str,
    now: DateTime<Tz>,
) -> Result<DateTime<Utc>, ValidationError> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return Err(ValidationError::MissingDate);
    }
    let local_now = now.naive_local();
    let today = local_now.date();

    let words: Vec<&str> = input.split_whitespace().collect();
    let target = match words.as_slice() {
        ["now"] => Target::At(local_now),

        ["today"] => Target::Day(today),
        ["tomorrow"] | ["tmr"] => Target::Day(add_days(today, 1)?),
        ["yesterday"] => Target::Day(add_days(today, -1)?),

        [day] if is_weekday(day) => Target::Day(add_days(today, days_until_weekday(today, weekday(day)?))?),
        ["next", day] if is_weekday(day) => {
            Target::Day(add_days(today, days_until_next_weekday(today, weekday(day)?))?)
        }
        ["this", day] if is_weekday(day) => {
            Target::Day(add_days(today, days_until_this_week(today, weekday(day)?))?)
        }

        ["week"] | ["next", "week"] => Target::Day(add_days(today, 7)?),
        ["month"] | ["next", "month"] => Target::Day(add_days(today, 30)?),
        ["year"] | ["next", "year"] => Target::Day(add_days(today, 365)?),

        ["in", num, unit] => Target::At(shift(local_now, parse_duration_component(num, unit)?)?),
        ["in", num1, unit1, num2, unit2] => Target::At(shift(
            shift(local_now, parse_duration_component(num1, unit1)?)?,
            parse_duration_component(num2, unit2)?,
        )?),

        [date_str, time_str] if looks_like_date(date_str) && looks_like_time(time_str) => {
            Target::At(NaiveDateTime::new(parse_date(date_str)?, parse_time(time_str)?))
        }
        [day, time] if is_weekday(day) => {
            let date = add_days(today, days_until_weekday(today, weekday(day)?))?;
            Target::At(NaiveDateTime::new(date, parse_time(time)?))
        }
        ["next", day, time] if is_weekday(day) => {
            let date = add_days(today, days_until_next_weekday(today, weekday(day)?))?;
            Target::At(NaiveDateTime::new(date, parse_time(time)?))
        }
        ["this", day, time] if is_weekday(day) => {
            let date = add_days(today, days_until_this_week(today, weekday(day)?))?;
            Target::At(NaiveDateTime::new(date, parse_time(time)?))
        }

        [num, unit] => Target::At(shift(local_now, parse_duration_component(num, unit)?)?),
        [num1, unit1, num2, unit2] => Target::At(shift(
            shift(local_now, parse_duration_component(num1, unit1)?)?,
            parse_duration_component(num2, unit2)?,
        )?),

        [date_or_time] => try_parse_date_or_time(date_or_time, today)?,

        _ => return Err(invalid("Unrecognized due date format")),
    };

    validate_not_past(target, local_now)?;
    to_utc(target, &now.timezone())
}

/// Renders a stored date back into the form's input syntax.
pub fn format_for_input(date: DateTime<Utc>) -> String {
    let local = date.with_timezone(&Local);
    if local.hour() == 0 && local.minute() == 0 {
        local.format("%Y-%m-%d").to_string()
    } else {
        local.format("%Y-%m-%d %H:%M").to_string()
    }
}

fn to_utc<Tz: TimeZone>(target: Target, tz: &Tz) -> Result<DateTime<Utc>, ValidationError> {
    let naive = match target {
        Target::Day(d) => d.and_time(NaiveTime::MIN),
        Target::At(dt) => dt,
    };
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| invalid("Failed to convert due date to local time"))
}

fn validate_not_past(target: Target, now: NaiveDateTime) -> Result<(), ValidationError> {
    let past = match target {
        Target::Day(d) => d < now.date(),
        // Minute precision, so "now" and "HH:MM" for the current minute still pass.
        Target::At(dt) => dt < now.with_second(0).and_then(|n| n.with_nanosecond(0)).unwrap_or(now),
    };
    if past { Err(ValidationError::PastDate) } else { Ok(()) }
}

fn is_weekday(s: &str) -> bool {
    parse_weekday_name(s).is_some()
}

fn weekday(s: &str) -> Result<Weekday, ValidationError> {
    parse_weekday_name(s).ok_or_else(|| invalid("Invalid weekday"))
}

fn parse_weekday_name(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn weekday_delta(from: NaiveDate, target: Weekday) -> i64 {
    (target.num_days_from_monday() as i64) - (from.weekday().num_days_from_monday() as i64)
}

/// Next occurrence strictly after today.
fn days_until_weekday(from: NaiveDate, target: Weekday) -> i64 {
    let days = weekday_delta(from, target);
    if days <= 0 { days + 7 } else { days }
}

/// Always the occurrence in the following week.
fn days_until_next_weekday(from: NaiveDate, target: Weekday) -> i64 {
    weekday_delta(from, target) + 7
}

/// This week's occurrence, or today if it already passed.
fn days_until_this_week(from: NaiveDate, target: Weekday) -> i64 {
    weekday_delta(from, target).max(0)
}

fn out_of_range() -> ValidationError {
    invalid("Due date out of range")
}

fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate, ValidationError> {
    Dur::try_days(days)
        .and_then(|d| date.checked_add_signed(d))
        .ok_or_else(out_of_range)
}

fn shift(at: NaiveDateTime, by: Dur) -> Result<NaiveDateTime, ValidationError> {
    at.checked_add_signed(by).ok_or_else(out_of_range)
}

fn parse_duration_component(num_str: &str, unit: &str) -> Result<Dur, ValidationError> {
    let num: i64 = num_str.parse().map_err(|_| invalid("Invalid number"))?;

    if num < 0 {
        return Err(invalid("Duration cannot be negative"));
    }

    let dur = match unit {
        "second" | "seconds" | "sec" | "s" => Dur::try_seconds(num),
        "minute" | "minutes" | "min" | "m" => Dur::try_minutes(num),
        "hour" | "hours" | "hr" | "h" => Dur::try_hours(num),
        "day" | "days" | "d" => Dur::try_days(num),
        "week" | "weeks" | "w" => num.checked_mul(7).and_then(Dur::try_days),
        "month" | "months" => num.checked_mul(30).and_then(Dur::try_days),
        "year" | "years" => num.checked_mul(365).and_then(Dur::try_days),
        _ => return Err(invalid(format!("Unsupported time unit '{}'", unit))),
    };
    dur.ok_or_else(out_of_range)
}

fn try_parse_date_or_time(input: &str, today: NaiveDate) -> Result<Target, ValidationError> {
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(Target::Day(date));
    }

    // MM-DD in the current year
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-{}", today.year(), input), "%Y-%m-%d") {
        return Ok(Target::Day(date));
    }

    if let Ok(time) = NaiveTime::parse_from_str(input, "%H:%M") {
        return Ok(Target::At(NaiveDateTime::new(today, time)));
    }

    if input.ends_with("am") || input.ends_with("pm") {
        let is_pm = input.ends_with("pm");
        let time_part = input.trim_end_matches("am").trim_end_matches("pm").trim();

        if let Ok(mut time) = NaiveTime::parse_from_str(time_part, "%H:%M") {
            if is_pm && time.hour() < 12 {
                time += Dur::hours(12);
            } else if !is_pm && time.hour() == 12 {
                time -= Dur::hours(12);
            }
            return Ok(Target::At(NaiveDateTime::new(today, time)));
        }
    }

    Err(invalid("Invalid date or time format"))
}

fn looks_like_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn looks_like_time(s: &str) -> bool {
    NaiveTime::parse_from_str(s, "%H:%M").is_ok()
}

fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid("Invalid date format. Use YYYY-MM-DD"))
}

fn parse_time(s: &str) -> Result<NaiveTime, ValidationError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| invalid("Invalid time format. Use HH:MM"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wednesday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 2, 9, 15, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }

    #[test]
    fn relative_days_resolve_to_midnight() {
        assert_eq!(parse_due_date_at("today", now()), Ok(at(2030, 1, 2, 0, 0)));
        assert_eq!(parse_due_date_at("Tomorrow", now()), Ok(at(2030, 1, 3, 0, 0)));
        assert_eq!(parse_due_date_at("next week", now()), Ok(at(2030, 1, 9, 0, 0)));
    }

    #[test]
    fn weekdays() {
        assert_eq!(parse_due_date_at("fri", now()), Ok(at(2030, 1, 4, 0, 0)));
        assert_eq!(parse_due_date_at("wed", now()), Ok(at(2030, 1, 9, 0, 0)));
        assert_eq!(parse_due_date_at("next fri", now()), Ok(at(2030, 1, 11, 0, 0)));
        assert_eq!(parse_due_date_at("this mon", now()), Ok(at(2030, 1, 2, 0, 0)));
        assert_eq!(parse_due_date_at("friday 15:30", now()), Ok(at(2030, 1, 4, 15, 30)));
    }

    #[test]
    fn offsets_and_explicit_dates() {
        assert_eq!(parse_due_date_at("in 2 hours", now()), Ok(at(2030, 1, 2, 11, 15)));
        assert_eq!(parse_due_date_at("1 day 3 hours", now()), Ok(at(2030, 1, 3, 12, 15)));
        assert_eq!(parse_due_date_at("2030-06-01", now()), Ok(at(2030, 6, 1, 0, 0)));
        assert_eq!(parse_due_date_at("2030-06-01 08:30", now()), Ok(at(2030, 6, 1, 8, 30)));
        assert_eq!(parse_due_date_at("06-01", now()), Ok(at(2030, 6, 1, 0, 0)));
        assert_eq!(parse_due_date_at("5:30pm", now()), Ok(at(2030, 1, 2, 17, 30)));
    }

    #[test]
    fn rejects_past_and_garbage() {
        assert_eq!(parse_due_date_at("yesterday", now()), Err(ValidationError::PastDate));
        assert_eq!(parse_due_date_at("2029-12-31", now()), Err(ValidationError::PastDate));
        assert_eq!(parse_due_date_at("08:00", now()), Err(ValidationError::PastDate));
        assert_eq!(parse_due_date_at("", now()), Err(ValidationError::MissingDate));
        assert!(matches!(
            parse_due_date_at("whenever", now()),
            Err(ValidationError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_due_date_at("in 3 fortnights", now()),
            Err(ValidationError::InvalidDate(_))
        ));
    }

    #[test]
    fn huge_offsets_are_rejected_not_panicking() {
        let out_of_range = Err(ValidationError::InvalidDate("Due date out of range".into()));
        assert_eq!(parse_due_date_at("in 1000000 years", now()), out_of_range);
        assert_eq!(parse_due_date_at("in 9223372036854775807 weeks", now()), out_of_range);
        assert_eq!(parse_due_date_at("200000000000 days", now()), out_of_range);
        assert_eq!(parse_due_date_at("in 1 day 1000000 years", now()), out_of_range);
        assert_eq!(parse_due_date_at("in 9223372036854775807 seconds", now()), out_of_range);
    }

    #[test]
    fn now_is_not_in_the_past() {
        assert!(parse_due_date_at("now", now()).is_ok());
    }
}

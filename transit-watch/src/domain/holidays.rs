//! Dutch public holidays.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Easter Sunday for a given year (Gregorian calendar).
///
/// Uses the anonymous Gregorian algorithm (Meeus/Jones/Butcher).
/// Returns `None` only for years chrono cannot represent.
///
/// # Examples
///
/// ```
/// use transit_watch::domain::easter_sunday;
/// use chrono::NaiveDate;
///
/// assert_eq!(easter_sunday(2024), NaiveDate::from_ymd_opt(2024, 3, 31));
/// assert_eq!(easter_sunday(2025), NaiveDate::from_ymd_opt(2025, 4, 20));
/// ```
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Dutch public holidays in a given year.
///
/// Fixed dates (New Year, King's Day, Christmas) plus the Easter-based
/// ones (Good Friday, Easter Sunday and Monday, Ascension, Whit Monday).
pub fn dutch_holidays(year: i32) -> Vec<NaiveDate> {
    let mut holidays: Vec<NaiveDate> = [(1, 1), (12, 25), (12, 26)]
        .into_iter()
        .filter_map(|(month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .collect();

    holidays.extend(kings_day(year));

    if let Some(easter) = easter_sunday(year) {
        holidays.extend(
            [-2, 0, 1, 39, 50]
                .into_iter()
                .map(|offset| easter + Duration::days(offset)),
        );
    }

    holidays.sort();
    holidays
}

/// King's Day: 27 April, or the 26th when the 27th is a Sunday.
fn kings_day(year: i32) -> Option<NaiveDate> {
    let date = NaiveDate::from_ymd_opt(year, 4, 27)?;
    if date.weekday() == Weekday::Sun {
        date.pred_opt()
    } else {
        Some(date)
    }
}

/// Returns true if `date` is a Dutch public holiday.
pub fn is_dutch_holiday(date: NaiveDate) -> bool {
    dutch_holidays(date.year()).contains(&date)
}

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};

use super::log;

const YEAR_RE: &str = r"(1[4-9]\d\d|20\d\d)";
const MONTH_RE: &str = r"(\d|0\d|1[0-2])";
const DAY_RE: &str = r"([0-2]\d|3[01]|\d)";
const DAY_FIRST_DAY_RE: &str = r"(\d|[0-2]\d|3[01])";

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

static TAGGED_DATE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"\[Date\s+"(\d+[.-]\d+[.-]\d+)"\]"#).expect("valid tagged date regex")
});

static YEAR_FIRST_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(&format!(r"(?:^|\s){YEAR_RE}[.-]{MONTH_RE}[.-]{DAY_RE}"))
        .expect("valid year-first date regex")
});

static DAY_FIRST_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(&format!(
        r"(?:^|\s){DAY_FIRST_DAY_RE}[.-]{MONTH_RE}[.-]{YEAR_RE}"
    ))
    .expect("valid day-first date regex")
});

static MONTH_NAME_FIRST_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(&format!(
        r"(?:^|\s)(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sept|Oct|Nov|Dec)[.-]{DAY_RE}[.-]{YEAR_RE}"
    ))
    .expect("valid month-name date regex")
});

/// Month numbers as the source data has always been read. `Jun` shares 5 with
/// `May` and `Jul`/`Aug` sit one below their calendar month.
const MONTH_ABBREVIATIONS: [(&str, u32); 12] = [
    ("Jan", 1),
    ("Feb", 2),
    ("Mar", 3),
    ("Apr", 4),
    ("May", 5),
    ("Jun", 5),
    ("Jul", 6),
    ("Aug", 7),
    ("Sept", 9),
    ("Oct", 10),
    ("Nov", 11),
    ("Dec", 12),
];

/// Finds the first date in `span` as `YYYY-MM-DD`.
///
/// Year-first is tried before day-first, which is tried before month-name-first;
/// within a format the first match wins. A `[Date "..."]` tag pair anywhere in
/// the span narrows the search to that tag's value.
pub fn extract_date(id: &str, span: &str) -> Option<String> {
    let narrowed;
    let span = match TAGGED_DATE_RE.captures(span) {
        Some(caps) => {
            narrowed = caps[1].to_string();
            narrowed.as_str()
        }
        None => span,
    };

    let date = year_first(span)
        .or_else(|| day_first(span))
        .or_else(|| month_name_first(span));
    if let Some(date) = &date {
        log::debug(format!("{id}: date {date}"));
    }
    date
}

fn year_first(span: &str) -> Option<String> {
    let caps = YEAR_FIRST_RE.captures(span)?;
    Some(iso_date(&caps[1], &caps[2], &caps[3]))
}

fn day_first(span: &str) -> Option<String> {
    let caps = DAY_FIRST_RE.captures(span)?;
    Some(iso_date(&caps[3], &caps[2], &caps[1]))
}

fn month_name_first(span: &str) -> Option<String> {
    let caps = MONTH_NAME_FIRST_RE.captures(span)?;
    let month = MONTH_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == &caps[1])
        .map(|(_, number)| number.to_string())?;
    Some(iso_date(&caps[3], &month, &caps[2]))
}

fn iso_date(year: &str, month: &str, day: &str) -> String {
    format!("{year}-{month:0>2}-{day:0>2}")
}

/// Converts an extracted ISO date to a calendar date, clamping a day past the
/// end of its month to that month's last day.
pub fn to_naive_date(iso: &str) -> Result<NaiveDate, String> {
    let mut parts = iso.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("Conversion error: date='{iso}'"));
    };

    let year = year
        .parse::<i32>()
        .map_err(|e| format!("Conversion error: date='{iso}' ({e})"))?;
    let month = month
        .parse::<u32>()
        .map_err(|e| format!("Conversion error: date='{iso}' ({e})"))?;
    let day = day
        .parse::<u32>()
        .map_err(|e| format!("Conversion error: date='{iso}' ({e})"))?;

    if day == 0 {
        return Err(format!("Conversion error: date='{iso}' (day out of range)"));
    }

    let Some(last_day) = last_day_of_month(year, month) else {
        return Err(format!(
            "Conversion error: date='{iso}' (input is out of range)"
        ));
    };

    NaiveDate::from_ymd_opt(year, month, day.min(last_day))
        .ok_or_else(|| format!("Conversion error: date='{iso}' (input is out of range)"))
}

/// Day number of `date` counted from 1970-01-01, as DuckDB stores `DATE`.
pub fn days_since_unix_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first_day_next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month.checked_add(1)?, 1)?
    };

    first_day_next_month.pred_opt().map(|d| d.day())
}

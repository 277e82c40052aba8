use crate::grid::CellValue;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};

/// Maps Eastern Arabic-Indic digits (٠-٩) to ASCII 0-9. Every other
/// character passes through unchanged.
pub fn normalize_digits(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '٠'..='٩' => {
                let offset = c as u32 - '٠' as u32;
                char::from_digit(offset, 10).unwrap_or(c)
            }
            other => other,
        })
        .collect()
}

/// Coerces a cell into a signed amount.
///
/// Returns `None` for an empty or unparseable cell, distinct from a parsed
/// zero, so callers choose whether to default. Strings may carry
/// Arabic-Indic digits, Eastern Arabic separators (٬/٫), thousands commas,
/// wrapping parentheses (negative), and stray whitespace.
pub fn parse_amount(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) => {
            if n.is_nan() {
                None
            } else {
                Some(*n)
            }
        }
        CellValue::Text(s) => parse_amount_text(s),
        CellValue::Empty | CellValue::Date(_) => None,
    }
}

fn parse_amount_text(raw: &str) -> Option<f64> {
    let normalized = normalize_digits(raw).replace('٬', ",").replace('٫', ".");
    let trimmed = normalized.trim();

    let (body, sign) = match trimmed
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (inner, -1.0),
        None => (trimmed, 1.0),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().map(|n| n * sign)
}

/// Coerces a cell into a canonical calendar date.
///
/// Numbers are Excel date serials (see [`excel_serial_to_date`]). Strings
/// accept exactly `D[-/]M[-/]YYYY` or `YYYY[-/]M[-/]D` after digit
/// normalization; no free-text parsing happens here. Native date cells pass
/// through.
pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Number(serial) => excel_serial_to_date(*serial),
        CellValue::Text(s) => parse_date_text(s),
        CellValue::Date(d) => Some(*d),
        CellValue::Empty => None,
    }
}

/// Converts an Excel date serial to a calendar date.
///
/// Serials greater than 60 are decremented once to compensate for the
/// fictitious 1900-02-29 (the 1900 leap-year bug), then added as whole days
/// to 1899-12-31, so modern serials are effectively counted from
/// 1899-12-30. Non-finite or out-of-range serials yield `None`.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let mut days = serial.floor() as i64;
    if days > 60 {
        days -= 1;
    }
    NaiveDate::from_ymd_opt(1899, 12, 31)?.checked_add_signed(Duration::try_days(days)?)
}

fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let normalized = normalize_digits(raw);
    let trimmed = normalized.trim();

    let parts: Vec<&str> = trimmed.split(['/', '-']).collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }

    let (year, month, day) = if parts[0].len() == 4 && parts[1].len() <= 2 && parts[2].len() <= 2 {
        (parts[0], parts[1], parts[2])
    } else if parts[2].len() == 4 && parts[0].len() <= 2 && parts[1].len() <= 2 {
        (parts[2], parts[1], parts[0])
    } else {
        return None;
    };

    NaiveDate::from_ymd_opt(
        year.parse().ok()?,
        month.parse().ok()?,
        day.parse().ok()?,
    )
}

/// Lenient free-text date parse, used only as the last structured fallback
/// when interpreting receivables month cells.
pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }

    const DATE_FORMATS: [&str; 3] = ["%B %d, %Y", "%d %B %Y", "%b %d, %Y"];
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(d);
        }
    }

    None
}

/// Canonical "YYYY-MM-DD" form used for all date equality comparisons.
pub fn format_canonical(date: NaiveDate) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month(),
        date.day()
    )
}

/// "YYYY-MM-DD" → "DD/MM/YYYY" for display. Anything else passes through.
pub fn format_for_display(canonical: &str) -> String {
    let parts: Vec<&str> = canonical.split('-').collect();
    if parts.len() == 3 {
        format!("{}/{}/{}", parts[2], parts[1], parts[0])
    } else {
        canonical.to_string()
    }
}

/// Arabic-locale amount rendering: Arabic-Indic digits, ٬ thousands groups,
/// ٫ decimal point, at most two fraction digits with no trailing zeros.
/// Absent or non-finite values render as zero.
pub fn format_amount(value: Option<f64>) -> String {
    let safe = value.filter(|v| v.is_finite()).unwrap_or(0.0);
    let negative = safe < 0.0;
    let total_cents = (safe.abs() * 100.0).round() as u64;
    let int_part = total_cents / 100;
    let cents = total_cents % 100;

    let mut out = String::new();
    if negative {
        out.push('-');
    }

    let digits = int_part.to_string();
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('٬');
        }
        out.push(to_arabic_digit(c));
    }

    if cents > 0 {
        out.push('٫');
        let fraction = if cents % 10 == 0 {
            (cents / 10).to_string()
        } else {
            format!("{:02}", cents)
        };
        for c in fraction.chars() {
            out.push(to_arabic_digit(c));
        }
    }

    out
}

fn to_arabic_digit(c: char) -> char {
    match c.to_digit(10) {
        Some(d) => char::from_u32('٠' as u32 + d).unwrap_or(c),
        None => c,
    }
}

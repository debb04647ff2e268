// src/services/format.rs

//! Human readable formatting of records.

use crate::models::{NotamRecord, NotamType, PreviousNotam};
use crate::services::SubjectDecoder;

/// Marker used when identifier parts are absent.
pub const NOT_SPECIFIED: &str = "not specified";

/// Format an id such as `A0123/24`.
pub fn format_id(series: Option<&str>, number: Option<u32>, year: Option<i32>) -> String {
    match (series, number, year) {
        (Some(series), Some(number), Some(year)) if !series.is_empty() => {
            format!("{}{:04}/{:02}", series, number, year.rem_euclid(100))
        }
        _ => NOT_SPECIFIED.to_string(),
    }
}

/// Id of the record itself.
pub fn notam_id(notam: &NotamRecord) -> String {
    format_id(notam.series.as_deref(), notam.number, notam.year)
}

fn previous_id(previous: Option<&PreviousNotam>) -> String {
    match previous {
        Some(p) => format_id(p.series.as_deref(), p.number, p.year),
        None => NOT_SPECIFIED.to_string(),
    }
}

/// "A0002/24 replaces A0001/24", "Cancels A0001/24" or just the id.
pub fn header(notam: &NotamRecord) -> String {
    let id = notam_id(notam);
    match notam.notam_type {
        Some(NotamType::Replace) => format!(
            "{} replaces {}",
            id,
            previous_id(notam.previous_notam.as_ref())
        ),
        Some(NotamType::Cancel) => format!("Cancels {}", id),
        _ => id,
    }
}

/// Location indicators plus the FIR unless it is one of them.
pub fn locations(notam: &NotamRecord) -> String {
    let label = if notam.location_indicators.len() > 1 {
        "Locations"
    } else {
        "Location"
    };
    let list = notam.location_indicators.join(", ");

    if notam.location_indicators.contains(&notam.fir) {
        format!("{label}: {list} (FIR)")
    } else {
        format!("{label}: {list}    FIR: {}", notam.fir)
    }
}

/// Items F/G when present, otherwise the item Q band.
pub fn vertical_limits(notam: &NotamRecord) -> String {
    if let (Some(lower), Some(upper)) = (&notam.lower_limit, &notam.upper_limit) {
        return format!("From {lower} to {upper}");
    }
    if !notam.has_specific_height() {
        return "No vertical limits specified".to_string();
    }
    format!(
        "From FL{:03} to FL{:03}",
        notam.q_lower.unwrap_or(0),
        notam.q_upper.unwrap_or(999)
    )
}

/// Validity window in UTC.
pub fn validity(notam: &NotamRecord) -> String {
    if notam.is_permanent {
        return "Permanent".to_string();
    }

    let stamp = |parsed: Option<chrono::DateTime<chrono::Utc>>, raw: Option<&str>| match parsed {
        Some(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => raw.unwrap_or(NOT_SPECIFIED).to_string(),
    };

    let mut text = format!(
        "From {} to {}",
        stamp(notam.valid_from(), notam.from.as_deref()),
        stamp(notam.valid_to(), notam.to.as_deref())
    );
    if notam.is_estimation {
        text.push_str(" (estimation)");
    }
    text
}

/// Degrees, minutes and seconds with hemisphere letter.
pub fn decimal_to_dms(decimal: f64, is_latitude: bool) -> String {
    let absolute = decimal.abs();
    let mut degrees = absolute.floor() as i64;
    let minutes_raw = (absolute - degrees as f64) * 60.0;
    let mut minutes = minutes_raw.floor() as i64;
    if minutes == 60 {
        minutes = 0;
        degrees += 1;
    }
    let mut seconds = ((minutes_raw - minutes as f64) * 60.0 * 100.0).round() / 100.0;
    if seconds >= 60.0 {
        seconds = 0.0;
        minutes += 1;
    }

    let direction = match (is_latitude, decimal >= 0.0) {
        (true, true) => 'N',
        (true, false) => 'S',
        (false, true) => 'E',
        (false, false) => 'W',
    };

    format!("{degrees}\u{00BA} {minutes}\u{2032} {seconds}\u{2033} {direction}")
}

/// Latitude and longitude in DMS.
pub fn coordinates(latitude: f64, longitude: f64) -> String {
    format!(
        "{} {}",
        decimal_to_dms(latitude, true),
        decimal_to_dms(longitude, false)
    )
}

/// Multi-line summary of a record as shown in the detail view.
pub fn describe(notam: &NotamRecord, decoder: &SubjectDecoder) -> String {
    let traffic = notam
        .traffic
        .iter()
        .map(|t| format!("{t:?}").to_uppercase())
        .collect::<Vec<_>>()
        .join(", ");

    let mut lines = vec![
        decoder.decode(&notam.notam_code),
        header(notam),
        locations(notam),
        format!("Validity: {}", validity(notam)),
        format!("Affected traffic: {traffic}"),
        format!("Vertical limits: {}", vertical_limits(notam)),
    ];
    if let (Some(lat), Some(lon)) = (notam.latitude, notam.longitude) {
        lines.push(format!("Position: {}", coordinates(lat, lon)));
    }
    if !notam.notam_text.is_empty() {
        lines.push(notam.notam_text.clone());
    }
    lines.join("\n")
}

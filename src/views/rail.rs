use chrono::{Days, Duration, NaiveDate, NaiveDateTime};

use crate::models::rail::{DelayTable, Journey, LineIndex, RailStation, TimetableEntry};

/// Departures further in the past than this are hidden on the current day.
pub const VISIBILITY_WINDOW_MINUTES: i64 = 60;

/// Picker options for one endpoint.
///
/// Stations whose address contains `city`; once the other endpoint
/// (`counterpart`) is chosen, only stations sharing a line with it and not
/// equal to it. Sorted by station id. An empty `city` yields nothing.
pub fn station_options<'a>(
    stations: &'a [RailStation],
    lines: &LineIndex,
    city: &str,
    counterpart: Option<&str>,
) -> Vec<&'a RailStation> {
    if city.is_empty() {
        return Vec::new();
    }
    let mut options: Vec<&RailStation> = stations
        .iter()
        .filter(|s| s.address.contains(city))
        .filter(|s| match counterpart {
            Some(other) => s.id != other && lines.connected(&s.id, other),
            None => true,
        })
        .collect();
    options.sort_by(|a, b| a.id.cmp(&b.id));
    options
}

/// Rows for trains calling at both `origin` and `dest`, by origin departure.
/// Rows without a departure time sort last.
pub fn journeys(entries: &[TimetableEntry], origin: &str, dest: &str) -> Vec<Journey> {
    let mut rows: Vec<Journey> = entries
        .iter()
        .filter_map(|entry| {
            let from = entry.stop_at(origin)?;
            let to = entry.stop_at(dest)?;
            Some(Journey {
                train_no: entry.train_no.clone(),
                train_type: entry.train_type.clone(),
                class: entry.class,
                departure: from.departure,
                arrival: to.arrival,
            })
        })
        .collect();
    rows.sort_by_key(|j| (j.departure.is_none(), j.departure));
    rows
}

/// Scheduled departure on `date` plus the train's live delay.
pub fn effective_departure(
    journey: &Journey,
    date: NaiveDate,
    delays: &DelayTable,
) -> Option<NaiveDateTime> {
    journey
        .departure
        .map(|dep| date.and_time(dep) + delays.delay(&journey.train_no))
}

/// Rows without a departure time are never shown. Any date other than today
/// shows every other row. Today, a row is shown while its effective departure
/// is strictly less than [`VISIBILITY_WINDOW_MINUTES`] in the past: a train
/// whose effective departure was exactly 60 minutes ago is hidden.
pub fn is_visible(journey: &Journey, date: NaiveDate, delays: &DelayTable, now: NaiveDateTime) -> bool {
    let Some(effective) = effective_departure(journey, date, delays) else {
        return false;
    };
    date != now.date() || now - effective < Duration::minutes(VISIBILITY_WINDOW_MINUTES)
}

pub fn visible_journeys<'a>(
    journeys: &'a [Journey],
    date: NaiveDate,
    delays: &DelayTable,
    now: NaiveDateTime,
) -> Vec<&'a Journey> {
    journeys
        .iter()
        .filter(|j| is_visible(j, date, delays, now))
        .collect()
}

/// The row with the smallest strictly positive time to effective departure.
/// Only meaningful today; other dates give `None`. Ties keep the earlier row.
pub fn nearest_departure<'a>(
    candidates: &[&'a Journey],
    date: NaiveDate,
    delays: &DelayTable,
    now: NaiveDateTime,
) -> Option<&'a Journey> {
    if date != now.date() {
        return None;
    }
    let mut best: Option<(&Journey, Duration)> = None;
    for journey in candidates.iter().copied() {
        let Some(effective) = effective_departure(journey, date, delays) else {
            continue;
        };
        let wait = effective - now;
        if wait <= Duration::zero() {
            continue;
        }
        if best.is_none_or(|(_, shortest)| wait < shortest) {
            best = Some((journey, wait));
        }
    }
    best.map(|(journey, _)| journey)
}

/// Earliest date offered by the date picker.
pub fn earliest_selectable_date(today: NaiveDate) -> NaiveDate {
    today.checked_sub_days(Days::new(1)).unwrap_or(today)
}

use chrono::NaiveTime;

use crate::models::rail::{
    DelayTable, LineIndex, RailStation, StopTime, TimetableEntry, TrainClass,
};
use crate::services::payload::{
    RailStationPayload, StationOfLinePayload, TrainDelayPayload, TrainTimetablePayload,
};

pub fn stations(payloads: Vec<RailStationPayload>) -> Vec<RailStation> {
    payloads
        .into_iter()
        .map(|p| RailStation {
            id: p.station_id,
            name: p.station_name.into(),
            address: p.station_address.unwrap_or_default(),
            position: p.station_position.map(Into::into),
        })
        .collect()
}

pub fn line_index(payloads: &[StationOfLinePayload]) -> LineIndex {
    let mut index = LineIndex::default();
    for line in payloads {
        for station in &line.stations {
            index.insert(station.station_id.clone(), line.line_id.clone());
        }
    }
    index
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Drops every parenthesised qualifier, ASCII or full-width.
pub fn clean_train_type(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for c in raw.chars() {
        match c {
            '(' | '（' => depth += 1,
            ')' | '）' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

pub fn timetable(payloads: Vec<TrainTimetablePayload>) -> Vec<TimetableEntry> {
    payloads
        .into_iter()
        .map(|p| {
            let train_type =
                clean_train_type(p.train_info.train_type_name.zh_tw.as_deref().unwrap_or(""));
            TimetableEntry {
                train_no: p.train_info.train_no,
                class: TrainClass::classify(&train_type),
                train_type,
                stop_times: p
                    .stop_times
                    .into_iter()
                    .map(|s| StopTime {
                        station_id: s.station_id,
                        arrival: s.arrival_time.as_deref().and_then(parse_time),
                        departure: s.departure_time.as_deref().and_then(parse_time),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Missing delay values normalize to zero.
pub fn delays(payloads: Vec<TrainDelayPayload>) -> DelayTable {
    let mut table = DelayTable::default();
    for p in payloads {
        table.insert(p.train_no, p.delay_time.unwrap_or(0));
    }
    table
}

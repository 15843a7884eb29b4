use std::collections::{BTreeSet, HashMap};

use chrono::{Duration, NaiveTime};
use serde::Serialize;

use super::{GeoPoint, LocalizedName};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RailStation {
    pub id: String,
    pub name: LocalizedName,
    pub address: String,
    pub position: Option<GeoPoint>,
}

/// Line membership of every station.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    by_station: HashMap<String, BTreeSet<String>>,
}

impl LineIndex {
    pub fn insert(&mut self, station_id: impl Into<String>, line_id: impl Into<String>) {
        self.by_station
            .entry(station_id.into())
            .or_default()
            .insert(line_id.into());
    }

    pub fn lines_of(&self, station_id: &str) -> Option<&BTreeSet<String>> {
        self.by_station.get(station_id)
    }

    /// Two stations are connected when they share at least one line.
    pub fn connected(&self, a: &str, b: &str) -> bool {
        match (self.lines_of(a), self.lines_of(b)) {
            (Some(a), Some(b)) => !a.is_disjoint(b),
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_station.is_empty()
    }
}

/// Coarse service class derived from the train type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrainClass {
    Local,
    ChuKuang,
    Express,
    Other,
}

impl TrainClass {
    pub fn classify(type_name: &str) -> Self {
        if type_name.contains("區間") {
            TrainClass::Local
        } else if type_name.contains("莒光") {
            TrainClass::ChuKuang
        } else if type_name.contains("自強") || type_name.contains("普悠瑪") {
            TrainClass::Express
        } else {
            TrainClass::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopTime {
    pub station_id: String,
    pub arrival: Option<NaiveTime>,
    pub departure: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimetableEntry {
    pub train_no: String,
    /// Type name with parenthesised qualifiers removed.
    pub train_type: String,
    pub class: TrainClass,
    pub stop_times: Vec<StopTime>,
}

impl TimetableEntry {
    pub fn stop_at(&self, station_id: &str) -> Option<&StopTime> {
        self.stop_times.iter().find(|s| s.station_id == station_id)
    }
}

/// Live delay minutes keyed by train number. A train without an entry is on
/// time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelayTable {
    minutes: HashMap<String, i64>,
}

impl DelayTable {
    pub fn insert(&mut self, train_no: impl Into<String>, delay_minutes: i64) {
        self.minutes.insert(train_no.into(), delay_minutes);
    }

    pub fn delay_minutes(&self, train_no: &str) -> i64 {
        self.minutes.get(train_no).copied().unwrap_or(0)
    }

    pub fn delay(&self, train_no: &str) -> Duration {
        Duration::minutes(self.delay_minutes(train_no))
    }

    pub fn len(&self) -> usize {
        self.minutes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minutes.is_empty()
    }
}

/// A timetable row for one origin/destination pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Journey {
    pub train_no: String,
    pub train_type: String,
    pub class: TrainClass,
    pub departure: Option<NaiveTime>,
    pub arrival: Option<NaiveTime>,
}

impl Journey {
    /// Arrival minus departure, wrapped past midnight.
    pub fn travel_time(&self) -> Option<Duration> {
        let (dep, arr) = (self.departure?, self.arrival?);
        let mut diff = arr.signed_duration_since(dep);
        if diff < Duration::zero() {
            diff += Duration::hours(24);
        }
        Some(diff)
    }
}

//! In-memory `TransitApi` for session tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::services::TransitApi;
use crate::services::payload::{
    BikeAvailabilityPayload, BikeStationPayload, BusRoutePayload, EtaPayload,
    RailStationPayload, RealTimeNearStopPayload, StationOfLinePayload, StopOfRoutePayload,
    TrainDelayPayload, TrainTimetablePayload,
};

type Fixtures<T> = Mutex<HashMap<String, Result<Vec<T>>>>;

/// Answers from per-key fixtures; unknown keys answer an empty list.
/// A closed gate on a key holds that key's answers until it is opened.
#[derive(Default)]
pub(crate) struct MockApi {
    bike_stations: Fixtures<BikeStationPayload>,
    bike_availability: Fixtures<BikeAvailabilityPayload>,
    bus_routes: Fixtures<BusRoutePayload>,
    bus_stops: Fixtures<StopOfRoutePayload>,
    bus_etas: Fixtures<EtaPayload>,
    bus_vehicles: Fixtures<RealTimeNearStopPayload>,
    rail_stations: Fixtures<RailStationPayload>,
    rail_lines: Fixtures<StationOfLinePayload>,
    rail_timetables: Fixtures<TrainTimetablePayload>,
    rail_delays: Fixtures<TrainDelayPayload>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
    calls: Mutex<Vec<String>>,
}

fn set<T>(fixtures: &Fixtures<T>, key: &str, value: Result<Vec<T>>) {
    fixtures.lock().unwrap().insert(key.to_string(), value);
}

fn timetable_key(origin: &str, dest: &str, date: NaiveDate) -> String {
    format!("{origin}-{dest}-{date}")
}

const RAIL: &str = "TRA";

impl MockApi {
    pub fn set_bike_stations(&self, city: &str, v: Result<Vec<BikeStationPayload>>) {
        set(&self.bike_stations, city, v);
    }

    pub fn set_bike_availability(&self, city: &str, v: Result<Vec<BikeAvailabilityPayload>>) {
        set(&self.bike_availability, city, v);
    }

    pub fn set_bus_routes(&self, city: &str, v: Result<Vec<BusRoutePayload>>) {
        set(&self.bus_routes, city, v);
    }

    pub fn set_bus_stops(&self, city: &str, v: Result<Vec<StopOfRoutePayload>>) {
        set(&self.bus_stops, city, v);
    }

    pub fn set_bus_etas(&self, city: &str, v: Result<Vec<EtaPayload>>) {
        set(&self.bus_etas, city, v);
    }

    pub fn set_bus_vehicles(&self, city: &str, v: Result<Vec<RealTimeNearStopPayload>>) {
        set(&self.bus_vehicles, city, v);
    }

    pub fn set_rail_stations(&self, v: Result<Vec<RailStationPayload>>) {
        set(&self.rail_stations, RAIL, v);
    }

    pub fn set_rail_lines(&self, v: Result<Vec<StationOfLinePayload>>) {
        set(&self.rail_lines, RAIL, v);
    }

    pub fn set_rail_timetable(
        &self,
        origin: &str,
        dest: &str,
        date: NaiveDate,
        v: Result<Vec<TrainTimetablePayload>>,
    ) {
        set(&self.rail_timetables, &timetable_key(origin, dest, date), v);
    }

    pub fn set_rail_delays(&self, v: Result<Vec<TrainDelayPayload>>) {
        set(&self.rail_delays, RAIL, v);
    }

    /// Holds every answer for `key` until [`MockApi::open`].
    pub fn close(&self, key: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn open(&self, key: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(key) {
            gate.add_permits(1);
        }
    }

    pub fn calls_to(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    async fn answer<T: Clone>(&self, method: &str, fixtures: &Fixtures<T>, key: &str) -> Result<Vec<T>> {
        self.calls.lock().unwrap().push(format!("{method}:{key}"));
        let gate = self.gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await;
        }
        fixtures
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl TransitApi for MockApi {
    async fn bike_stations(&self, city: &str) -> Result<Vec<BikeStationPayload>> {
        self.answer("bike_stations", &self.bike_stations, city).await
    }

    async fn bike_availability(&self, city: &str) -> Result<Vec<BikeAvailabilityPayload>> {
        self.answer("bike_availability", &self.bike_availability, city).await
    }

    async fn bus_routes(&self, city: &str) -> Result<Vec<BusRoutePayload>> {
        self.answer("bus_routes", &self.bus_routes, city).await
    }

    async fn bus_stop_sequences(&self, city: &str) -> Result<Vec<StopOfRoutePayload>> {
        self.answer("bus_stops", &self.bus_stops, city).await
    }

    async fn bus_estimated_arrivals(&self, city: &str) -> Result<Vec<EtaPayload>> {
        self.answer("bus_etas", &self.bus_etas, city).await
    }

    async fn bus_live_vehicles(&self, city: &str) -> Result<Vec<RealTimeNearStopPayload>> {
        self.answer("bus_vehicles", &self.bus_vehicles, city).await
    }

    async fn rail_stations(&self) -> Result<Vec<RailStationPayload>> {
        self.answer("rail_stations", &self.rail_stations, RAIL).await
    }

    async fn rail_station_lines(&self) -> Result<Vec<StationOfLinePayload>> {
        self.answer("rail_lines", &self.rail_lines, RAIL).await
    }

    async fn rail_timetable(
        &self,
        origin: &str,
        dest: &str,
        date: NaiveDate,
    ) -> Result<Vec<TrainTimetablePayload>> {
        let key = timetable_key(origin, dest, date);
        self.answer("rail_timetable", &self.rail_timetables, &key).await
    }

    async fn rail_live_delays(&self) -> Result<Vec<TrainDelayPayload>> {
        self.answer("rail_delays", &self.rail_delays, RAIL).await
    }
}

fn from_json<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

pub(crate) fn bike_station(id: &str, name: &str) -> BikeStationPayload {
    from_json(json!({
        "StationID": id,
        "StationName": {"Zh_tw": name},
        "StationAddress": {"Zh_tw": format!("{name}前")},
        "ServiceType": 2
    }))
}

pub(crate) fn availability(id: &str, rent: u32, ret: u32) -> BikeAvailabilityPayload {
    from_json(json!({
        "StationID": id,
        "AvailableRentBikes": rent,
        "AvailableReturnBikes": ret,
        "UpdateTime": "2026-10-19T10:00:00+08:00"
    }))
}

/// A two-direction route with one operator.
pub(crate) fn bus_route(uid: &str, name: &str, destination: &str) -> BusRoutePayload {
    from_json(json!({
        "RouteUID": uid,
        "RouteName": {"Zh_tw": name},
        "Operators": [{"OperatorID": "100", "OperatorName": {"Zh_tw": "大都會客運"}}],
        "SubRoutes": [
            {"SubRouteUID": format!("{uid}0"), "SubRouteName": {"Zh_tw": name}, "Direction": 0},
            {"SubRouteUID": format!("{uid}0"), "SubRouteName": {"Zh_tw": name}, "Direction": 1}
        ],
        "DepartureStopNameZh": "起站",
        "DestinationStopNameZh": destination
    }))
}

pub(crate) fn stop_sequence(uid: &str, direction: u8, stops: &[&str]) -> StopOfRoutePayload {
    let stops: Vec<Value> = stops
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "StopUID": format!("{uid}-{direction}-{i}"),
                "StopName": {"Zh_tw": name},
                "StopSequence": i + 1
            })
        })
        .collect();
    from_json(json!({
        "RouteUID": uid,
        "SubRouteUID": format!("{uid}0"),
        "Direction": direction,
        "Operators": [{"OperatorID": "100", "OperatorName": {"Zh_tw": "大都會客運"}}],
        "Stops": stops
    }))
}

pub(crate) fn eta(uid: &str, direction: u8, stop_index: usize, seconds: i64) -> EtaPayload {
    from_json(json!({
        "StopUID": format!("{uid}-{direction}-{stop_index}"),
        "RouteUID": uid,
        "Direction": direction,
        "EstimateTime": seconds,
        "StopStatus": 0
    }))
}

pub(crate) fn vehicle(uid: &str, direction: u8, sequence: u32, plate: &str) -> RealTimeNearStopPayload {
    from_json(json!({
        "PlateNumb": plate,
        "RouteUID": uid,
        "Direction": direction,
        "StopSequence": sequence,
        "DutyStatus": 0,
        "BusStatus": 0
    }))
}

pub(crate) fn rail_station(id: &str, name: &str, address: &str) -> RailStationPayload {
    from_json(json!({
        "StationID": id,
        "StationName": {"Zh_tw": name},
        "StationAddress": address
    }))
}

pub(crate) fn rail_line(line: &str, stations: &[&str]) -> StationOfLinePayload {
    let stations: Vec<Value> = stations
        .iter()
        .map(|id| json!({"StationID": id}))
        .collect();
    from_json(json!({"LineID": line, "Stations": stations}))
}

pub(crate) fn train(no: &str, type_name: &str, stops: &[(&str, &str)]) -> TrainTimetablePayload {
    let stop_times: Vec<Value> = stops
        .iter()
        .map(|(station, time)| {
            json!({"StationID": station, "ArrivalTime": time, "DepartureTime": time})
        })
        .collect();
    from_json(json!({
        "TrainInfo": {"TrainNo": no, "TrainTypeName": {"Zh_tw": type_name}},
        "StopTimes": stop_times
    }))
}

pub(crate) fn delay(no: &str, minutes: i64) -> TrainDelayPayload {
    from_json(json!({"TrainNo": no, "DelayTime": minutes}))
}

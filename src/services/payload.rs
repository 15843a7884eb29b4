//! Wire shapes of the upstream open-data API.
//!
//! Field names follow the upstream JSON exactly. Nothing outside
//! [`crate::assemble`] should read these; the assemblers turn them into the
//! normalized records in [`crate::models`].

use serde::{Deserialize, Serialize};

/// Bilingual name object used throughout the upstream API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameType {
    #[serde(rename = "Zh_tw", default)]
    pub zh_tw: Option<String>,
    #[serde(rename = "En", default)]
    pub en: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointType {
    #[serde(rename = "PositionLat")]
    pub lat: f64,
    #[serde(rename = "PositionLon")]
    pub lon: f64,
}

// Bike

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeStationPayload {
    #[serde(rename = "StationUID", default)]
    pub station_uid: Option<String>,
    #[serde(rename = "StationID")]
    pub station_id: String,
    #[serde(rename = "StationName", default)]
    pub station_name: NameType,
    #[serde(rename = "StationAddress", default)]
    pub station_address: NameType,
    #[serde(rename = "StationPosition", default)]
    pub station_position: Option<PointType>,
    #[serde(rename = "BikesCapacity", default)]
    pub bikes_capacity: Option<u32>,
    #[serde(rename = "ServiceType", default)]
    pub service_type: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeAvailabilityPayload {
    #[serde(rename = "StationUID", default)]
    pub station_uid: Option<String>,
    #[serde(rename = "StationID")]
    pub station_id: String,
    #[serde(rename = "ServiceStatus", default)]
    pub service_status: Option<u8>,
    #[serde(rename = "AvailableRentBikes", default)]
    pub available_rent_bikes: Option<u32>,
    #[serde(rename = "AvailableReturnBikes", default)]
    pub available_return_bikes: Option<u32>,
    #[serde(rename = "UpdateTime", default)]
    pub update_time: Option<String>,
}

// Bus

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorPayload {
    #[serde(rename = "OperatorID")]
    pub operator_id: String,
    #[serde(rename = "OperatorName", default)]
    pub operator_name: NameType,
    #[serde(rename = "OperatorCode", default)]
    pub operator_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubRoutePayload {
    #[serde(rename = "SubRouteUID")]
    pub sub_route_uid: String,
    #[serde(rename = "SubRouteID", default)]
    pub sub_route_id: Option<String>,
    #[serde(rename = "SubRouteName", default)]
    pub sub_route_name: NameType,
    #[serde(rename = "Direction", default)]
    pub direction: Option<u8>,
    #[serde(rename = "Headsign", default)]
    pub headsign: Option<String>,
    #[serde(rename = "FirstBusTime", default)]
    pub first_bus_time: Option<String>,
    #[serde(rename = "LastBusTime", default)]
    pub last_bus_time: Option<String>,
    #[serde(rename = "HolidayFirstBusTime", default)]
    pub holiday_first_bus_time: Option<String>,
    #[serde(rename = "HolidayLastBusTime", default)]
    pub holiday_last_bus_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusRoutePayload {
    #[serde(rename = "RouteUID")]
    pub route_uid: String,
    #[serde(rename = "RouteID", default)]
    pub route_id: Option<String>,
    #[serde(rename = "RouteName", default)]
    pub route_name: NameType,
    #[serde(rename = "Operators", default)]
    pub operators: Vec<OperatorPayload>,
    #[serde(rename = "SubRoutes", default)]
    pub sub_routes: Option<Vec<SubRoutePayload>>,
    #[serde(rename = "DepartureStopNameZh", default)]
    pub departure_stop_name_zh: Option<String>,
    #[serde(rename = "DestinationStopNameZh", default)]
    pub destination_stop_name_zh: Option<String>,
    #[serde(rename = "BusRouteType", default)]
    pub bus_route_type: Option<u32>,
    #[serde(rename = "City", default)]
    pub city: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStopPayload {
    #[serde(rename = "StopUID")]
    pub stop_uid: String,
    #[serde(rename = "StopID", default)]
    pub stop_id: Option<String>,
    #[serde(rename = "StopName", default)]
    pub stop_name: NameType,
    #[serde(rename = "StopSequence", default)]
    pub stop_sequence: u32,
    #[serde(rename = "StopPosition", default)]
    pub stop_position: Option<PointType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopOfRoutePayload {
    #[serde(rename = "RouteUID")]
    pub route_uid: String,
    #[serde(rename = "SubRouteUID", default)]
    pub sub_route_uid: Option<String>,
    #[serde(rename = "SubRouteName", default)]
    pub sub_route_name: NameType,
    #[serde(rename = "Direction", default)]
    pub direction: u8,
    #[serde(rename = "Operators", default)]
    pub operators: Vec<OperatorPayload>,
    #[serde(rename = "Stops", default)]
    pub stops: Vec<RouteStopPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtaPayload {
    #[serde(rename = "StopUID")]
    pub stop_uid: String,
    #[serde(rename = "RouteUID")]
    pub route_uid: String,
    #[serde(rename = "SubRouteUID", default)]
    pub sub_route_uid: Option<String>,
    #[serde(rename = "Direction", default)]
    pub direction: u8,
    #[serde(rename = "EstimateTime", default)]
    pub estimate_time: Option<i64>,
    #[serde(rename = "StopStatus", default)]
    pub stop_status: Option<u8>,
    #[serde(rename = "PlateNumb", default)]
    pub plate_numb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealTimeNearStopPayload {
    #[serde(rename = "PlateNumb")]
    pub plate_numb: String,
    #[serde(rename = "RouteUID")]
    pub route_uid: String,
    #[serde(rename = "SubRouteUID", default)]
    pub sub_route_uid: Option<String>,
    #[serde(rename = "Direction", default)]
    pub direction: u8,
    #[serde(rename = "StopUID", default)]
    pub stop_uid: Option<String>,
    #[serde(rename = "StopSequence", default)]
    pub stop_sequence: u32,
    #[serde(rename = "DutyStatus", default)]
    pub duty_status: Option<u8>,
    #[serde(rename = "BusStatus", default)]
    pub bus_status: Option<u8>,
}

// Rail

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RailStationPayload {
    #[serde(rename = "StationUID", default)]
    pub station_uid: Option<String>,
    #[serde(rename = "StationID")]
    pub station_id: String,
    #[serde(rename = "StationName", default)]
    pub station_name: NameType,
    #[serde(rename = "StationAddress", default)]
    pub station_address: Option<String>,
    #[serde(rename = "StationPosition", default)]
    pub station_position: Option<PointType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RailStationList {
    #[serde(rename = "Stations", default)]
    pub stations: Vec<RailStationPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStationPayload {
    #[serde(rename = "Sequence", default)]
    pub sequence: Option<u32>,
    #[serde(rename = "StationID")]
    pub station_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationOfLinePayload {
    #[serde(rename = "LineID")]
    pub line_id: String,
    #[serde(rename = "Stations", default)]
    pub stations: Vec<LineStationPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationOfLineList {
    #[serde(rename = "StationOfLines", default)]
    pub station_of_lines: Vec<StationOfLinePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainInfoPayload {
    #[serde(rename = "TrainNo")]
    pub train_no: String,
    #[serde(rename = "TrainTypeID", default)]
    pub train_type_id: Option<String>,
    #[serde(rename = "TrainTypeName", default)]
    pub train_type_name: NameType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopTimePayload {
    #[serde(rename = "StopSequence", default)]
    pub stop_sequence: Option<u32>,
    #[serde(rename = "StationID")]
    pub station_id: String,
    #[serde(rename = "ArrivalTime", default)]
    pub arrival_time: Option<String>,
    #[serde(rename = "DepartureTime", default)]
    pub departure_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainTimetablePayload {
    #[serde(rename = "TrainInfo")]
    pub train_info: TrainInfoPayload,
    #[serde(rename = "StopTimes", default)]
    pub stop_times: Vec<StopTimePayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainTimetableList {
    #[serde(rename = "TrainTimetables", default)]
    pub train_timetables: Vec<TrainTimetablePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainDelayPayload {
    #[serde(rename = "TrainNo")]
    pub train_no: String,
    #[serde(rename = "StationID", default)]
    pub station_id: Option<String>,
    #[serde(rename = "DelayTime", default)]
    pub delay_time: Option<i64>,
    #[serde(rename = "SrcUpdateTime", default)]
    pub src_update_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_with_sub_routes_deserializes() {
        let json = r#"{
            "RouteUID": "TPE10723",
            "RouteID": "10723",
            "RouteName": {"Zh_tw": "307", "En": "307"},
            "Operators": [{"OperatorID": "100", "OperatorName": {"Zh_tw": "大都會客運"}}],
            "SubRoutes": [
                {"SubRouteUID": "TPE107230", "SubRouteName": {"Zh_tw": "307"}, "Direction": 0},
                {"SubRouteUID": "TPE107231", "SubRouteName": {"Zh_tw": "307"}, "Direction": 1}
            ],
            "DepartureStopNameZh": "撫遠街",
            "DestinationStopNameZh": "板橋前站"
        }"#;

        let route: BusRoutePayload = serde_json::from_str(json).unwrap();

        assert_eq!(route.route_uid, "TPE10723");
        assert_eq!(route.sub_routes.as_ref().map(Vec::len), Some(2));
        assert_eq!(route.operators[0].operator_name.zh_tw.as_deref(), Some("大都會客運"));
    }

    #[test]
    fn test_missing_delay_time_is_none() {
        let json = r#"[{"TrainNo": "123", "StationID": "1000"}]"#;
        let delays: Vec<TrainDelayPayload> = serde_json::from_str(json).unwrap();
        assert_eq!(delays[0].delay_time, None);
    }

    #[test]
    fn test_empty_timetable_envelope() {
        let list: TrainTimetableList = serde_json::from_str("{}").unwrap();
        assert!(list.train_timetables.is_empty());
    }
}

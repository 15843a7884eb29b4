//! Resource paths relative to the API root. City codes, station ids and
//! dates are percent-encoded as path segments.

use chrono::NaiveDate;
use urlencoding::encode;

pub const DEFAULT_BASE_URL: &str = "https://tdx.transportdata.tw/api/basic";

pub fn bike_stations(city: &str) -> String {
    format!("v2/Bike/Station/City/{}", encode(city))
}

pub fn bike_availability(city: &str) -> String {
    format!("v2/Bike/Availability/City/{}", encode(city))
}

pub fn bus_routes(city: &str) -> String {
    format!("v2/Bus/Route/City/{}", encode(city))
}

pub fn bus_stop_of_route(city: &str) -> String {
    format!("v2/Bus/StopOfRoute/City/{}", encode(city))
}

pub fn bus_estimated_arrivals(city: &str) -> String {
    format!("v2/Bus/EstimatedTimeOfArrival/City/{}", encode(city))
}

pub fn bus_real_time_near_stop(city: &str) -> String {
    format!("v2/Bus/RealTimeNearStop/City/{}", encode(city))
}

pub fn rail_stations() -> String {
    "v3/Rail/TRA/Station".to_string()
}

pub fn rail_station_of_line() -> String {
    "v3/Rail/TRA/StationOfLine".to_string()
}

pub fn rail_daily_timetable(origin: &str, dest: &str, date: NaiveDate) -> String {
    format!(
        "v3/Rail/TRA/DailyTrainTimetable/OD/{}/to/{}/{}",
        encode(origin),
        encode(dest),
        date.format("%Y-%m-%d")
    )
}

pub fn rail_live_delay() -> String {
    "v2/Rail/TRA/LiveTrainDelay".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_paths() {
        assert_eq!(bike_stations("Taipei"), "v2/Bike/Station/City/Taipei");
        assert_eq!(
            bus_real_time_near_stop("NewTaipei"),
            "v2/Bus/RealTimeNearStop/City/NewTaipei"
        );
    }

    #[test]
    fn test_timetable_path_formats_date() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            rail_daily_timetable("1000", "4400", date),
            "v3/Rail/TRA/DailyTrainTimetable/OD/1000/to/4400/2026-10-19"
        );
    }

    #[test]
    fn test_segments_are_encoded() {
        assert_eq!(bus_routes("a b"), "v2/Bus/Route/City/a%20b");
    }
}

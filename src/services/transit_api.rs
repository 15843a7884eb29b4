//! Trait for the upstream transit data provider.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::payload::{
    BikeAvailabilityPayload, BikeStationPayload, BusRoutePayload, EtaPayload,
    RailStationPayload, RealTimeNearStopPayload, StationOfLinePayload, StopOfRoutePayload,
    TrainDelayPayload, TrainTimetablePayload,
};
use crate::error::Result;

/// One method per upstream resource.
///
/// Each call is independent and reports its own failure, so callers can join
/// several of them and keep whatever succeeded.
#[async_trait]
pub trait TransitApi: Send + Sync {
    async fn bike_stations(&self, city: &str) -> Result<Vec<BikeStationPayload>>;

    async fn bike_availability(&self, city: &str) -> Result<Vec<BikeAvailabilityPayload>>;

    async fn bus_routes(&self, city: &str) -> Result<Vec<BusRoutePayload>>;

    async fn bus_stop_sequences(&self, city: &str) -> Result<Vec<StopOfRoutePayload>>;

    async fn bus_estimated_arrivals(&self, city: &str) -> Result<Vec<EtaPayload>>;

    async fn bus_live_vehicles(&self, city: &str) -> Result<Vec<RealTimeNearStopPayload>>;

    async fn rail_stations(&self) -> Result<Vec<RailStationPayload>>;

    async fn rail_station_lines(&self) -> Result<Vec<StationOfLinePayload>>;

    /// Daily timetable of trains stopping at both `origin` and `dest`.
    async fn rail_timetable(
        &self,
        origin: &str,
        dest: &str,
        date: NaiveDate,
    ) -> Result<Vec<TrainTimetablePayload>>;

    async fn rail_live_delays(&self) -> Result<Vec<TrainDelayPayload>>;
}

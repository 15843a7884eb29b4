use async_trait::async_trait;
use chrono::NaiveDate;

use super::endpoints;
use crate::error::Result;
use crate::fetch::{Fetcher, HttpClient};
use crate::services::TransitApi;
use crate::services::payload::{
    BikeAvailabilityPayload, BikeStationPayload, BusRoutePayload, EtaPayload,
    RailStationList, RailStationPayload, RealTimeNearStopPayload, StationOfLineList,
    StationOfLinePayload, StopOfRoutePayload, TrainDelayPayload, TrainTimetableList,
    TrainTimetablePayload,
};

/// [`TransitApi`] over the authenticated [`Fetcher`].
pub struct TdxClient<C> {
    fetcher: Fetcher<C>,
}

impl<C: HttpClient> TdxClient<C> {
    pub fn new(fetcher: Fetcher<C>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<C: HttpClient> TransitApi for TdxClient<C> {
    async fn bike_stations(&self, city: &str) -> Result<Vec<BikeStationPayload>> {
        self.fetcher.get_json(&endpoints::bike_stations(city)).await
    }

    async fn bike_availability(&self, city: &str) -> Result<Vec<BikeAvailabilityPayload>> {
        self.fetcher.get_json(&endpoints::bike_availability(city)).await
    }

    async fn bus_routes(&self, city: &str) -> Result<Vec<BusRoutePayload>> {
        self.fetcher.get_json(&endpoints::bus_routes(city)).await
    }

    async fn bus_stop_sequences(&self, city: &str) -> Result<Vec<StopOfRoutePayload>> {
        self.fetcher.get_json(&endpoints::bus_stop_of_route(city)).await
    }

    async fn bus_estimated_arrivals(&self, city: &str) -> Result<Vec<EtaPayload>> {
        self.fetcher
            .get_json(&endpoints::bus_estimated_arrivals(city))
            .await
    }

    async fn bus_live_vehicles(&self, city: &str) -> Result<Vec<RealTimeNearStopPayload>> {
        self.fetcher
            .get_json(&endpoints::bus_real_time_near_stop(city))
            .await
    }

    // The v3 rail resources wrap their lists in an envelope object.

    async fn rail_stations(&self) -> Result<Vec<RailStationPayload>> {
        let list: RailStationList = self.fetcher.get_json(&endpoints::rail_stations()).await?;
        Ok(list.stations)
    }

    async fn rail_station_lines(&self) -> Result<Vec<StationOfLinePayload>> {
        let list: StationOfLineList = self
            .fetcher
            .get_json(&endpoints::rail_station_of_line())
            .await?;
        Ok(list.station_of_lines)
    }

    async fn rail_timetable(
        &self,
        origin: &str,
        dest: &str,
        date: NaiveDate,
    ) -> Result<Vec<TrainTimetablePayload>> {
        let list: TrainTimetableList = self
            .fetcher
            .get_json(&endpoints::rail_daily_timetable(origin, dest, date))
            .await?;
        Ok(list.train_timetables)
    }

    async fn rail_live_delays(&self) -> Result<Vec<TrainDelayPayload>> {
        self.fetcher.get_json(&endpoints::rail_live_delay()).await
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::Generation;
use crate::assemble;
use crate::cache::KeyedCache;
use crate::error::{Result, TransitError};
use crate::models::bike::{Availability, BikeStation, Station};
use crate::services::TransitApi;
use crate::views::bike::{STATIONS_PER_PAGE, StationQuery, display_stations};
use crate::views::{Page, paginate};

/// Display state of the bike page for the selected city.
#[derive(Debug, Clone, Default)]
pub struct BikeState {
    pub city: Option<String>,
    pub stations: Option<Arc<Vec<Station>>>,
    pub availability: Option<Arc<Vec<Availability>>>,
    pub station_error: Option<TransitError>,
    pub availability_error: Option<TransitError>,
    pub loading: bool,
    pub last_updated: Option<DateTime<Utc>>,
    generation: Generation,
}

impl BikeState {
    /// Stations joined with whatever availability is held. Without a
    /// station list there is nothing to show.
    pub fn stations(&self) -> Vec<BikeStation> {
        let Some(stations) = &self.stations else {
            return Vec::new();
        };
        let availability = self.availability.as_deref().map(Vec::as_slice).unwrap_or(&[]);
        assemble::bike::join(stations, availability)
    }

    /// One page of the filtered, sorted list.
    pub fn page(&self, query: &StationQuery, page: usize) -> Page<BikeStation> {
        let joined = self.stations();
        let shown: Vec<BikeStation> = display_stations(&joined, query)
            .into_iter()
            .cloned()
            .collect();
        paginate(&shown, page, STATIONS_PER_PAGE)
    }

    pub fn errors(&self) -> Vec<&TransitError> {
        self.station_error
            .iter()
            .chain(self.availability_error.iter())
            .collect()
    }
}

/// Bike page orchestration: station and availability caches per city and
/// the current selection.
pub struct BikeSession {
    api: Arc<dyn TransitApi>,
    stations: KeyedCache<String, Vec<Station>>,
    availability: KeyedCache<String, Vec<Availability>>,
    state: RwLock<BikeState>,
}

impl BikeSession {
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self {
            api,
            stations: KeyedCache::new("bike_stations"),
            availability: KeyedCache::new("bike_availability"),
            state: RwLock::new(BikeState::default()),
        }
    }

    pub async fn snapshot(&self) -> BikeState {
        self.state.read().await.clone()
    }

    /// Switches to `city` and loads stations and availability concurrently.
    /// Each resource reports into its own error slot.
    #[tracing::instrument(skip(self))]
    pub async fn select_city(&self, city: &str) {
        let ticket = {
            let mut state = self.state.write().await;
            let ticket = state.generation.advance();
            *state = BikeState {
                city: Some(city.to_string()),
                loading: true,
                generation: state.generation,
                ..BikeState::default()
            };
            ticket
        };

        let (stations, availability) =
            tokio::join!(self.load_stations(city), self.load_availability(city));

        let mut state = self.state.write().await;
        if !state.generation.is_current(ticket) {
            debug!("Discarding bike data for a previous selection");
            return;
        }
        match stations {
            Ok(stations) => {
                info!(count = stations.len(), "Bike stations loaded");
                state.stations = Some(stations);
            }
            Err(e) => {
                warn!(error = %e, "Bike stations unavailable");
                state.station_error = Some(e);
            }
        }
        match availability {
            Ok(availability) => state.availability = Some(availability),
            Err(e) => {
                warn!(error = %e, "Bike availability unavailable");
                state.availability_error = Some(e);
            }
        }
        if state.stations.is_some() || state.availability.is_some() {
            state.last_updated = Some(Utc::now());
        }
        state.loading = false;
    }

    /// Re-fetches availability for the selected city, replacing the cached
    /// list. Stations are not refetched. No-op without a selection.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_availability(&self) -> Result<()> {
        let (city, ticket) = {
            let state = self.state.read().await;
            match &state.city {
                Some(city) => (city.clone(), state.generation.ticket()),
                None => return Ok(()),
            }
        };

        let result = self.api.bike_availability(&city).await;
        let fresh = match result {
            Ok(payloads) => Ok(self
                .availability
                .replace(city.clone(), assemble::bike::availability(payloads))
                .await),
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        if !state.generation.is_current(ticket) {
            debug!(city = %city, "Discarding availability refresh for a previous selection");
            return Ok(());
        }
        match fresh {
            Ok(availability) => {
                debug!(city = %city, count = availability.len(), "Availability refreshed");
                state.availability = Some(availability);
                state.availability_error = None;
                state.last_updated = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                state.availability_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Drops the selection. Cached data is kept for a later reselect.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.generation.advance();
        *state = BikeState {
            generation: state.generation,
            ..BikeState::default()
        };
    }

    async fn load_stations(&self, city: &str) -> Result<Arc<Vec<Station>>> {
        self.stations
            .get_or_fetch(city.to_string(), || async {
                let payloads = self.api.bike_stations(city).await?;
                Ok::<_, TransitError>(assemble::bike::stations(payloads))
            })
            .await
    }

    async fn load_availability(&self, city: &str) -> Result<Arc<Vec<Availability>>> {
        self.availability
            .get_or_fetch(city.to_string(), || async {
                let payloads = self.api.bike_availability(city).await?;
                Ok::<_, TransitError>(assemble::bike::availability(payloads))
            })
            .await
    }
}

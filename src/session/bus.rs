use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::Generation;
use crate::assemble;
use crate::cache::KeyedCache;
use crate::error::{Result, TransitError};
use crate::models::bus::{BusRoute, Direction, Eta, LiveVehicle, RouteCategory, StopSequence};
use crate::services::TransitApi;
use crate::views::bus::{
    DirectionTab, StopBoard, available_categories, direction_tabs, route_list, show_category_tabs,
    stop_board, variant_for,
};

/// One error slot per city resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusErrors {
    pub routes: Option<TransitError>,
    pub stops: Option<TransitError>,
    pub etas: Option<TransitError>,
    pub vehicles: Option<TransitError>,
}

impl BusErrors {
    pub fn iter(&self) -> impl Iterator<Item = &TransitError> {
        [&self.routes, &self.stops, &self.etas, &self.vehicles]
            .into_iter()
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BusState {
    pub city: Option<String>,
    pub routes: Option<Arc<Vec<BusRoute>>>,
    pub stops: Option<Arc<Vec<StopSequence>>>,
    pub etas: Option<Arc<Vec<Eta>>>,
    pub vehicles: Option<Arc<Vec<LiveVehicle>>>,
    pub errors: BusErrors,
    pub loading: bool,
    pub selected: Option<BusRoute>,
    pub direction: Option<Direction>,
    pub category: Option<RouteCategory>,
    pub search: String,
    pub last_updated: Option<DateTime<Utc>>,
    generation: Generation,
}

impl BusState {
    fn all_routes(&self) -> &[BusRoute] {
        self.routes.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Routes for the list pane under the current category and search.
    pub fn route_list(&self) -> Vec<&BusRoute> {
        route_list(self.all_routes(), self.category, &self.search)
    }

    /// Category tabs to offer, empty when the city is small enough to list
    /// flat.
    pub fn categories(&self) -> Vec<RouteCategory> {
        if show_category_tabs(self.all_routes()) {
            available_categories(self.all_routes())
        } else {
            Vec::new()
        }
    }

    pub fn direction_tabs(&self) -> Vec<DirectionTab> {
        match &self.selected {
            Some(selected) => direction_tabs(
                self.all_routes(),
                selected,
                self.stops.as_deref().map(Vec::as_slice).unwrap_or(&[]),
            ),
            None => Vec::new(),
        }
    }

    /// Stop board of the selected route in the selected direction.
    pub fn board(&self) -> Vec<StopBoard> {
        let (Some(selected), Some(direction)) = (&self.selected, self.direction) else {
            return Vec::new();
        };
        stop_board(
            selected,
            direction,
            self.stops.as_deref().map(Vec::as_slice).unwrap_or(&[]),
            self.etas.as_deref().map(Vec::as_slice).unwrap_or(&[]),
            self.vehicles.as_deref().map(Vec::as_slice).unwrap_or(&[]),
        )
    }
}

/// Bus page orchestration. Routes and stop sequences are cached per city for
/// the session; ETAs and vehicles are cached too but replaced on every live
/// refresh.
pub struct BusSession {
    api: Arc<dyn TransitApi>,
    routes: KeyedCache<String, Vec<BusRoute>>,
    stops: KeyedCache<String, Vec<StopSequence>>,
    etas: KeyedCache<String, Vec<Eta>>,
    vehicles: KeyedCache<String, Vec<LiveVehicle>>,
    state: RwLock<BusState>,
}

impl BusSession {
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self {
            api,
            routes: KeyedCache::new("bus_routes"),
            stops: KeyedCache::new("bus_stops"),
            etas: KeyedCache::new("bus_etas"),
            vehicles: KeyedCache::new("bus_vehicles"),
            state: RwLock::new(BusState::default()),
        }
    }

    pub async fn snapshot(&self) -> BusState {
        self.state.read().await.clone()
    }

    /// Switches to `city` and loads its four resources concurrently.
    #[tracing::instrument(skip(self))]
    pub async fn select_city(&self, city: &str) {
        let ticket = {
            let mut state = self.state.write().await;
            let ticket = state.generation.advance();
            *state = BusState {
                city: Some(city.to_string()),
                loading: true,
                generation: state.generation,
                ..BusState::default()
            };
            ticket
        };

        let (routes, stops, etas, vehicles) = tokio::join!(
            self.routes.get_or_fetch(city.to_string(), || async {
                let payloads = self.api.bus_routes(city).await?;
                Ok::<_, TransitError>(assemble::bus::flatten_routes(payloads))
            }),
            self.stops.get_or_fetch(city.to_string(), || async {
                let payloads = self.api.bus_stop_sequences(city).await?;
                Ok::<_, TransitError>(assemble::bus::stop_sequences(payloads))
            }),
            self.etas.get_or_fetch(city.to_string(), || async {
                let payloads = self.api.bus_estimated_arrivals(city).await?;
                Ok::<_, TransitError>(assemble::bus::arrivals(payloads))
            }),
            self.vehicles.get_or_fetch(city.to_string(), || async {
                let payloads = self.api.bus_live_vehicles(city).await?;
                Ok::<_, TransitError>(assemble::bus::live_vehicles(payloads))
            }),
        );

        let mut state = self.state.write().await;
        if !state.generation.is_current(ticket) {
            debug!("Discarding bus data for a previous selection");
            return;
        }
        state.routes = settle("routes", routes, &mut state.errors.routes);
        state.stops = settle("stops", stops, &mut state.errors.stops);
        state.etas = settle("etas", etas, &mut state.errors.etas);
        state.vehicles = settle("vehicles", vehicles, &mut state.errors.vehicles);
        if let Some(routes) = &state.routes {
            info!(count = routes.len(), "Bus routes loaded");
        }
        if !state.errors.is_empty() {
            warn!(failed = state.errors.iter().count(), "Some bus resources failed");
        }
        state.last_updated = Some(Utc::now());
        state.loading = false;
    }

    pub async fn clear_city(&self) {
        let mut state = self.state.write().await;
        state.generation.advance();
        *state = BusState {
            generation: state.generation,
            ..BusState::default()
        };
    }

    pub async fn set_category(&self, category: Option<RouteCategory>) {
        self.state.write().await.category = category;
    }

    pub async fn set_search(&self, search: impl Into<String>) {
        self.state.write().await.search = search.into();
    }

    /// Opens the detail view of `route` in its own direction.
    pub async fn select_route(&self, route: BusRoute) {
        let mut state = self.state.write().await;
        debug!(route = %route.name, "Route selected");
        state.direction = Some(route.direction);
        state.selected = Some(route);
    }

    /// Selects a route from the list by display name.
    pub async fn select_route_named(&self, name: &str) -> Result<BusRoute> {
        let route = {
            let state = self.state.read().await;
            state
                .route_list()
                .into_iter()
                .find(|r| r.name == name)
                .cloned()
                .ok_or_else(|| TransitError::NoData(format!("no route named {name}")))?
        };
        self.select_route(route.clone()).await;
        Ok(route)
    }

    pub async fn close_route(&self) {
        let mut state = self.state.write().await;
        state.selected = None;
        state.direction = None;
    }

    /// Switches the detail view to `direction`, moving the selection onto
    /// the matching variant of the same route when one exists.
    pub async fn set_direction(&self, direction: Direction) {
        let mut state = self.state.write().await;
        let Some(selected) = &state.selected else {
            return;
        };
        let variant = variant_for(state.all_routes(), selected, direction).cloned();
        if let Some(variant) = variant {
            state.selected = Some(variant);
        }
        state.direction = Some(direction);
    }

    /// Re-fetches ETAs and live vehicles for the selected city, replacing
    /// both cached lists. Returns the first failure so a countdown can show
    /// it; the other resource is still applied.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_live(&self) -> Result<()> {
        let (city, ticket) = {
            let state = self.state.read().await;
            match &state.city {
                Some(city) => (city.clone(), state.generation.ticket()),
                None => return Ok(()),
            }
        };

        let (etas, vehicles) = tokio::join!(
            self.api.bus_estimated_arrivals(&city),
            self.api.bus_live_vehicles(&city),
        );
        let etas = match etas {
            Ok(p) => Ok(self.etas.replace(city.clone(), assemble::bus::arrivals(p)).await),
            Err(e) => Err(e),
        };
        let vehicles = match vehicles {
            Ok(p) => Ok(self
                .vehicles
                .replace(city.clone(), assemble::bus::live_vehicles(p))
                .await),
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        if !state.generation.is_current(ticket) {
            debug!(city = %city, "Discarding live refresh for a previous selection");
            return Ok(());
        }
        let first_error = etas.as_ref().err().or(vehicles.as_ref().err()).cloned();

        let previous_etas = state.etas.take();
        state.etas = settle("etas", etas, &mut state.errors.etas).or(previous_etas);
        let previous_vehicles = state.vehicles.take();
        state.vehicles =
            settle("vehicles", vehicles, &mut state.errors.vehicles).or(previous_vehicles);
        state.last_updated = Some(Utc::now());

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Moves a resource result into its value and error slot.
fn settle<T>(
    resource: &'static str,
    result: Result<Arc<T>>,
    slot: &mut Option<TransitError>,
) -> Option<Arc<T>> {
    match result {
        Ok(value) => {
            *slot = None;
            Some(value)
        }
        Err(e) => {
            warn!(resource, error = %e, "Bus resource unavailable");
            *slot = Some(e);
            None
        }
    }
}

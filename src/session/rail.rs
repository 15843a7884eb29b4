use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{Clock, Generation};
use crate::assemble;
use crate::cache::KeyedCache;
use crate::error::{Result, TransitError};
use crate::models::rail::{DelayTable, Journey, LineIndex, RailStation, TimetableEntry};
use crate::services::TransitApi;
use crate::views::rail::{
    earliest_selectable_date, effective_departure, journeys, nearest_departure, station_options,
    visible_journeys,
};

/// Railway operator the base data is cached under.
const OPERATOR: &str = "TRA";

type TimetableKey = (String, String, NaiveDate);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RailErrors {
    pub stations: Option<TransitError>,
    pub lines: Option<TransitError>,
    pub timetable: Option<TransitError>,
    pub delays: Option<TransitError>,
}

/// A journey as shown on the timetable board.
#[derive(Debug, Clone, PartialEq)]
pub struct RailRow {
    pub journey: Journey,
    pub delay_minutes: i64,
    pub effective_departure: Option<NaiveDateTime>,
    pub travel_time: Option<Duration>,
    pub nearest: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RailBoard {
    pub rows: Vec<RailRow>,
}

impl RailBoard {
    pub fn nearest(&self) -> Option<&RailRow> {
        self.rows.iter().find(|r| r.nearest)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RailState {
    pub stations: Option<Arc<Vec<RailStation>>>,
    pub lines: Option<Arc<LineIndex>>,
    pub origin_city: Option<String>,
    pub dest_city: Option<String>,
    pub origin: Option<String>,
    pub dest: Option<String>,
    pub date: Option<NaiveDate>,
    pub timetable: Option<Arc<Vec<TimetableEntry>>>,
    pub delays: Arc<DelayTable>,
    pub errors: RailErrors,
    pub loading: bool,
    generation: Generation,
}

impl RailState {
    fn station_list(&self) -> &[RailStation] {
        self.stations.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }

    fn options<'a>(&'a self, city: Option<&str>, counterpart: Option<&str>) -> Vec<&'a RailStation> {
        let empty = LineIndex::default();
        let lines = self.lines.as_deref().unwrap_or(&empty);
        station_options(self.station_list(), lines, city.unwrap_or(""), counterpart)
    }

    pub fn origin_options(&self) -> Vec<&RailStation> {
        self.options(self.origin_city.as_deref(), self.dest.as_deref())
    }

    pub fn dest_options(&self) -> Vec<&RailStation> {
        self.options(self.dest_city.as_deref(), self.origin.as_deref())
    }

    pub fn station(&self, id: &str) -> Option<&RailStation> {
        self.station_list().iter().find(|s| s.id == id)
    }

    /// Every journey of the loaded timetable, unfiltered.
    pub fn journeys(&self) -> Vec<Journey> {
        match (&self.timetable, &self.origin, &self.dest) {
            (Some(entries), Some(origin), Some(dest)) => journeys(entries, origin, dest),
            _ => Vec::new(),
        }
    }

    /// Rows visible at `now`, the nearest upcoming one flagged.
    pub fn board(&self, now: NaiveDateTime) -> RailBoard {
        let Some(date) = self.date else {
            return RailBoard::default();
        };
        let all = self.journeys();
        let visible = visible_journeys(&all, date, &self.delays, now);
        let nearest = nearest_departure(&visible, date, &self.delays, now).map(|j| j.train_no.clone());

        let rows = visible
            .into_iter()
            .map(|journey| RailRow {
                delay_minutes: self.delays.delay_minutes(&journey.train_no),
                effective_departure: effective_departure(journey, date, &self.delays),
                travel_time: journey.travel_time(),
                nearest: nearest.as_deref() == Some(journey.train_no.as_str()),
                journey: journey.clone(),
            })
            .collect();
        RailBoard { rows }
    }
}

/// Train page orchestration. Station and line data are loaded once;
/// timetables are cached per `(origin, destination, date)`.
pub struct RailSession {
    api: Arc<dyn TransitApi>,
    clock: Clock,
    stations: KeyedCache<&'static str, Vec<RailStation>>,
    lines: KeyedCache<&'static str, LineIndex>,
    timetables: KeyedCache<TimetableKey, Vec<TimetableEntry>>,
    state: RwLock<RailState>,
}

impl RailSession {
    pub fn new(api: Arc<dyn TransitApi>, clock: Clock) -> Self {
        Self {
            api,
            clock,
            stations: KeyedCache::new("rail_stations"),
            lines: KeyedCache::new("rail_lines"),
            timetables: KeyedCache::new("rail_timetables"),
            state: RwLock::new(RailState::default()),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    pub async fn snapshot(&self) -> RailState {
        self.state.read().await.clone()
    }

    pub async fn board(&self) -> RailBoard {
        let now = self.now();
        self.state.read().await.board(now)
    }

    /// Loads the station list and line membership concurrently. Already
    /// loaded resources come from the cache.
    #[tracing::instrument(skip(self))]
    pub async fn load_stations(&self) {
        let (stations, lines) = tokio::join!(
            self.stations.get_or_fetch(OPERATOR, || async {
                let payloads = self.api.rail_stations().await?;
                Ok::<_, TransitError>(assemble::rail::stations(payloads))
            }),
            self.lines.get_or_fetch(OPERATOR, || async {
                let payloads = self.api.rail_station_lines().await?;
                Ok::<_, TransitError>(assemble::rail::line_index(&payloads))
            }),
        );

        let mut state = self.state.write().await;
        match stations {
            Ok(stations) => {
                info!(count = stations.len(), "Rail stations loaded");
                state.stations = Some(stations);
                state.errors.stations = None;
            }
            Err(e) => {
                warn!(error = %e, "Rail stations unavailable");
                state.errors.stations = Some(e);
            }
        }
        match lines {
            Ok(lines) => {
                state.lines = Some(lines);
                state.errors.lines = None;
            }
            Err(e) => {
                warn!(error = %e, "Station line data unavailable");
                state.errors.lines = Some(e);
            }
        }
    }

    /// Changing the origin city drops the origin station and any timetable.
    pub async fn set_origin_city(&self, city: &str) {
        let mut state = self.state.write().await;
        if state.origin_city.as_deref() == Some(city) {
            return;
        }
        state.origin_city = Some(city.to_string());
        state.origin = None;
        invalidate_timetable(&mut state);
    }

    pub async fn set_dest_city(&self, city: &str) {
        let mut state = self.state.write().await;
        if state.dest_city.as_deref() == Some(city) {
            return;
        }
        state.dest_city = Some(city.to_string());
        state.dest = None;
        invalidate_timetable(&mut state);
    }

    /// Picks the origin station among the current options, then loads the
    /// timetable if the selection is complete.
    pub async fn select_origin(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if !state.origin_options().iter().any(|s| s.id == id) {
                return Err(TransitError::NoData(format!("station {id} is not selectable")));
            }
            state.origin = Some(id.to_string());
            invalidate_timetable(&mut state);
        }
        self.load_timetable().await
    }

    pub async fn select_dest(&self, id: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if !state.dest_options().iter().any(|s| s.id == id) {
                return Err(TransitError::NoData(format!("station {id} is not selectable")));
            }
            state.dest = Some(id.to_string());
            invalidate_timetable(&mut state);
        }
        self.load_timetable().await
    }

    /// Dates before yesterday are rejected. Live delays only describe today,
    /// so moving to any other date drops them.
    pub async fn select_date(&self, date: NaiveDate) -> Result<()> {
        let today = self.today();
        let earliest = earliest_selectable_date(today);
        if date < earliest {
            return Err(TransitError::NoData(format!("dates before {earliest} are not offered")));
        }
        {
            let mut state = self.state.write().await;
            state.date = Some(date);
            if date != today {
                clear_delays(&mut state);
            }
            invalidate_timetable(&mut state);
        }
        self.load_timetable().await
    }

    /// Fetches the timetable for the complete selection, through the cache.
    /// A timetable with no journey between the two stations is `NoData`.
    /// On today's date live delays are fetched afterwards.
    #[tracing::instrument(skip(self))]
    pub async fn load_timetable(&self) -> Result<()> {
        let (key, ticket) = {
            let mut state = self.state.write().await;
            let (Some(origin), Some(dest), Some(date)) =
                (state.origin.clone(), state.dest.clone(), state.date)
            else {
                return Ok(());
            };
            state.loading = true;
            ((origin, dest, date), state.generation.ticket())
        };

        let result = self
            .timetables
            .get_or_fetch(key.clone(), || async {
                let payloads = self.api.rail_timetable(&key.0, &key.1, key.2).await?;
                Ok::<_, TransitError>(assemble::rail::timetable(payloads))
            })
            .await;

        {
            let mut state = self.state.write().await;
            if !state.generation.is_current(ticket) {
                debug!(origin = %key.0, dest = %key.1, "Discarding timetable for a previous selection");
                return Ok(());
            }
            state.loading = false;
            let entries = match result {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Timetable unavailable");
                    state.errors.timetable = Some(e.clone());
                    return Err(e);
                }
            };
            let found = journeys(&entries, &key.0, &key.1).len();
            state.timetable = Some(entries);
            if found == 0 {
                let e = TransitError::NoData(format!("no trains from {} to {}", key.0, key.1));
                state.errors.timetable = Some(e.clone());
                return Err(e);
            }
            info!(journeys = found, "Timetable loaded");
            state.errors.timetable = None;
        }

        if key.2 == self.today() {
            if let Err(e) = self.refresh_delays().await {
                debug!(error = %e, "Showing timetable without delays");
            }
        }
        Ok(())
    }

    /// Replaces the live delay table. Delays only apply to today, so any
    /// other selected date just clears it.
    #[tracing::instrument(skip(self))]
    pub async fn refresh_delays(&self) -> Result<()> {
        let today = self.today();
        let ticket = {
            let mut state = self.state.write().await;
            if state.date != Some(today) {
                clear_delays(&mut state);
                return Ok(());
            }
            state.generation.ticket()
        };

        let result = self.api.rail_live_delays().await;

        let mut state = self.state.write().await;
        if !state.generation.is_current(ticket) {
            debug!("Discarding delays for a previous selection");
            return Ok(());
        }
        match result {
            Ok(payloads) => {
                let delays = assemble::rail::delays(payloads);
                debug!(trains = delays.len(), "Live delays refreshed");
                state.delays = Arc::new(delays);
                state.errors.delays = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Live delays unavailable");
                state.errors.delays = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Drops every selection. Station data and cached timetables are kept.
    pub async fn reset_selection(&self) {
        let mut state = self.state.write().await;
        state.origin_city = None;
        state.dest_city = None;
        state.origin = None;
        state.dest = None;
        state.date = None;
        clear_delays(&mut state);
        invalidate_timetable(&mut state);
    }
}

fn clear_delays(state: &mut RailState) {
    state.delays = Arc::default();
    state.errors.delays = None;
}

fn invalidate_timetable(state: &mut RailState) {
    state.generation.advance();
    state.timetable = None;
    state.errors.timetable = None;
    state.loading = false;
}

//! CLI entry point for the transit portal.
//!
//! Each subcommand drives one mode's session the way the portal pages do:
//! pick a city or stations, render the assembled view, and optionally keep
//! the live refresh running until Ctrl+C.

use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use futures::FutureExt;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use transit_portal::cities::{self, BIKE_CITIES, BUS_CITIES, RAIL_CITIES};
use transit_portal::config::Settings;
use transit_portal::fetch::auth::CredentialProvider;
use transit_portal::fetch::{BasicClient, Fetcher, UrlParam};
use transit_portal::infra::tdx::TdxClient;
use transit_portal::models::bus::{Direction, RouteCategory};
use transit_portal::models::rail::RailStation;
use transit_portal::refresh::{Countdown, RefreshOp, RepeatingTask};
use transit_portal::services::TransitApi;
use transit_portal::session::{BikeState, BusState, Portal, RailBoard};
use transit_portal::token_server;
use transit_portal::views::bike::{StationFilter, StationQuery, StationSort, stock_level};

#[derive(Parser)]
#[command(name = "transit_portal")]
#[command(about = "Bike, bus and rail information from the TDX transport API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show bike-share stations and availability for a city
    Bike {
        /// City code or name (e.g. Taipei, 臺北市)
        #[arg(short, long)]
        city: String,

        #[arg(short, long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,

        #[arg(short, long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,

        /// Match station name or address
        #[arg(long, default_value = "")]
        search: String,

        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Keep refreshing availability until Ctrl+C
        #[arg(short, long, default_value_t = false)]
        watch: bool,
    },
    /// List bus routes for a city, or show one route's stop board
    Bus {
        /// City code or name
        #[arg(short, long)]
        city: String,

        /// Route display name (e.g. 307); lists routes when omitted
        #[arg(short, long)]
        route: Option<String>,

        #[arg(long, value_enum)]
        category: Option<CategoryArg>,

        #[arg(long, default_value = "")]
        search: String,

        /// Show the inbound direction
        #[arg(long, default_value_t = false)]
        inbound: bool,

        /// Keep the live countdown running until Ctrl+C
        #[arg(short, long, default_value_t = false)]
        watch: bool,
    },
    /// Show the timetable between two railway stations
    Train {
        /// Origin station id or name
        #[arg(long)]
        from: String,

        /// Destination station id or name
        #[arg(long)]
        to: String,

        /// Travel date, YYYY-MM-DD (default today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Keep refreshing delays until Ctrl+C
        #[arg(short, long, default_value_t = false)]
        watch: bool,
    },
    /// List railway stations in a city
    Stations {
        /// City name (e.g. 臺北市)
        #[arg(short, long)]
        city: String,
    },
    /// Serve the token exchange endpoint for browser clients
    TokenServer {
        #[arg(short, long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Available,
    Empty,
    Space,
    Full,
}

impl From<FilterArg> for StationFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => StationFilter::All,
            FilterArg::Available => StationFilter::Available,
            FilterArg::Empty => StationFilter::Empty,
            FilterArg::Space => StationFilter::Space,
            FilterArg::Full => StationFilter::Full,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Name,
    Bikes,
    Spaces,
}

impl From<SortArg> for StationSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => StationSort::Name,
            SortArg::Bikes => StationSort::Bikes,
            SortArg::Spaces => StationSort::Spaces,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Number,
    Color,
    Trunk,
    Other,
}

impl From<CategoryArg> for RouteCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Number => RouteCategory::Number,
            CategoryArg::Color => RouteCategory::Color,
            CategoryArg::Trunk => RouteCategory::Trunk,
            CategoryArg::Other => RouteCategory::Other,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/transit_portal.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("transit_portal.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Bike {
            city,
            filter,
            sort,
            search,
            page,
            watch,
        } => {
            let query = StationQuery {
                filter: filter.into(),
                sort: sort.into(),
                search,
            };
            run_bike(&settings, &city, query, page, watch).await?;
        }
        Commands::Bus {
            city,
            route,
            category,
            search,
            inbound,
            watch,
        } => {
            let portal = build_portal(&settings)?;
            let city = cities::find(BUS_CITIES, &city)
                .with_context(|| format!("unknown bus city {city}"))?;
            portal.bus.select_city(city.code).await;
            portal.bus.set_category(category.map(Into::into)).await;
            portal.bus.set_search(search).await;

            let Some(route) = route else {
                render_route_list(&portal.bus.snapshot().await);
                return Ok(());
            };
            portal.bus.select_route_named(&route).await?;
            if inbound {
                portal.bus.set_direction(Direction::Inbound).await;
            }
            render_stop_board(&portal.bus.snapshot().await);

            if watch {
                watch_bus(&settings, portal).await?;
            }
        }
        Commands::Train {
            from,
            to,
            date,
            watch,
        } => {
            run_train(&settings, &from, &to, date, watch).await?;
        }
        Commands::Stations { city } => {
            if !RAIL_CITIES.contains(&city.as_str()) {
                bail!("unknown rail city {city}");
            }
            let portal = build_portal(&settings)?;
            portal.rail.load_stations().await;
            portal.rail.set_origin_city(&city).await;
            let state = portal.rail.snapshot().await;
            if let Some(e) = &state.errors.stations {
                bail!("{}", e.user_message());
            }
            let options = state.origin_options();
            info!(city = %city, count = options.len(), "Railway stations");
            for station in options {
                info!(id = %station.id, name = %station.name, address = %station.address, "Station");
            }
        }
        Commands::TokenServer { addr } => {
            let creds = settings
                .credentials
                .clone()
                .context("CLIENT_ID and CLIENT_SECRET must be set to serve tokens")?;
            let http = BasicClient::new(settings.http_timeout)?;
            token_server::serve(addr, Arc::new(creds.source(http))).await?;
        }
    }

    Ok(())
}

/// Wires the client stack: timeouts, `$format=JSON`, bearer credentials.
fn build_portal(settings: &Settings) -> Result<Arc<Portal>> {
    let http = Arc::new(BasicClient::new(settings.http_timeout)?);
    let source = settings.token_source(http.clone());
    let credentials = Arc::new(CredentialProvider::with_margin(
        source,
        settings.token_safety_margin,
    ));
    let fetcher = Fetcher::new(
        UrlParam::json_format(http),
        credentials,
        settings.base_url.clone(),
    );
    let api: Arc<dyn TransitApi> = Arc::new(TdxClient::new(fetcher));
    Ok(Arc::new(Portal::new(api)))
}

#[tracing::instrument(skip(settings, query))]
async fn run_bike(
    settings: &Settings,
    city: &str,
    query: StationQuery,
    page: usize,
    watch: bool,
) -> Result<()> {
    let city = cities::find(BIKE_CITIES, city).with_context(|| format!("unknown bike city {city}"))?;
    let portal = build_portal(settings)?;
    portal.bike.select_city(city.code).await;
    render_bike(&portal.bike.snapshot().await, &query, page);

    if !watch {
        return Ok(());
    }

    let p = portal.clone();
    let op: RefreshOp = Arc::new(move || {
        let p = p.clone();
        async move { p.bike.refresh_availability().await }.boxed()
    });
    let task = RepeatingTask::start("bike_availability", settings.bike_refresh, op);
    info!(
        every_secs = settings.bike_refresh.as_secs(),
        "Watching availability. Press Ctrl+C to stop."
    );

    let mut ticker = tokio::time::interval(settings.bike_refresh);
    ticker.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => render_bike(&portal.bike.snapshot().await, &query, page),
        }
    }

    task.stop();
    portal.bike.clear().await;
    Ok(())
}

fn render_bike(state: &BikeState, query: &StationQuery, page: usize) {
    for e in state.errors() {
        warn!(code = e.code(), "{}", e.user_message());
    }
    let page = state.page(query, page);
    info!(
        city = state.city.as_deref().unwrap_or(""),
        total = page.total,
        page = page.page,
        pages = page.page_count,
        updated = ?state.last_updated,
        "Bike stations"
    );
    for s in &page.items {
        let rent = s.available_rent().map_or("?".to_string(), |n| n.to_string());
        let ret = s.available_return().map_or("?".to_string(), |n| n.to_string());
        info!(
            id = %s.station.id,
            name = %s.station.name,
            service = s.station.service_type.map(|t| t.label()).unwrap_or(""),
            rent = %rent,
            rent_level = ?stock_level(s.available_rent()),
            docks = %ret,
            docks_level = ?stock_level(s.available_return()),
            "Station"
        );
    }
}

fn render_route_list(state: &BusState) {
    for e in state.errors.iter() {
        warn!(code = e.code(), "{}", e.user_message());
    }
    let categories: Vec<&str> = state.categories().iter().map(|c| c.label()).collect();
    let routes = state.route_list();
    info!(
        city = state.city.as_deref().unwrap_or(""),
        count = routes.len(),
        categories = ?categories,
        "Bus routes"
    );
    for route in routes {
        info!(
            name = %route.name,
            from = route.departure_stop.as_deref().unwrap_or(""),
            to = route.destination_stop.as_deref().unwrap_or(""),
            first_bus = route.hours.first_bus.as_deref().unwrap_or(""),
            last_bus = route.hours.last_bus.as_deref().unwrap_or(""),
            "Route"
        );
    }
}

fn render_stop_board(state: &BusState) {
    for e in state.errors.iter() {
        warn!(code = e.code(), "{}", e.user_message());
    }
    let tabs: Vec<String> = state.direction_tabs().into_iter().map(|t| t.label).collect();
    info!(
        route = state.selected.as_ref().map(|r| r.name.as_str()).unwrap_or(""),
        direction = ?state.direction,
        tabs = ?tabs,
        "Stop board"
    );
    for board in state.board() {
        info!(operator = board.operator.as_deref().unwrap_or(""), "Operator");
        for row in board.rows {
            info!(
                seq = row.stop.sequence,
                stop = %row.stop.name,
                eta = %row.eta_text,
                vehicles = ?row.vehicles,
                "Stop"
            );
        }
    }
}

async fn watch_bus(settings: &Settings, portal: Arc<Portal>) -> Result<()> {
    let p = portal.clone();
    let op: RefreshOp = Arc::new(move || {
        let p = p.clone();
        async move { p.bus.refresh_live().await }.boxed()
    });
    let countdown = Countdown::start(settings.bus_countdown_secs, settings.error_display, op);
    let mut updates = countdown.subscribe();
    info!(
        every_secs = settings.bus_countdown_secs,
        "Watching live arrivals. Press Ctrl+C to stop."
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut was_refreshing = false;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if was_refreshing && !state.refreshing {
                    if let Some(e) = &state.error {
                        warn!(code = e.code(), "{}", e.user_message());
                    }
                    render_stop_board(&portal.bus.snapshot().await);
                }
                was_refreshing = state.refreshing;
            }
        }
    }

    countdown.stop();
    portal.bus.clear_city().await;
    Ok(())
}

/// Finds a station by id or exact name.
fn find_station<'a>(stations: &'a [RailStation], query: &str) -> Option<&'a RailStation> {
    stations
        .iter()
        .find(|s| s.id == query)
        .or_else(|| stations.iter().find(|s| s.name.zh_tw == query))
}

fn city_of(station: &RailStation) -> Option<&'static str> {
    RAIL_CITIES
        .iter()
        .copied()
        .find(|city| station.address.contains(city))
}

#[tracing::instrument(skip(settings))]
async fn run_train(
    settings: &Settings,
    from: &str,
    to: &str,
    date: Option<NaiveDate>,
    watch: bool,
) -> Result<()> {
    let portal = build_portal(settings)?;
    let rail = &portal.rail;
    rail.load_stations().await;

    let state = rail.snapshot().await;
    if let Some(e) = state.errors.stations.as_ref().or(state.errors.lines.as_ref()) {
        bail!("{}", e.user_message());
    }
    let stations = state.stations.clone().unwrap_or_default();
    let origin = find_station(&stations, from).with_context(|| format!("unknown station {from}"))?;
    let dest = find_station(&stations, to).with_context(|| format!("unknown station {to}"))?;

    rail.set_origin_city(city_of(origin).context("origin station has no known city")?)
        .await;
    rail.set_dest_city(city_of(dest).context("destination station has no known city")?)
        .await;
    rail.select_date(date.unwrap_or_else(|| rail.today())).await?;
    rail.select_origin(&origin.id).await?;
    if let Err(e) = rail.select_dest(&dest.id).await {
        bail!("{}", e.user_message());
    }

    render_rail(&rail.board().await, &origin.name.zh_tw, &dest.name.zh_tw);
    if !watch {
        return Ok(());
    }

    let p = portal.clone();
    let op: RefreshOp = Arc::new(move || {
        let p = p.clone();
        async move { p.rail.refresh_delays().await }.boxed()
    });
    let period = std::time::Duration::from_secs(60);
    let task = RepeatingTask::start("rail_delays", period, op);
    info!("Watching delays. Press Ctrl+C to stop.");

    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => render_rail(&portal.rail.board().await, &origin.name.zh_tw, &dest.name.zh_tw),
        }
    }

    task.stop();
    portal.rail.reset_selection().await;
    Ok(())
}

fn render_rail(board: &RailBoard, origin: &str, dest: &str) {
    info!(from = origin, to = dest, trains = board.rows.len(), "Timetable");
    for row in &board.rows {
        let fmt_time = |t: Option<chrono::NaiveTime>| t.map(|t| t.format("%H:%M").to_string()).unwrap_or_default();
        info!(
            train = %row.journey.train_no,
            kind = %row.journey.train_type,
            class = ?row.journey.class,
            departs = %fmt_time(row.journey.departure),
            arrives = %fmt_time(row.journey.arrival),
            minutes = row.travel_time.map(|d| d.num_minutes()),
            delay = row.delay_minutes,
            nearest = row.nearest,
            "Train"
        );
    }
}

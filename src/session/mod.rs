//! Per-mode orchestration: what is selected, what has been loaded for it,
//! and which resource failed.
//!
//! Every selection change advances a [`Generation`]. Work started for a
//! selection carries the [`Ticket`] it was issued under and its result is
//! dropped if the generation has moved on by the time it lands.

pub mod bike;
pub mod bus;
pub mod rail;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

pub use bike::{BikeSession, BikeState};
pub use bus::{BusErrors, BusSession, BusState};
pub use rail::{RailBoard, RailErrors, RailSession, RailState};

use crate::services::TransitApi;

/// Selection counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Generation(u64);

/// Generation a piece of work was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Generation {
    pub fn advance(&mut self) -> Ticket {
        self.0 += 1;
        Ticket(self.0)
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.0)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.0 == ticket.0
    }
}

/// Wall-clock source for time-relative views.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

/// One independent session per mode over a shared upstream.
pub struct Portal {
    pub bike: BikeSession,
    pub bus: BusSession,
    pub rail: RailSession,
}

impl Portal {
    pub fn new(api: Arc<dyn TransitApi>) -> Self {
        Self::with_clock(api, local_clock())
    }

    pub fn with_clock(api: Arc<dyn TransitApi>, clock: Clock) -> Self {
        Self {
            bike: BikeSession::new(api.clone()),
            bus: BusSession::new(api.clone()),
            rail: RailSession::new(api, clock),
        }
    }
}

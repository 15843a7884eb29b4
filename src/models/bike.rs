use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{GeoPoint, LocalizedName};

/// Bike-share system generation operating a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceType {
    YouBike1,
    YouBike2,
    Moovo,
}

impl ServiceType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ServiceType::YouBike1),
            2 => Some(ServiceType::YouBike2),
            3 => Some(ServiceType::Moovo),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::YouBike1 => "YouBike 1.0",
            ServiceType::YouBike2 => "YouBike 2.0",
            ServiceType::Moovo => "Moovo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    pub id: String,
    pub name: LocalizedName,
    pub address: LocalizedName,
    pub position: Option<GeoPoint>,
    pub capacity: Option<u32>,
    pub service_type: Option<ServiceType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub station_id: String,
    pub available_rent: u32,
    pub available_return: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A station joined with its live availability. `None` means upstream sent
/// no availability record for the station: unknown, not zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BikeStation {
    pub station: Station,
    pub availability: Option<Availability>,
}

impl BikeStation {
    pub fn available_rent(&self) -> Option<u32> {
        self.availability.as_ref().map(|a| a.available_rent)
    }

    pub fn available_return(&self) -> Option<u32> {
        self.availability.as_ref().map(|a| a.available_return)
    }
}

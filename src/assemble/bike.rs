use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::bike::{Availability, BikeStation, ServiceType, Station};
use crate::services::payload::{BikeAvailabilityPayload, BikeStationPayload};

pub fn stations(payloads: Vec<BikeStationPayload>) -> Vec<Station> {
    payloads
        .into_iter()
        .map(|p| Station {
            id: p.station_id,
            name: p.station_name.into(),
            address: p.station_address.into(),
            position: p.station_position.map(Into::into),
            capacity: p.bikes_capacity,
            service_type: p.service_type.and_then(ServiceType::from_code),
        })
        .collect()
}

pub fn availability(payloads: Vec<BikeAvailabilityPayload>) -> Vec<Availability> {
    payloads
        .into_iter()
        .map(|p| Availability {
            station_id: p.station_id,
            available_rent: p.available_rent_bikes.unwrap_or(0),
            available_return: p.available_return_bikes.unwrap_or(0),
            updated_at: p
                .update_time
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc)),
        })
        .collect()
}

/// Joins each station with the availability record carrying its id.
pub fn join(stations: &[Station], availability: &[Availability]) -> Vec<BikeStation> {
    let by_id: HashMap<&str, &Availability> = availability
        .iter()
        .map(|a| (a.station_id.as_str(), a))
        .collect();

    stations
        .iter()
        .map(|s| BikeStation {
            station: s.clone(),
            availability: by_id.get(s.id.as_str()).map(|a| (*a).clone()),
        })
        .collect()
}

use serde::Serialize;

use super::LocalizedName;

/// Travel direction of a (sub-)route as encoded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Direction {
    Outbound,
    Inbound,
    Loop,
    Unknown,
}

impl Direction {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Direction::Outbound,
            1 => Direction::Inbound,
            2 => Direction::Loop,
            _ => Direction::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Operator {
    pub id: String,
    pub name: LocalizedName,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperatingHours {
    pub first_bus: Option<String>,
    pub last_bus: Option<String>,
    pub holiday_first_bus: Option<String>,
    pub holiday_last_bus: Option<String>,
}

/// One flattened `(route, sub-route, direction)` record.
///
/// `name` is the display name: the sub-route name when upstream has one,
/// otherwise the parent route name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusRoute {
    pub route_uid: String,
    pub route_id: Option<String>,
    pub route_name: LocalizedName,
    pub sub_route_uid: Option<String>,
    pub sub_route_id: Option<String>,
    pub name: String,
    pub direction: Direction,
    pub operators: Vec<Operator>,
    pub departure_stop: Option<String>,
    pub destination_stop: Option<String>,
    pub hours: OperatingHours,
}

impl BusRoute {
    pub fn operator_ids(&self) -> Vec<&str> {
        self.operators.iter().map(|o| o.id.as_str()).collect()
    }

    /// Same route, same display name, same operators; direction may differ.
    pub fn is_variant_of(&self, other: &BusRoute) -> bool {
        self.route_uid == other.route_uid
            && self.name == other.name
            && self.operator_ids() == other.operator_ids()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    pub uid: String,
    pub id: Option<String>,
    pub name: LocalizedName,
    pub sequence: u32,
}

/// Ordered stops of one `(route, sub-route, direction)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopSequence {
    pub route_uid: String,
    pub sub_route_uid: Option<String>,
    pub direction: Direction,
    pub operators: Vec<Operator>,
    pub stops: Vec<Stop>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EtaStatus {
    Normal { estimate_seconds: Option<u32> },
    NotDeparted,
    TrafficControlled,
    LastBusPassed,
    NotOperatingToday,
}

impl EtaStatus {
    pub fn from_code(code: u8, estimate_seconds: Option<u32>) -> Option<Self> {
        match code {
            0 => Some(EtaStatus::Normal { estimate_seconds }),
            1 => Some(EtaStatus::NotDeparted),
            2 => Some(EtaStatus::TrafficControlled),
            3 => Some(EtaStatus::LastBusPassed),
            4 => Some(EtaStatus::NotOperatingToday),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eta {
    pub stop_uid: String,
    pub route_uid: String,
    pub direction: Direction,
    pub status: EtaStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveVehicle {
    pub route_uid: String,
    pub direction: Direction,
    pub stop_sequence: u32,
    pub plate_number: String,
    pub duty_status: Option<u8>,
    pub bus_status: Option<u8>,
}

impl LiveVehicle {
    /// Duty status normal (0) or just started (1), bus status normal (0).
    /// Missing fields count as normal.
    pub fn in_service(&self) -> bool {
        matches!(self.duty_status, None | Some(0) | Some(1)) && matches!(self.bus_status, None | Some(0))
    }
}

/// Name-pattern category for the route list tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RouteCategory {
    Number,
    Color,
    Trunk,
    Other,
}

impl RouteCategory {
    pub const ALL: [RouteCategory; 4] = [
        RouteCategory::Number,
        RouteCategory::Color,
        RouteCategory::Trunk,
        RouteCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RouteCategory::Number => "數字",
            RouteCategory::Color => "顏色",
            RouteCategory::Trunk => "幹線",
            RouteCategory::Other => "其他",
        }
    }
}

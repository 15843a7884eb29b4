use std::collections::HashMap;

use crate::models::bus::{
    BusRoute, Direction, Eta, EtaStatus, LiveVehicle, RouteCategory, Stop, StopSequence,
};

/// Category tabs appear only above this many routes.
pub const CATEGORY_TAB_THRESHOLD: usize = 100;

const COLOR_PREFIXES: [char; 6] = ['紅', '藍', '綠', '棕', '橘', '黃'];
const TRUNK_MARKER: &str = "幹線";

/// Classifies a route by its display name.
///
/// Digits optionally followed by one capital letter or 區 is a number route;
/// a colour word followed by a digit is a colour route; anything containing
/// 幹線 is a trunk line.
pub fn classify(name: &str) -> RouteCategory {
    if is_number_name(name) {
        RouteCategory::Number
    } else if is_color_name(name) {
        RouteCategory::Color
    } else if name.contains(TRUNK_MARKER) {
        RouteCategory::Trunk
    } else {
        RouteCategory::Other
    }
}

fn is_number_name(name: &str) -> bool {
    let digits = match name.chars().last() {
        Some(c) if c.is_ascii_uppercase() || c == '區' => &name[..name.len() - c.len_utf8()],
        _ => name,
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_color_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(first), Some(second)) if COLOR_PREFIXES.contains(&first) && second.is_ascii_digit()
    )
}

/// One representative per `(RouteUID, name)`, preferring the outbound
/// variant. First-seen order is kept.
pub fn canonical_routes(routes: &[BusRoute]) -> Vec<&BusRoute> {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut chosen: HashMap<(&str, &str), &BusRoute> = HashMap::new();

    for route in routes {
        let key = (route.route_uid.as_str(), route.name.as_str());
        match chosen.get(&key).copied() {
            None => {
                order.push(key);
                chosen.insert(key, route);
            }
            Some(existing)
                if existing.direction != Direction::Outbound
                    && route.direction == Direction::Outbound =>
            {
                chosen.insert(key, route);
            }
            Some(_) => {}
        }
    }

    order.into_iter().filter_map(|k| chosen.get(&k).copied()).collect()
}

pub fn show_category_tabs(routes: &[BusRoute]) -> bool {
    routes.len() > CATEGORY_TAB_THRESHOLD
}

/// Categories that have at least one outbound route, in tab order.
pub fn available_categories(routes: &[BusRoute]) -> Vec<RouteCategory> {
    RouteCategory::ALL
        .into_iter()
        .filter(|cat| {
            routes
                .iter()
                .any(|r| r.direction == Direction::Outbound && classify(&r.name) == *cat)
        })
        .collect()
}

/// The route list: canonical routes in `category` (all when `None`) whose
/// name contains `search`, sorted by name.
pub fn route_list<'a>(
    routes: &'a [BusRoute],
    category: Option<RouteCategory>,
    search: &str,
) -> Vec<&'a BusRoute> {
    let mut list: Vec<&BusRoute> = canonical_routes(routes)
        .into_iter()
        .filter(|r| category.is_none_or(|cat| classify(&r.name) == cat))
        .filter(|r| r.name.contains(search))
        .collect();
    list.sort_by(|a, b| a.name.cmp(&b.name));
    list
}

/// The variant of `selected` running in `direction`, if upstream has one.
pub fn variant_for<'a>(
    routes: &'a [BusRoute],
    selected: &BusRoute,
    direction: Direction,
) -> Option<&'a BusRoute> {
    routes
        .iter()
        .find(|r| r.direction == direction && r.is_variant_of(selected))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionTab {
    pub direction: Direction,
    pub label: String,
}

/// Outbound tab always; inbound tab only when an inbound variant exists.
pub fn direction_tabs(
    routes: &[BusRoute],
    selected: &BusRoute,
    stops: &[StopSequence],
) -> Vec<DirectionTab> {
    let outbound_label = variant_for(routes, selected, Direction::Outbound)
        .and_then(|r| r.destination_stop.clone())
        .unwrap_or_else(|| "去程".to_string());
    let mut tabs = vec![DirectionTab {
        direction: Direction::Outbound,
        label: format!("往{outbound_label}"),
    }];

    if let Some(inbound) = variant_for(routes, selected, Direction::Inbound) {
        let terminal = stops
            .iter()
            .find(|s| {
                s.route_uid == inbound.route_uid
                    && s.sub_route_uid == inbound.sub_route_uid
                    && s.direction == Direction::Inbound
            })
            .and_then(|s| s.stops.last())
            .map(|stop| stop.name.zh_tw.clone())
            .filter(|name| !name.is_empty());
        let label = terminal
            .or_else(|| inbound.destination_stop.clone())
            .unwrap_or_else(|| "回程".to_string());
        tabs.push(DirectionTab {
            direction: Direction::Inbound,
            label: format!("往{label}"),
        });
    }
    tabs
}

pub fn eta_text(status: Option<&EtaStatus>) -> String {
    match status {
        Some(EtaStatus::Normal {
            estimate_seconds: Some(secs),
        }) => {
            let min = secs / 60;
            match min {
                0 => "進站中".to_string(),
                1 => "即將進站".to_string(),
                m if m < 60 => format!("{m}分"),
                m => format!("{}時{}分", m / 60, m % 60),
            }
        }
        Some(EtaStatus::NotDeparted) => "尚未發車".to_string(),
        Some(EtaStatus::TrafficControlled) => "交管不停靠".to_string(),
        Some(EtaStatus::LastBusPassed) => "末班車已過".to_string(),
        Some(EtaStatus::NotOperatingToday) => "今日未營運".to_string(),
        Some(EtaStatus::Normal {
            estimate_seconds: None,
        })
        | None => "—".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopBoardRow {
    pub stop: Stop,
    pub eta: Option<EtaStatus>,
    pub eta_text: String,
    /// Plates of in-service vehicles at this stop.
    pub vehicles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopBoard {
    pub operator: Option<String>,
    pub rows: Vec<StopBoardRow>,
}

/// Stops of `selected` in `direction` with their ETA and present vehicles.
///
/// A vehicle is present at a stop when its sequence matches the stop's, it
/// is not at the direction's terminal sequence, and it is in service.
pub fn stop_board(
    selected: &BusRoute,
    direction: Direction,
    stops: &[StopSequence],
    etas: &[Eta],
    vehicles: &[LiveVehicle],
) -> Vec<StopBoard> {
    let sequences: Vec<&StopSequence> = stops
        .iter()
        .filter(|s| {
            s.route_uid == selected.route_uid
                && s.direction == direction
                && (selected.sub_route_uid.is_none() || s.sub_route_uid == selected.sub_route_uid)
        })
        .collect();

    let terminal = sequences
        .iter()
        .flat_map(|s| s.stops.iter().map(|stop| stop.sequence))
        .max();

    sequences
        .into_iter()
        .map(|seq| StopBoard {
            operator: seq.operators.first().map(|o| o.name.zh_tw.clone()),
            rows: seq
                .stops
                .iter()
                .map(|stop| {
                    let eta = etas
                        .iter()
                        .find(|e| {
                            e.stop_uid == stop.uid
                                && e.direction == direction
                                && e.route_uid == selected.route_uid
                        })
                        .map(|e| e.status);
                    let here = vehicles
                        .iter()
                        .filter(|v| {
                            v.route_uid == selected.route_uid
                                && v.direction == direction
                                && v.stop_sequence == stop.sequence
                                && Some(v.stop_sequence) != terminal
                                && v.in_service()
                        })
                        .map(|v| v.plate_number.clone())
                        .collect();
                    StopBoardRow {
                        stop: stop.clone(),
                        eta_text: eta_text(eta.as_ref()),
                        eta,
                        vehicles: here,
                    }
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocalizedName;
    use crate::models::bus::{OperatingHours, Operator};

    fn route(uid: &str, name: &str, direction: Direction, dest: &str) -> BusRoute {
        BusRoute {
            route_uid: uid.to_string(),
            route_id: None,
            route_name: LocalizedName::new(name),
            sub_route_uid: Some(format!("{uid}0")),
            sub_route_id: None,
            name: name.to_string(),
            direction,
            operators: vec![Operator {
                id: "100".to_string(),
                name: LocalizedName::new("大都會客運"),
            }],
            departure_stop: Some("撫遠街".to_string()),
            destination_stop: Some(dest.to_string()),
            hours: OperatingHours::default(),
        }
    }

    fn stop(uid: &str, name: &str, sequence: u32) -> Stop {
        Stop {
            uid: uid.to_string(),
            id: None,
            name: LocalizedName::new(name),
            sequence,
        }
    }

    fn vehicle(plate: &str, sequence: u32, duty: Option<u8>) -> LiveVehicle {
        LiveVehicle {
            route_uid: "R1".to_string(),
            direction: Direction::Outbound,
            stop_sequence: sequence,
            plate_number: plate.to_string(),
            duty_status: duty,
            bus_status: Some(0),
        }
    }

    #[test]
    fn test_classify_examples() {
        assert_eq!(classify("307"), RouteCategory::Number);
        assert_eq!(classify("紅28"), RouteCategory::Color);
        assert_eq!(classify("信義幹線"), RouteCategory::Trunk);
        assert_eq!(classify("市民小巴"), RouteCategory::Other);
    }

    #[test]
    fn test_classify_number_suffixes() {
        assert_eq!(classify("12A"), RouteCategory::Number);
        assert_eq!(classify("307區"), RouteCategory::Number);
        assert_eq!(classify("12a"), RouteCategory::Other);
        assert_eq!(classify("A"), RouteCategory::Other);
        assert_eq!(classify("紅"), RouteCategory::Other);
        assert_eq!(classify(""), RouteCategory::Other);
    }

    #[test]
    fn test_canonical_prefers_outbound() {
        let routes = vec![
            route("R1", "307", Direction::Inbound, "撫遠街"),
            route("R1", "307", Direction::Outbound, "板橋前站"),
            route("R2", "紅28", Direction::Outbound, "圓山"),
        ];

        let canonical = canonical_routes(&routes);

        assert_eq!(canonical.len(), 2);
        assert_eq!(canonical[0].direction, Direction::Outbound);
        assert_eq!(canonical[0].route_uid, "R1");
        assert_eq!(canonical[1].route_uid, "R2");
    }

    #[test]
    fn test_route_list_filters_and_sorts() {
        let routes = vec![
            route("R3", "信義幹線", Direction::Outbound, "x"),
            route("R1", "307", Direction::Outbound, "x"),
            route("R4", "285", Direction::Outbound, "x"),
            route("R2", "紅28", Direction::Outbound, "x"),
        ];

        let numbers: Vec<&str> = route_list(&routes, Some(RouteCategory::Number), "")
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(numbers, vec!["285", "307"]);

        let searched = route_list(&routes, None, "28");
        assert_eq!(searched.len(), 2);
    }

    #[test]
    fn test_tabs_threshold_and_available_categories() {
        let few: Vec<BusRoute> = (0..100)
            .map(|i| route(&format!("R{i}"), &i.to_string(), Direction::Outbound, "x"))
            .collect();
        assert!(!show_category_tabs(&few));

        let mut many = few.clone();
        many.push(route("RX", "信義幹線", Direction::Inbound, "x"));
        assert!(show_category_tabs(&many));
        // The trunk route only runs inbound, so it does not earn a tab.
        assert_eq!(available_categories(&many), vec![RouteCategory::Number]);
    }

    #[test]
    fn test_variant_for_and_direction_tabs() {
        let out = route("R1", "307", Direction::Outbound, "板橋前站");
        let mut back = route("R1", "307", Direction::Inbound, "撫遠街");
        back.sub_route_uid = Some("R11".to_string());
        let routes = vec![out.clone(), back.clone()];
        let stops = vec![StopSequence {
            route_uid: "R1".to_string(),
            sub_route_uid: Some("R11".to_string()),
            direction: Direction::Inbound,
            operators: vec![],
            stops: vec![stop("S9", "板橋", 1), stop("S8", "松山車站", 2)],
        }];

        assert_eq!(variant_for(&routes, &out, Direction::Inbound), Some(&back));

        let tabs = direction_tabs(&routes, &out, &stops);
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[0].label, "往板橋前站");
        assert_eq!(tabs[1].label, "往松山車站");

        let solo = direction_tabs(&routes[..1], &out, &[]);
        assert_eq!(solo.len(), 1);
    }

    #[test]
    fn test_variant_requires_same_operators() {
        let out = route("R1", "307", Direction::Outbound, "x");
        let mut back = route("R1", "307", Direction::Inbound, "y");
        back.operators[0].id = "200".to_string();
        assert_eq!(variant_for(&[out.clone(), back], &out, Direction::Inbound), None);
    }

    #[test]
    fn test_eta_text() {
        let normal = |s| EtaStatus::Normal {
            estimate_seconds: Some(s),
        };
        assert_eq!(eta_text(Some(&normal(30))), "進站中");
        assert_eq!(eta_text(Some(&normal(90))), "即將進站");
        assert_eq!(eta_text(Some(&normal(600))), "10分");
        assert_eq!(eta_text(Some(&normal(3900))), "1時5分");
        assert_eq!(eta_text(Some(&EtaStatus::NotOperatingToday)), "今日未營運");
        assert_eq!(eta_text(None), "—");
    }

    #[test]
    fn test_stop_board_places_vehicles_but_not_at_terminal() {
        let selected = route("R1", "307", Direction::Outbound, "x");
        let stops = vec![StopSequence {
            route_uid: "R1".to_string(),
            sub_route_uid: Some("R10".to_string()),
            direction: Direction::Outbound,
            operators: vec![Operator {
                id: "100".to_string(),
                name: LocalizedName::new("大都會客運"),
            }],
            stops: vec![stop("S1", "A", 1), stop("S2", "B", 2), stop("S3", "C", 3)],
        }];
        let etas = vec![Eta {
            stop_uid: "S2".to_string(),
            route_uid: "R1".to_string(),
            direction: Direction::Outbound,
            status: EtaStatus::Normal {
                estimate_seconds: Some(240),
            },
        }];
        let vehicles = vec![
            vehicle("AAA-001", 1, Some(0)),
            vehicle("AAA-002", 3, Some(0)),
            vehicle("AAA-003", 2, Some(2)),
        ];

        let board = stop_board(&selected, Direction::Outbound, &stops, &etas, &vehicles);

        assert_eq!(board.len(), 1);
        assert_eq!(board[0].operator.as_deref(), Some("大都會客運"));
        let rows = &board[0].rows;
        assert_eq!(rows[0].vehicles, vec!["AAA-001"]);
        assert!(rows[1].vehicles.is_empty());
        assert!(rows[2].vehicles.is_empty());
        assert_eq!(rows[1].eta_text, "4分");
        assert_eq!(rows[0].eta_text, "—");
    }
}

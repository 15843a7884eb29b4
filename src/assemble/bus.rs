use crate::models::LocalizedName;
use crate::models::bus::{
    BusRoute, Direction, Eta, EtaStatus, LiveVehicle, OperatingHours, Operator, Stop,
    StopSequence,
};
use crate::services::payload::{
    BusRoutePayload, EtaPayload, OperatorPayload, RealTimeNearStopPayload, StopOfRoutePayload,
};

fn operators(payloads: &[OperatorPayload]) -> Vec<Operator> {
    payloads
        .iter()
        .map(|o| Operator {
            id: o.operator_id.clone(),
            name: o.operator_name.clone().into(),
        })
        .collect()
}

/// Expands every route into one record per sub-route. A route without
/// sub-routes yields a single outbound record named after the route.
///
/// Each record keeps the parent `RouteUID` and operators so stops, ETAs and
/// vehicles can be joined back to it.
pub fn flatten_routes(payloads: Vec<BusRoutePayload>) -> Vec<BusRoute> {
    let mut flat = Vec::with_capacity(payloads.len() * 2);

    for route in payloads {
        let route_name: LocalizedName = route.route_name.clone().into();
        let ops = operators(&route.operators);

        match route.sub_routes.as_deref() {
            Some(subs) if !subs.is_empty() => {
                for sub in subs {
                    let sub_name: LocalizedName = sub.sub_route_name.clone().into();
                    let name = if sub_name.is_empty() {
                        route_name.zh_tw.clone()
                    } else {
                        sub_name.zh_tw
                    };
                    flat.push(BusRoute {
                        route_uid: route.route_uid.clone(),
                        route_id: route.route_id.clone(),
                        route_name: route_name.clone(),
                        sub_route_uid: Some(sub.sub_route_uid.clone()),
                        sub_route_id: sub.sub_route_id.clone(),
                        name,
                        direction: Direction::from_code(sub.direction.unwrap_or(0)),
                        operators: ops.clone(),
                        departure_stop: route.departure_stop_name_zh.clone(),
                        destination_stop: route.destination_stop_name_zh.clone(),
                        hours: OperatingHours {
                            first_bus: sub.first_bus_time.clone(),
                            last_bus: sub.last_bus_time.clone(),
                            holiday_first_bus: sub.holiday_first_bus_time.clone(),
                            holiday_last_bus: sub.holiday_last_bus_time.clone(),
                        },
                    });
                }
            }
            _ => flat.push(BusRoute {
                route_uid: route.route_uid.clone(),
                route_id: route.route_id.clone(),
                name: route_name.zh_tw.clone(),
                route_name,
                sub_route_uid: None,
                sub_route_id: None,
                direction: Direction::Outbound,
                operators: ops,
                departure_stop: route.departure_stop_name_zh,
                destination_stop: route.destination_stop_name_zh,
                hours: OperatingHours::default(),
            }),
        }
    }

    flat
}

pub fn stop_sequences(payloads: Vec<StopOfRoutePayload>) -> Vec<StopSequence> {
    payloads
        .into_iter()
        .map(|p| {
            let mut stops: Vec<Stop> = p
                .stops
                .into_iter()
                .map(|s| Stop {
                    uid: s.stop_uid,
                    id: s.stop_id,
                    name: s.stop_name.into(),
                    sequence: s.stop_sequence,
                })
                .collect();
            stops.sort_by_key(|s| s.sequence);

            StopSequence {
                route_uid: p.route_uid,
                sub_route_uid: p.sub_route_uid,
                direction: Direction::from_code(p.direction),
                operators: operators(&p.operators),
                stops,
            }
        })
        .collect()
}

/// Records with an unknown status code are dropped. A missing status with an
/// estimate is read as normal.
pub fn arrivals(payloads: Vec<EtaPayload>) -> Vec<Eta> {
    payloads
        .into_iter()
        .filter_map(|p| {
            let estimate = p.estimate_time.and_then(|t| u32::try_from(t).ok());
            let status = match p.stop_status {
                Some(code) => EtaStatus::from_code(code, estimate)?,
                None if estimate.is_some() => EtaStatus::Normal {
                    estimate_seconds: estimate,
                },
                None => return None,
            };
            Some(Eta {
                stop_uid: p.stop_uid,
                route_uid: p.route_uid,
                direction: Direction::from_code(p.direction),
                status,
            })
        })
        .collect()
}

pub fn live_vehicles(payloads: Vec<RealTimeNearStopPayload>) -> Vec<LiveVehicle> {
    payloads
        .into_iter()
        .map(|p| LiveVehicle {
            route_uid: p.route_uid,
            direction: Direction::from_code(p.direction),
            stop_sequence: p.stop_sequence,
            plate_number: p.plate_numb,
            duty_status: p.duty_status,
            bus_status: p.bus_status,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::payload::{NameType, SubRoutePayload};

    fn name(s: &str) -> NameType {
        NameType {
            zh_tw: Some(s.to_string()),
            en: None,
        }
    }

    fn sub(uid: &str, sub_name: &str, direction: u8) -> SubRoutePayload {
        SubRoutePayload {
            sub_route_uid: uid.to_string(),
            sub_route_id: None,
            sub_route_name: name(sub_name),
            direction: Some(direction),
            headsign: None,
            first_bus_time: Some("0530".to_string()),
            last_bus_time: Some("2300".to_string()),
            holiday_first_bus_time: None,
            holiday_last_bus_time: None,
        }
    }

    fn route(uid: &str, route_name: &str, subs: Option<Vec<SubRoutePayload>>) -> BusRoutePayload {
        BusRoutePayload {
            route_uid: uid.to_string(),
            route_id: None,
            route_name: name(route_name),
            operators: vec![OperatorPayload {
                operator_id: "100".to_string(),
                operator_name: name("大都會客運"),
                operator_code: None,
            }],
            sub_routes: subs,
            departure_stop_name_zh: Some("撫遠街".to_string()),
            destination_stop_name_zh: Some("板橋前站".to_string()),
            bus_route_type: None,
            city: None,
        }
    }

    #[test]
    fn test_n_sub_routes_make_n_records_with_parent_fields() {
        let payload = route(
            "TPE10723",
            "307",
            Some(vec![
                sub("TPE107230", "307", 0),
                sub("TPE107231", "307", 1),
                sub("TPE107232", "307區", 0),
            ]),
        );

        let flat = flatten_routes(vec![payload]);

        assert_eq!(flat.len(), 3);
        for r in &flat {
            assert_eq!(r.route_uid, "TPE10723");
            assert_eq!(r.operator_ids(), vec!["100"]);
        }
        assert_eq!(flat[1].direction, Direction::Inbound);
        assert_eq!(flat[2].name, "307區");
        assert_eq!(flat[0].hours.first_bus.as_deref(), Some("0530"));
    }

    #[test]
    fn test_route_without_sub_routes_keeps_route_name() {
        let flat = flatten_routes(vec![route("TPE1", "市民小巴", None)]);

        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].name, "市民小巴");
        assert_eq!(flat[0].direction, Direction::Outbound);
        assert_eq!(flat[0].sub_route_uid, None);
    }

    #[test]
    fn test_empty_sub_route_name_falls_back_to_route_name() {
        let flat = flatten_routes(vec![route("TPE1", "紅28", Some(vec![sub("S", "", 0)]))]);
        assert_eq!(flat[0].name, "紅28");
    }

    #[test]
    fn test_arrival_status_mapping() {
        let eta = |status: Option<u8>, estimate: Option<i64>| EtaPayload {
            stop_uid: "S1".to_string(),
            route_uid: "R".to_string(),
            sub_route_uid: None,
            direction: 0,
            estimate_time: estimate,
            stop_status: status,
            plate_numb: None,
        };

        let out = arrivals(vec![
            eta(Some(0), Some(125)),
            eta(Some(3), None),
            eta(Some(9), None),
            eta(None, Some(60)),
            eta(None, None),
        ]);

        assert_eq!(out.len(), 3);
        assert_eq!(
            out[0].status,
            EtaStatus::Normal {
                estimate_seconds: Some(125)
            }
        );
        assert_eq!(out[1].status, EtaStatus::LastBusPassed);
        assert_eq!(
            out[2].status,
            EtaStatus::Normal {
                estimate_seconds: Some(60)
            }
        );
    }
}

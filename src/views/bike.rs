use std::cmp::Ordering;

use crate::models::bike::BikeStation;

pub const STATIONS_PER_PAGE: usize = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StationFilter {
    #[default]
    All,
    /// At least one bike to rent.
    Available,
    /// No bikes to rent.
    Empty,
    /// More than five free docks.
    Space,
    /// No free docks.
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StationSort {
    #[default]
    Name,
    /// Most rentable bikes first.
    Bikes,
    /// Most free docks first.
    Spaces,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationQuery {
    pub filter: StationFilter,
    pub sort: StationSort,
    pub search: String,
}

/// Colour bucket for a count of bikes or docks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    Unknown,
    Empty,
    Low,
    Plenty,
}

pub fn stock_level(count: Option<u32>) -> StockLevel {
    match count {
        None => StockLevel::Unknown,
        Some(0) => StockLevel::Empty,
        Some(n) if n < 5 => StockLevel::Low,
        Some(_) => StockLevel::Plenty,
    }
}

/// Stations with unknown availability only pass [`StationFilter::All`].
pub fn matches_filter(station: &BikeStation, filter: StationFilter) -> bool {
    let (rent, ret) = (station.available_rent(), station.available_return());
    match filter {
        StationFilter::All => true,
        StationFilter::Available => rent.is_some_and(|n| n > 0),
        StationFilter::Empty => rent == Some(0),
        StationFilter::Space => ret.is_some_and(|n| n > 5),
        StationFilter::Full => ret == Some(0),
    }
}

/// Case-insensitive substring match on name or address.
pub fn matches_search(station: &BikeStation, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    station.station.name.zh_tw.to_lowercase().contains(&needle)
        || station.station.address.zh_tw.to_lowercase().contains(&needle)
}

// Known counts descending, unknown last.
fn by_count_desc(a: Option<u32>, b: Option<u32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn display_stations<'a>(stations: &'a [BikeStation], query: &StationQuery) -> Vec<&'a BikeStation> {
    let mut out: Vec<&BikeStation> = stations
        .iter()
        .filter(|s| matches_filter(s, query.filter))
        .filter(|s| matches_search(s, &query.search))
        .collect();

    match query.sort {
        StationSort::Name => out.sort_by(|a, b| a.station.name.zh_tw.cmp(&b.station.name.zh_tw)),
        StationSort::Bikes => out.sort_by(|a, b| by_count_desc(a.available_rent(), b.available_rent())),
        StationSort::Spaces => {
            out.sort_by(|a, b| by_count_desc(a.available_return(), b.available_return()))
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocalizedName;
    use crate::models::bike::{Availability, Station};

    fn station(id: &str, name: &str, counts: Option<(u32, u32)>) -> BikeStation {
        BikeStation {
            station: Station {
                id: id.to_string(),
                name: LocalizedName::new(name),
                address: LocalizedName::new(format!("{name}路一段")),
                position: None,
                capacity: None,
                service_type: None,
            },
            availability: counts.map(|(rent, ret)| Availability {
                station_id: id.to_string(),
                available_rent: rent,
                available_return: ret,
                updated_at: None,
            }),
        }
    }

    fn fixture() -> Vec<BikeStation> {
        vec![
            station("1", "捷運市政府站", Some((0, 30))),
            station("2", "台北車站", Some((12, 3))),
            station("3", "Xinyi Plaza", None),
            station("4", "大安森林公園", Some((4, 0))),
        ]
    }

    fn ids(list: &[&BikeStation]) -> Vec<String> {
        list.iter().map(|s| s.station.id.clone()).collect()
    }

    #[test]
    fn test_unknown_availability_only_in_all() {
        let stations = fixture();
        for filter in [
            StationFilter::Available,
            StationFilter::Empty,
            StationFilter::Space,
            StationFilter::Full,
        ] {
            assert!(!matches_filter(&stations[2], filter));
        }
        assert!(matches_filter(&stations[2], StationFilter::All));
    }

    #[test]
    fn test_filters() {
        let stations = fixture();
        let query = |filter| StationQuery {
            filter,
            ..Default::default()
        };

        let mut available = ids(&display_stations(&stations, &query(StationFilter::Available)));
        available.sort();
        assert_eq!(available, vec!["2", "4"]);
        assert_eq!(ids(&display_stations(&stations, &query(StationFilter::Empty))), vec!["1"]);
        assert_eq!(ids(&display_stations(&stations, &query(StationFilter::Space))), vec!["1"]);
        assert_eq!(ids(&display_stations(&stations, &query(StationFilter::Full))), vec!["4"]);
    }

    #[test]
    fn test_sort_by_bikes_puts_unknown_last() {
        let stations = fixture();
        let query = StationQuery {
            sort: StationSort::Bikes,
            ..Default::default()
        };
        assert_eq!(ids(&display_stations(&stations, &query)), vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn test_search_is_case_insensitive_on_name_or_address() {
        let stations = fixture();
        let query = StationQuery {
            search: "xinyi".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&display_stations(&stations, &query)), vec!["3"]);

        let by_address = StationQuery {
            search: "森林公園路".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&display_stations(&stations, &by_address)), vec!["4"]);
    }

    #[test]
    fn test_stock_level() {
        assert_eq!(stock_level(None), StockLevel::Unknown);
        assert_eq!(stock_level(Some(0)), StockLevel::Empty);
        assert_eq!(stock_level(Some(4)), StockLevel::Low);
        assert_eq!(stock_level(Some(5)), StockLevel::Plenty);
    }
}

//! City catalogs offered by each mode's picker.

/// An upstream city code with its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct City {
    pub code: &'static str,
    pub name: &'static str,
}

const fn city(code: &'static str, name: &'static str) -> City {
    City { code, name }
}

/// Cities with a public bike-share feed.
pub const BIKE_CITIES: &[City] = &[
    city("Taipei", "臺北市"),
    city("NewTaipei", "新北市"),
    city("Taoyuan", "桃園市"),
    city("Taichung", "臺中市"),
    city("Tainan", "臺南市"),
    city("Kaohsiung", "高雄市"),
    city("Hsinchu", "新竹市"),
    city("HsinchuCounty", "新竹縣"),
    city("MiaoliCounty", "苗栗縣"),
    city("ChanghuaCounty", "彰化縣"),
    city("YunlinCounty", "雲林縣"),
    city("Chiayi", "嘉義市"),
    city("ChiayiCounty", "嘉義縣"),
    city("PingtungCounty", "屏東縣"),
    city("TaitungCounty", "臺東縣"),
];

pub const BUS_CITIES: &[City] = &[
    city("Taipei", "臺北市"),
    city("NewTaipei", "新北市"),
    city("Keelung", "基隆市"),
    city("YilanCounty", "宜蘭縣"),
    city("Taoyuan", "桃園市"),
    city("HsinchuCounty", "新竹縣"),
    city("Hsinchu", "新竹市"),
    city("MiaoliCounty", "苗栗縣"),
    city("Taichung", "臺中市"),
    city("ChanghuaCounty", "彰化縣"),
    city("NantouCounty", "南投縣"),
    city("YunlinCounty", "雲林縣"),
    city("ChiayiCounty", "嘉義縣"),
    city("Chiayi", "嘉義市"),
    city("Tainan", "臺南市"),
    city("Kaohsiung", "高雄市"),
    city("PingtungCounty", "屏東縣"),
    city("TaitungCounty", "臺東縣"),
    city("HualienCounty", "花蓮縣"),
    city("PenghuCounty", "澎湖縣"),
    city("KinmenCounty", "金門縣"),
    city("LienchiangCounty", "連江縣"),
];

/// Railway stations are matched to a city by address, so the rail picker
/// uses display names only.
pub const RAIL_CITIES: &[&str] = &[
    "基隆市", "臺北市", "新北市", "桃園市", "新竹市", "新竹縣", "宜蘭縣", "苗栗縣", "臺中市",
    "彰化縣", "南投縣", "雲林縣", "嘉義市", "嘉義縣", "臺南市", "高雄市", "屏東縣", "花蓮縣",
    "臺東縣",
];

/// Looks a city up by code or display name.
pub fn find<'a>(catalog: &'a [City], query: &str) -> Option<&'a City> {
    catalog
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(query) || c.name == query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_code_or_name() {
        assert_eq!(find(BIKE_CITIES, "taipei").map(|c| c.name), Some("臺北市"));
        assert_eq!(find(BUS_CITIES, "金門縣").map(|c| c.code), Some("KinmenCounty"));
        assert!(find(BIKE_CITIES, "KinmenCounty").is_none());
    }
}

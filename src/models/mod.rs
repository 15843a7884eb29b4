//! Normalized, display-ready records produced by [`crate::assemble`].
//!
//! Values are immutable once assembled; refreshes build new ones.

pub mod bike;
pub mod bus;
pub mod rail;

use serde::Serialize;

use crate::services::payload::{NameType, PointType};

/// A name with its Traditional Chinese form always present (possibly empty)
/// and the English form when upstream supplies one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct LocalizedName {
    pub zh_tw: String,
    pub en: Option<String>,
}

impl LocalizedName {
    pub fn new(zh_tw: impl Into<String>) -> Self {
        Self {
            zh_tw: zh_tw.into(),
            en: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.zh_tw.is_empty()
    }
}

impl From<NameType> for LocalizedName {
    fn from(name: NameType) -> Self {
        Self {
            zh_tw: name.zh_tw.unwrap_or_default(),
            en: name.en,
        }
    }
}

impl std::fmt::Display for LocalizedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.zh_tw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl From<PointType> for GeoPoint {
    fn from(p: PointType) -> Self {
        Self {
            lat: p.lat,
            lon: p.lon,
        }
    }
}

pub mod payload;
pub mod transit_api;

pub use transit_api::TransitApi;

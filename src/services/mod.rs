//! Business logic services

pub mod fleet;
pub mod geo;
pub mod geocoding;
pub mod import;
pub mod nominatim;
pub mod planner;
pub mod render;
pub mod route_builder;

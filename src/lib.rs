//! Crescent Eats: a halal restaurant directory service.
//!
//! The centerpiece is the listing query resolver in [`listing`]: plain
//! listings are served through a read-through cache with a 300 second
//! TTL, while proximity queries (lat/lng plus an optional radius in
//! kilometers) always compute fresh, annotating and sorting records by
//! Haversine distance. Write paths geocode street addresses through a
//! two-provider fallback and clear the cached listings on every mutation.

pub mod cache;
pub mod geo;
pub mod geocode;
pub mod listing;
pub mod model;
pub mod server;
pub mod store;

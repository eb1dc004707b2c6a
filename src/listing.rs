//! The listing query resolver.
//!
//! Non-proximity queries go through a read-through cache keyed by the
//! query parameters (TTL 300 s). Proximity queries always compute fresh
//! against the store: each located record is annotated with its Haversine
//! distance from the query point, the optional radius cutoff is applied,
//! and the result is sorted nearest-first. Records without coordinates
//! never appear in proximity results.

use std::cmp::Ordering;

use thiserror::Error;
use tracing::warn;

use crate::cache::{CacheError, ListingCache};
use crate::geo::{self, Point};
use crate::model::RestaurantView;
use crate::store::{RestaurantStore, StoreError};

/// Seconds a cached listing stays valid.
pub const LISTING_TTL_SECS: u64 = 300;

/// Base cache key for the un-scoped listing.
pub const LISTING_KEY: &str = "restaurants:all";

/// Every key the resolver can write. Mutations clear all of them;
/// proximity queries never touch the cache, so their key variants are
/// composed but never stored.
pub const CACHED_LISTING_KEYS: [&str; 2] = [LISTING_KEY, "restaurants:all:featured"];

/// Resolver failure, by collaborator. The HTTP boundary collapses both to
/// an empty listing but logs them distinguishably.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("backing store query failed: {0}")]
    Store(#[from] StoreError),

    #[error("listing cache unavailable: {0}")]
    Cache(#[from] CacheError),
}

/// Query parameter rejection. Surfaced to the client as a 400.
#[derive(Debug, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("lat and lng must be supplied together")]
    HalfCoordinates,

    #[error("lat must be a finite number in -90..90 and lng a finite number in -180..180")]
    CoordinatesOutOfRange,

    #[error("radius must be a finite number greater than zero")]
    InvalidRadius,

    #[error("radius requires lat and lng")]
    RadiusRequiresCoordinates,
}

/// A validated listing query. Construction is the only way to get one, so
/// the resolver never sees half-supplied coordinates or non-finite values.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    origin: Option<Point>,
    radius: Option<f64>,
    featured: bool,
}

impl ListingQuery {
    pub fn new(
        lat: Option<f64>,
        lng: Option<f64>,
        radius: Option<f64>,
        featured: bool,
    ) -> Result<Self, QueryError> {
        let origin = match (lat, lng) {
            (Some(lat), Some(lng)) => {
                let point = Point::new(lat, lng);
                if !point.in_range() {
                    return Err(QueryError::CoordinatesOutOfRange);
                }
                Some(point)
            }
            (None, None) => None,
            _ => return Err(QueryError::HalfCoordinates),
        };

        if let Some(radius) = radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(QueryError::InvalidRadius);
            }
            if origin.is_none() {
                return Err(QueryError::RadiusRequiresCoordinates);
            }
        }

        Ok(Self {
            origin,
            radius,
            featured,
        })
    }

    pub fn origin(&self) -> Option<Point> {
        self.origin
    }

    pub fn is_proximity(&self) -> bool {
        self.origin.is_some()
    }

    pub fn featured(&self) -> bool {
        self.featured
    }
}

/// Compose the cache key for a query. Each present parameter appends its
/// suffix in a fixed order, so every distinct parameter combination maps
/// to a distinct key.
pub fn compose_key(query: &ListingQuery) -> String {
    let mut key = String::from(LISTING_KEY);
    if query.featured {
        key.push_str(":featured");
    }
    if let Some(origin) = query.origin {
        key.push_str(&format!(":lat={}:lng={}", origin.lat, origin.lng));
    }
    if let Some(radius) = query.radius {
        key.push_str(&format!(":radius={radius}"));
    }
    key
}

/// Resolve a listing query against the injected store and cache.
pub async fn resolve(
    store: &dyn RestaurantStore,
    cache: &dyn ListingCache,
    query: &ListingQuery,
) -> Result<Vec<RestaurantView>, ListingError> {
    let key = compose_key(query);

    if !query.is_proximity() {
        if let Some(raw) = cache.get(&key).await? {
            match serde_json::from_str::<Vec<RestaurantView>>(&raw) {
                Ok(views) => return Ok(views),
                // treat an undecodable entry as a miss; it gets overwritten below
                Err(e) => warn!(key = %key, error = %e, "discarding undecodable cache entry"),
            }
        }
    }

    let rows = store.list(query.featured).await?;
    let views: Vec<RestaurantView> = rows.into_iter().map(RestaurantView::from).collect();

    if let Some(origin) = query.origin {
        let mut located = Vec::with_capacity(views.len());
        for mut view in views {
            let point = match (view.restaurant.latitude, view.restaurant.longitude) {
                (Some(lat), Some(lng)) => Point::new(lat, lng),
                _ => continue,
            };
            let distance = geo::haversine_km(origin, point);
            if query.radius.is_some_and(|radius| distance > radius) {
                continue;
            }
            view.distance = Some(distance);
            located.push(view);
        }
        // stable sort: equal distances keep store order
        located.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
        return Ok(located);
    }

    match serde_json::to_string(&views) {
        Ok(raw) => {
            // population is best-effort; a failed write means the next request recomputes
            if let Err(e) = cache.set(&key, &raw, LISTING_TTL_SECS).await {
                warn!(key = %key, error = %e, "listing cache population failed");
            }
        }
        Err(e) => warn!(error = %e, "listing payload did not serialize for caching"),
    }

    Ok(views)
}

/// Clear every cacheable listing key. Called after any mutation. Failures
/// are logged and swallowed; a write never fails because the cache is
/// down, at the cost of serving stale listings for up to the TTL.
pub async fn invalidate(cache: &dyn ListingCache) {
    for key in CACHED_LISTING_KEYS {
        if let Err(e) = cache.del(key).await {
            warn!(key, error = %e, "listing cache invalidation failed");
        }
    }
}

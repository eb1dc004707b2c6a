use std::sync::Arc;

use crate::cache::ListingCache;
use crate::geocode::Geocoder;
use crate::store::JsonStore;

pub struct AppState {
    pub store: Arc<JsonStore>,
    pub cache: Arc<dyn ListingCache>,
    pub geocoder: Arc<Geocoder>,
}

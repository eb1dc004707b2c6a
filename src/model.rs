//! Directory records and their wire shapes.
//!
//! All JSON field names are camelCase. The halal-certification flags are
//! carried through verbatim; the service never interprets them beyond
//! storing and returning them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A restaurant record as persisted in the backing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub cuisine_type: String,
    pub address: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub has_prayer_room: bool,
    #[serde(default)]
    pub has_outdoor_seating: bool,
    #[serde(default)]
    pub has_high_chair: bool,
    #[serde(default)]
    pub serves_alcohol: bool,
    #[serde(default)]
    pub is_fully_halal: bool,
    #[serde(default)]
    pub is_zabiha: bool,
    #[serde(default)]
    pub is_partially_halal: bool,
    #[serde(default)]
    pub partially_halal_chicken: bool,
    #[serde(default)]
    pub partially_halal_lamb: bool,
    #[serde(default)]
    pub partially_halal_beef: bool,
    #[serde(default)]
    pub partially_halal_goat: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub zabiha_chicken: bool,
    #[serde(default)]
    pub zabiha_lamb: bool,
    #[serde(default)]
    pub zabiha_beef: bool,
    #[serde(default)]
    pub zabiha_goat: bool,
    #[serde(default)]
    pub zabiha_verified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub zabiha_verified_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub brand_id: Option<String>,
    /// Absent when geocoding failed or was never run.
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_featured: bool,
}

/// A user comment with a 1-5 rating and an optional image reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub author_name: String,
    pub content: String,
    pub rating: u8,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Valid comment ratings, inclusive.
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;

/// A store row: the record joined with its comment count.
#[derive(Debug, Clone)]
pub struct RestaurantRow {
    pub restaurant: Restaurant,
    pub comment_count: u64,
}

/// The public listing shape. `distance` (kilometers) is present only in
/// proximity mode; it is never serialized as null in plain listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantView {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub comment_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<RestaurantRow> for RestaurantView {
    fn from(row: RestaurantRow) -> Self {
        Self {
            restaurant: row.restaurant,
            comment_count: row.comment_count,
            distance: None,
        }
    }
}

/// Creation payload. Coordinates are never accepted from the client; they
/// come from the geocoder.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRestaurant {
    pub name: String,
    pub cuisine_type: String,
    pub address: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_range: Option<String>,
    #[serde(default)]
    pub has_prayer_room: bool,
    #[serde(default)]
    pub has_outdoor_seating: bool,
    #[serde(default)]
    pub has_high_chair: bool,
    #[serde(default)]
    pub serves_alcohol: bool,
    #[serde(default)]
    pub is_fully_halal: bool,
    #[serde(default)]
    pub is_zabiha: bool,
    #[serde(default)]
    pub is_partially_halal: bool,
    #[serde(default)]
    pub partially_halal_chicken: bool,
    #[serde(default)]
    pub partially_halal_lamb: bool,
    #[serde(default)]
    pub partially_halal_beef: bool,
    #[serde(default)]
    pub partially_halal_goat: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub zabiha_chicken: bool,
    #[serde(default)]
    pub zabiha_lamb: bool,
    #[serde(default)]
    pub zabiha_beef: bool,
    #[serde(default)]
    pub zabiha_goat: bool,
    #[serde(default)]
    pub zabiha_verified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub zabiha_verified_by: Option<String>,
    #[serde(default)]
    pub brand_id: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl NewRestaurant {
    /// Materialize a record with a fresh id and timestamps. Coordinates
    /// are filled in by the caller after geocoding.
    pub fn into_restaurant(self, now: DateTime<Utc>) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            name: self.name,
            cuisine_type: self.cuisine_type,
            address: self.address,
            description: self.description,
            price_range: self.price_range,
            has_prayer_room: self.has_prayer_room,
            has_outdoor_seating: self.has_outdoor_seating,
            has_high_chair: self.has_high_chair,
            serves_alcohol: self.serves_alcohol,
            is_fully_halal: self.is_fully_halal,
            is_zabiha: self.is_zabiha,
            is_partially_halal: self.is_partially_halal,
            partially_halal_chicken: self.partially_halal_chicken,
            partially_halal_lamb: self.partially_halal_lamb,
            partially_halal_beef: self.partially_halal_beef,
            partially_halal_goat: self.partially_halal_goat,
            image_url: self.image_url,
            zabiha_chicken: self.zabiha_chicken,
            zabiha_lamb: self.zabiha_lamb,
            zabiha_beef: self.zabiha_beef,
            zabiha_goat: self.zabiha_goat,
            zabiha_verified: self.zabiha_verified,
            zabiha_verified_by: self.zabiha_verified_by,
            created_at: now,
            updated_at: now,
            brand_id: self.brand_id,
            latitude: None,
            longitude: None,
            is_featured: self.is_featured,
        }
    }
}

/// Partial update payload. Only present fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantPatch {
    pub name: Option<String>,
    pub cuisine_type: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub price_range: Option<String>,
    pub has_prayer_room: Option<bool>,
    pub has_outdoor_seating: Option<bool>,
    pub has_high_chair: Option<bool>,
    pub serves_alcohol: Option<bool>,
    pub is_fully_halal: Option<bool>,
    pub is_zabiha: Option<bool>,
    pub is_partially_halal: Option<bool>,
    pub partially_halal_chicken: Option<bool>,
    pub partially_halal_lamb: Option<bool>,
    pub partially_halal_beef: Option<bool>,
    pub partially_halal_goat: Option<bool>,
    pub image_url: Option<String>,
    pub zabiha_chicken: Option<bool>,
    pub zabiha_lamb: Option<bool>,
    pub zabiha_beef: Option<bool>,
    pub zabiha_goat: Option<bool>,
    pub zabiha_verified: Option<DateTime<Utc>>,
    pub zabiha_verified_by: Option<String>,
    pub brand_id: Option<String>,
    pub is_featured: Option<bool>,
}

impl RestaurantPatch {
    /// Apply to an existing record. Returns true when the address changed,
    /// which means the caller must re-geocode.
    pub fn apply(self, r: &mut Restaurant) -> bool {
        let mut address_changed = false;

        if let Some(v) = self.name { r.name = v; }
        if let Some(v) = self.cuisine_type { r.cuisine_type = v; }
        if let Some(v) = self.address {
            if v != r.address {
                address_changed = true;
            }
            r.address = v;
        }
        if let Some(v) = self.description { r.description = Some(v); }
        if let Some(v) = self.price_range { r.price_range = Some(v); }
        if let Some(v) = self.has_prayer_room { r.has_prayer_room = v; }
        if let Some(v) = self.has_outdoor_seating { r.has_outdoor_seating = v; }
        if let Some(v) = self.has_high_chair { r.has_high_chair = v; }
        if let Some(v) = self.serves_alcohol { r.serves_alcohol = v; }
        if let Some(v) = self.is_fully_halal { r.is_fully_halal = v; }
        if let Some(v) = self.is_zabiha { r.is_zabiha = v; }
        if let Some(v) = self.is_partially_halal { r.is_partially_halal = v; }
        if let Some(v) = self.partially_halal_chicken { r.partially_halal_chicken = v; }
        if let Some(v) = self.partially_halal_lamb { r.partially_halal_lamb = v; }
        if let Some(v) = self.partially_halal_beef { r.partially_halal_beef = v; }
        if let Some(v) = self.partially_halal_goat { r.partially_halal_goat = v; }
        if let Some(v) = self.image_url { r.image_url = Some(v); }
        if let Some(v) = self.zabiha_chicken { r.zabiha_chicken = v; }
        if let Some(v) = self.zabiha_lamb { r.zabiha_lamb = v; }
        if let Some(v) = self.zabiha_beef { r.zabiha_beef = v; }
        if let Some(v) = self.zabiha_goat { r.zabiha_goat = v; }
        if let Some(v) = self.zabiha_verified { r.zabiha_verified = Some(v); }
        if let Some(v) = self.zabiha_verified_by { r.zabiha_verified_by = Some(v); }
        if let Some(v) = self.brand_id { r.brand_id = Some(v); }
        if let Some(v) = self.is_featured { r.is_featured = v; }

        address_changed
    }
}

/// New comment payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub author_name: String,
    pub content: String,
    pub rating: u8,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[cfg(test)]
impl Restaurant {
    /// Minimal record fixture shared by the crate's test modules.
    pub(crate) fn fixture(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            cuisine_type: "Levantine".into(),
            address: format!("{name} street 1"),
            description: None,
            price_range: None,
            has_prayer_room: false,
            has_outdoor_seating: false,
            has_high_chair: false,
            serves_alcohol: false,
            is_fully_halal: true,
            is_zabiha: false,
            is_partially_halal: false,
            partially_halal_chicken: false,
            partially_halal_lamb: false,
            partially_halal_beef: false,
            partially_halal_goat: false,
            image_url: None,
            zabiha_chicken: false,
            zabiha_lamb: false,
            zabiha_beef: false,
            zabiha_goat: false,
            zabiha_verified: None,
            zabiha_verified_by: None,
            created_at: now,
            updated_at: now,
            brand_id: None,
            latitude: None,
            longitude: None,
            is_featured: false,
        }
    }
}

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::geo::Point;
use crate::geocode::Geocoder;
use crate::listing::{self, ListingError, ListingQuery};
use crate::model::{
    Comment, NewComment, NewRestaurant, Restaurant, RestaurantPatch, RestaurantView, RATING_MAX,
    RATING_MIN,
};
use crate::store::StoreError;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::RestaurantNotFound(id) => {
            api_error(StatusCode::NOT_FOUND, format!("restaurant {id} not found"))
        }
        StoreError::CommentNotFound(id) => {
            api_error(StatusCode::NOT_FOUND, format!("comment {id} not found"))
        }
        other => {
            error!(error = %other, "store operation failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

// ─── GET /api/restaurants ────────────────────────────────────────

#[derive(Deserialize)]
pub struct ListingParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub featured: Option<String>,
}

/// Only the literal string "true" activates the featured filter.
fn parse_featured(value: Option<&str>) -> bool {
    value == Some("true")
}

pub async fn list_restaurants(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Vec<RestaurantView>>, ApiError> {
    let start = Instant::now();

    let query = ListingQuery::new(
        params.lat,
        params.lng,
        params.radius,
        parse_featured(params.featured.as_deref()),
    )
    .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    // Resolver failures collapse to an empty list: the listing UI gets a
    // 200 either way, while the log keeps store and cache outages apart.
    let views = match listing::resolve(state.store.as_ref(), state.cache.as_ref(), &query).await {
        Ok(views) => views,
        Err(ListingError::Store(cause)) => {
            error!(kind = "store", error = %cause, "listing query failed");
            Vec::new()
        }
        Err(ListingError::Cache(cause)) => {
            error!(kind = "cache", error = %cause, "listing query failed");
            Vec::new()
        }
    };

    info!(
        proximity = query.is_proximity(),
        featured = query.featured(),
        results = views.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/restaurants"
    );

    Ok(Json(views))
}

// ─── GET /api/restaurants/{id} ───────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantDetail {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub comment_count: u64,
    pub comments: Vec<Comment>,
}

pub async fn get_restaurant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RestaurantDetail>, ApiError> {
    let restaurant = state.store.get(id).map_err(store_error)?;
    let comments = state.store.comments(id).map_err(store_error)?;

    Ok(Json(RestaurantDetail {
        restaurant,
        comment_count: comments.len() as u64,
        comments,
    }))
}

// ─── POST /api/restaurants ───────────────────────────────────────

pub async fn create_restaurant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewRestaurant>,
) -> Result<impl IntoResponse, ApiError> {
    for (field, value) in [
        ("name", &payload.name),
        ("cuisineType", &payload.cuisine_type),
        ("address", &payload.address),
    ] {
        if value.trim().is_empty() {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("{field} must not be empty"),
            ));
        }
    }

    let mut restaurant = payload.into_restaurant(Utc::now());
    if let Some(point) = geocode(state.geocoder.clone(), restaurant.address.clone()).await {
        restaurant.latitude = Some(point.lat);
        restaurant.longitude = Some(point.lng);
    }

    state.store.insert(restaurant.clone()).map_err(store_error)?;
    listing::invalidate(state.cache.as_ref()).await;

    info!(id = %restaurant.id, located = restaurant.latitude.is_some(), "restaurant created");

    Ok((
        StatusCode::CREATED,
        Json(RestaurantView {
            restaurant,
            comment_count: 0,
            distance: None,
        }),
    ))
}

// ─── PUT /api/restaurants/{id} ───────────────────────────────────

pub async fn update_restaurant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<RestaurantPatch>,
) -> Result<Json<RestaurantView>, ApiError> {
    let mut restaurant = state.store.get(id).map_err(store_error)?;

    let address_changed = patch.apply(&mut restaurant);
    if address_changed {
        let point = geocode(state.geocoder.clone(), restaurant.address.clone()).await;
        restaurant.latitude = point.map(|p| p.lat);
        restaurant.longitude = point.map(|p| p.lng);
    }
    restaurant.updated_at = Utc::now();

    state.store.replace(restaurant.clone()).map_err(store_error)?;
    listing::invalidate(state.cache.as_ref()).await;

    let comment_count = state.store.comments(id).map_err(store_error)?.len() as u64;
    Ok(Json(RestaurantView {
        restaurant,
        comment_count,
        distance: None,
    }))
}

// ─── DELETE /api/restaurants/{id} ────────────────────────────────

pub async fn delete_restaurant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.remove(id).map_err(store_error)?;
    listing::invalidate(state.cache.as_ref()).await;

    info!(%id, "restaurant deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── POST /api/restaurants/{id}/comments ─────────────────────────

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewComment>,
) -> Result<impl IntoResponse, ApiError> {
    if !(RATING_MIN..=RATING_MAX).contains(&payload.rating) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("rating must be {RATING_MIN}-{RATING_MAX}"),
        ));
    }
    if payload.author_name.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "authorName and content must not be empty",
        ));
    }

    let comment = Comment {
        id: Uuid::new_v4(),
        restaurant_id: id,
        author_name: payload.author_name,
        content: payload.content,
        rating: payload.rating,
        image_url: payload.image_url,
        created_at: Utc::now(),
    };

    state.store.add_comment(comment.clone()).map_err(store_error)?;
    listing::invalidate(state.cache.as_ref()).await;

    Ok((StatusCode::CREATED, Json(comment)))
}

// ─── DELETE /api/restaurants/{id}/comments/{comment_id} ──────────

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path((id, comment_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .remove_comment(id, comment_id)
        .map_err(store_error)?;
    listing::invalidate(state.cache.as_ref()).await;

    Ok(StatusCode::NO_CONTENT)
}

// ─── Helpers ─────────────────────────────────────────────────────

/// ureq is a blocking client; keep it off the async workers.
async fn geocode(geocoder: Arc<Geocoder>, address: String) -> Option<Point> {
    tokio::task::spawn_blocking(move || geocoder.geocode(&address))
        .await
        .ok()
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_featured_literal_true_only() {
        assert!(parse_featured(Some("true")));
        assert!(!parse_featured(Some("TRUE")));
        assert!(!parse_featured(Some("1")));
        assert!(!parse_featured(Some("false")));
        assert!(!parse_featured(None));
    }
}

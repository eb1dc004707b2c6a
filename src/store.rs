//! Backing store for the directory.
//!
//! The listing resolver depends only on the `RestaurantStore` trait, so
//! tests can substitute doubles that count invocations. The shipped
//! implementation keeps the whole directory in one JSON document on disk,
//! loaded at startup and rewritten after every mutation.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Comment, Restaurant, RestaurantRow};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("restaurant not found: {0}")]
    RestaurantNotFound(Uuid),

    #[error("comment not found: {0}")]
    CommentNotFound(Uuid),

    #[error("directory file error: {0}")]
    Io(#[from] io::Error),

    #[error("directory data corrupted: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// The read side the listing resolver consumes: all restaurants matching
/// the featured predicate, newest first, joined with comment counts.
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn list(&self, featured_only: bool) -> Result<Vec<RestaurantRow>, StoreError>;
}

#[derive(Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    restaurants: Vec<Restaurant>,
    #[serde(default)]
    comments: Vec<Comment>,
}

/// JSON-file-backed directory store.
pub struct JsonStore {
    path: PathBuf,
    doc: RwLock<Document>,
}

impl JsonStore {
    /// Open the store at `path`, creating an empty directory when the
    /// file does not exist yet. A present-but-unreadable file is an error;
    /// silently starting empty would lose the directory on the next write.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let doc = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Document::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            doc: RwLock::new(doc),
        })
    }

    /// Default location: ~/.crescent/directory.json
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".crescent")
            .join("directory.json")
    }

    fn persist(&self, doc: &Document) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<Restaurant, StoreError> {
        let doc = self.doc.read().unwrap();
        doc.restaurants
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::RestaurantNotFound(id))
    }

    /// Comments for one restaurant, newest first.
    pub fn comments(&self, restaurant_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let doc = self.doc.read().unwrap();
        if !doc.restaurants.iter().any(|r| r.id == restaurant_id) {
            return Err(StoreError::RestaurantNotFound(restaurant_id));
        }
        let mut comments: Vec<Comment> = doc
            .comments
            .iter()
            .filter(|c| c.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    pub fn insert(&self, restaurant: Restaurant) -> Result<(), StoreError> {
        let mut doc = self.doc.write().unwrap();
        doc.restaurants.push(restaurant);
        self.persist(&doc)
    }

    /// Replace an existing record wholesale. The id must already exist.
    pub fn replace(&self, restaurant: Restaurant) -> Result<(), StoreError> {
        let mut doc = self.doc.write().unwrap();
        let slot = doc
            .restaurants
            .iter_mut()
            .find(|r| r.id == restaurant.id)
            .ok_or(StoreError::RestaurantNotFound(restaurant.id))?;
        *slot = restaurant;
        self.persist(&doc)
    }

    /// Remove a restaurant and every comment attached to it.
    pub fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        let mut doc = self.doc.write().unwrap();
        let before = doc.restaurants.len();
        doc.restaurants.retain(|r| r.id != id);
        if doc.restaurants.len() == before {
            return Err(StoreError::RestaurantNotFound(id));
        }
        doc.comments.retain(|c| c.restaurant_id != id);
        self.persist(&doc)
    }

    pub fn add_comment(&self, comment: Comment) -> Result<(), StoreError> {
        let mut doc = self.doc.write().unwrap();
        if !doc.restaurants.iter().any(|r| r.id == comment.restaurant_id) {
            return Err(StoreError::RestaurantNotFound(comment.restaurant_id));
        }
        doc.comments.push(comment);
        self.persist(&doc)
    }

    pub fn remove_comment(&self, restaurant_id: Uuid, comment_id: Uuid) -> Result<(), StoreError> {
        let mut doc = self.doc.write().unwrap();
        let before = doc.comments.len();
        doc.comments
            .retain(|c| !(c.id == comment_id && c.restaurant_id == restaurant_id));
        if doc.comments.len() == before {
            return Err(StoreError::CommentNotFound(comment_id));
        }
        self.persist(&doc)
    }
}

#[async_trait]
impl RestaurantStore for JsonStore {
    async fn list(&self, featured_only: bool) -> Result<Vec<RestaurantRow>, StoreError> {
        let doc = self.doc.read().unwrap();

        let mut counts: HashMap<Uuid, u64> = HashMap::new();
        for comment in &doc.comments {
            *counts.entry(comment.restaurant_id).or_default() += 1;
        }

        let mut rows: Vec<RestaurantRow> = doc
            .restaurants
            .iter()
            .filter(|r| !featured_only || r.is_featured)
            .map(|r| RestaurantRow {
                comment_count: counts.get(&r.id).copied().unwrap_or(0),
                restaurant: r.clone(),
            })
            .collect();

        rows.sort_by(|a, b| b.restaurant.created_at.cmp(&a.restaurant.created_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn test_store() -> (JsonStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("directory.json");
        (JsonStore::open(path).unwrap(), dir)
    }

    fn restaurant(name: &str, featured: bool, age_mins: i64) -> Restaurant {
        let mut r = Restaurant::fixture(name);
        r.is_featured = featured;
        r.created_at = Utc::now() - Duration::minutes(age_mins);
        r.updated_at = r.created_at;
        r
    }

    fn comment(restaurant_id: Uuid, rating: u8) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            restaurant_id,
            author_name: "amira".into(),
            content: "best knafeh in town".into(),
            rating,
            image_url: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_newest_first_with_counts() {
        let (store, _dir) = test_store();
        let old = restaurant("Old Place", false, 60);
        let new = restaurant("New Place", false, 1);
        let old_id = old.id;

        store.insert(old).unwrap();
        store.insert(new).unwrap();
        store.add_comment(comment(old_id, 5)).unwrap();
        store.add_comment(comment(old_id, 4)).unwrap();

        let rows = store.list(false).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].restaurant.name, "New Place");
        assert_eq!(rows[0].comment_count, 0);
        assert_eq!(rows[1].restaurant.name, "Old Place");
        assert_eq!(rows[1].comment_count, 2);
    }

    #[tokio::test]
    async fn test_list_featured_only() {
        let (store, _dir) = test_store();
        store.insert(restaurant("Plain", false, 2)).unwrap();
        store.insert(restaurant("Starred", true, 1)).unwrap();

        let rows = store.list(true).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].restaurant.name, "Starred");
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("directory.json");

        let id = {
            let store = JsonStore::open(path.clone()).unwrap();
            let r = restaurant("Kept", true, 5);
            let id = r.id;
            store.insert(r).unwrap();
            id
        };

        let reopened = JsonStore::open(path).unwrap();
        let r = reopened.get(id).unwrap();
        assert_eq!(r.name, "Kept");
        assert!(r.is_featured);
    }

    #[test]
    fn test_remove_cascades_comments() {
        let (store, _dir) = test_store();
        let r = restaurant("Short Lived", false, 1);
        let id = r.id;
        store.insert(r).unwrap();
        store.add_comment(comment(id, 3)).unwrap();

        store.remove(id).unwrap();
        assert!(matches!(
            store.comments(id),
            Err(StoreError::RestaurantNotFound(_))
        ));
        // comment rows are gone too, not orphaned
        let doc = store.doc.read().unwrap();
        assert!(doc.comments.is_empty());
    }

    #[test]
    fn test_replace_unknown_id_errors() {
        let (store, _dir) = test_store();
        let ghost = restaurant("Ghost", false, 1);
        assert!(matches!(
            store.replace(ghost),
            Err(StoreError::RestaurantNotFound(_))
        ));
    }

    #[test]
    fn test_comment_for_unknown_restaurant_errors() {
        let (store, _dir) = test_store();
        assert!(matches!(
            store.add_comment(comment(Uuid::new_v4(), 5)),
            Err(StoreError::RestaurantNotFound(_))
        ));
    }

    #[test]
    fn test_remove_comment() {
        let (store, _dir) = test_store();
        let r = restaurant("Commented", false, 1);
        let rid = r.id;
        store.insert(r).unwrap();
        let c = comment(rid, 2);
        let cid = c.id;
        store.add_comment(c).unwrap();

        store.remove_comment(rid, cid).unwrap();
        assert!(store.comments(rid).unwrap().is_empty());
        assert!(matches!(
            store.remove_comment(rid, cid),
            Err(StoreError::CommentNotFound(_))
        ));
    }
}

use axum::extract::FromRef;
use domain::IngestEvent;
use std::sync::Arc;
use storage::Db;
use tokio::sync::broadcast;

use crate::cache::CommentCache;
use crate::moderation::CommentModeration;

pub type Moderation = CommentModeration<Db, CommentCache>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub cache: CommentCache,
    pub moderation: Arc<Moderation>,
    pub tx_ingest: broadcast::Sender<IngestEvent>,
    pub admin_token: String,
}

impl AppState {
    pub fn new(db: Db, admin_token: String, page_size: i64, cache_capacity: usize) -> Self {
        let (tx_ingest, _rx_ingest) = broadcast::channel(100);
        let cache = CommentCache::new(cache_capacity, tx_ingest.clone());
        let moderation = Arc::new(CommentModeration::new(db.clone(), cache.clone(), page_size));
        Self {
            db,
            cache,
            moderation,
            tx_ingest,
            admin_token,
        }
    }
}

impl FromRef<AppState> for Db {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

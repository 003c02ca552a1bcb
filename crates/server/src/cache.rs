use async_trait::async_trait;
use domain::{Comment, IngestEvent, SiteId};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::moderation::CommentInvalidator;

type PostKey = (SiteId, String);

#[derive(Default)]
struct Listings {
    entries: HashMap<PostKey, Arc<Vec<Comment>>>,
    /// Clock value of each post's last invalidation.
    generations: HashMap<PostKey, u64>,
    clock: u64,
    /// Generation of posts missing from `generations`.
    floor: u64,
}

impl Listings {
    fn generation(&self, key: &PostKey) -> u64 {
        self.generations.get(key).copied().unwrap_or(self.floor)
    }
}

/// Public comment listings per post.
///
/// A listing read from the database is stored only if its post was not
/// invalidated while the read was in flight: callers take
/// [`CommentCache::generation`] before reading and hand it back to
/// [`CommentCache::put`].
#[derive(Clone)]
pub struct CommentCache {
    inner: Arc<RwLock<Listings>>,
    capacity: usize,
    tx_ingest: broadcast::Sender<IngestEvent>,
}

impl CommentCache {
    pub fn new(capacity: usize, tx_ingest: broadcast::Sender<IngestEvent>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Listings::default())),
            capacity: capacity.max(1),
            tx_ingest,
        }
    }

    pub async fn get(&self, site_id: &SiteId, slug: &str) -> Option<Arc<Vec<Comment>>> {
        let key = (site_id.clone(), slug.to_string());
        self.inner.read().await.entries.get(&key).cloned()
    }

    pub async fn generation(&self, site_id: &SiteId, slug: &str) -> u64 {
        let key = (site_id.clone(), slug.to_string());
        self.inner.read().await.generation(&key)
    }

    /// Returns `false` and stores nothing when the post was invalidated
    /// after `generation` was taken.
    pub async fn put(
        &self,
        site_id: SiteId,
        slug: String,
        generation: u64,
        comments: Vec<Comment>,
    ) -> bool {
        let key = (site_id, slug);
        let mut listings = self.inner.write().await;
        if listings.generation(&key) != generation {
            return false;
        }
        if listings.entries.len() >= self.capacity && !listings.entries.contains_key(&key) {
            // no recency tracking, start over
            listings.entries.clear();
        }
        listings.entries.insert(key, Arc::new(comments));
        true
    }

    async fn remove_post(&self, site_id: &SiteId, slug: &str) -> bool {
        let key = (site_id.clone(), slug.to_string());
        let mut listings = self.inner.write().await;
        let dropped = listings.entries.remove(&key).is_some();

        listings.clock += 1;
        let clock = listings.clock;
        if listings.generations.len() >= self.capacity && !listings.generations.contains_key(&key)
        {
            // every post moves to the new clock value, which only refuses more puts
            listings.generations.clear();
            listings.floor = clock;
        } else {
            listings.generations.insert(key, clock);
        }
        dropped
    }
}

#[async_trait]
impl CommentInvalidator for CommentCache {
    async fn invalidate(&self, comment: &Comment) {
        let dropped = self.remove_post(&comment.site_id, &comment.post_slug).await;
        debug!(
            "Invalidated comment {} ({}/{}), cached listing dropped: {}",
            comment.id, comment.site_id, comment.post_slug, dropped
        );
        // no subscribers is fine
        let _ = self.tx_ingest.send(IngestEvent::CommentInvalidated {
            site_id: comment.site_id.clone(),
            post_slug: comment.post_slug.clone(),
            comment_id: comment.id.clone(),
        });
    }

    async fn invalidate_post(&self, site_id: &SiteId, post_slug: &str) {
        self.remove_post(site_id, post_slug).await;
        let _ = self.tx_ingest.send(IngestEvent::PostInvalidated {
            site_id: site_id.clone(),
            post_slug: post_slug.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain::CommentStatus;

    fn comment(id: &str, slug: &str) -> Comment {
        Comment {
            id: id.to_string(),
            site_id: SiteId::new("blog.example").unwrap(),
            post_slug: slug.to_string(),
            author_name: "Ferris".to_string(),
            author_email: None,
            content: "hi".to_string(),
            status: CommentStatus::Approved,
            created_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn invalidate_drops_listing_and_notifies() {
        let (tx, mut rx) = broadcast::channel(8);
        let cache = CommentCache::new(16, tx);
        let site = SiteId::new("blog.example").unwrap();
        let c = comment("c1", "hello");

        assert!(cache.put(site.clone(), "hello".into(), 0, vec![c.clone()]).await);
        assert!(cache.put(site.clone(), "other".into(), 0, vec![]).await);
        assert!(cache.get(&site, "hello").await.is_some());

        cache.invalidate(&c).await;

        assert!(cache.get(&site, "hello").await.is_none());
        assert!(cache.get(&site, "other").await.is_some());
        match rx.recv().await.unwrap() {
            IngestEvent::CommentInvalidated { comment_id, post_slug, .. } => {
                assert_eq!(comment_id, "c1");
                assert_eq!(post_slug, "hello");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn capacity_bounds_entries() {
        let (tx, _rx) = broadcast::channel(8);
        let cache = CommentCache::new(2, tx);
        let site = SiteId::new("blog.example").unwrap();

        cache.put(site.clone(), "a".into(), 0, vec![]).await;
        cache.put(site.clone(), "b".into(), 0, vec![]).await;
        cache.put(site.clone(), "c".into(), 0, vec![]).await;

        assert!(cache.get(&site, "a").await.is_none());
        assert!(cache.get(&site, "c").await.is_some());
    }

    #[tokio::test]
    async fn listing_read_before_invalidation_is_not_stored() {
        let (tx, _rx) = broadcast::channel(8);
        let cache = CommentCache::new(16, tx);
        let site = SiteId::new("blog.example").unwrap();
        let c = comment("c1", "hello");

        let before = cache.generation(&site, "hello").await;
        let other = cache.generation(&site, "other").await;
        // moderation commits and invalidates while the listing is being read
        cache.invalidate(&c).await;

        assert!(!cache.put(site.clone(), "hello".into(), before, vec![c.clone()]).await);
        assert!(cache.get(&site, "hello").await.is_none());
        assert!(cache.put(site.clone(), "other".into(), other, vec![]).await);

        let after = cache.generation(&site, "hello").await;
        assert_ne!(before, after);
        assert!(cache.put(site.clone(), "hello".into(), after, vec![]).await);
        assert!(cache.get(&site, "hello").await.is_some());
    }

    #[tokio::test]
    async fn generation_bookkeeping_reset_still_refuses_stale_listings() {
        let (tx, _rx) = broadcast::channel(8);
        let cache = CommentCache::new(1, tx);
        let site = SiteId::new("blog.example").unwrap();

        let stale = cache.generation(&site, "a").await;
        cache.invalidate_post(&site, "b").await;
        cache.invalidate_post(&site, "a").await;

        assert!(!cache.put(site.clone(), "a".into(), stale, vec![]).await);
        let fresh = cache.generation(&site, "a").await;
        assert!(cache.put(site.clone(), "a".into(), fresh, vec![]).await);
    }
}

use async_trait::async_trait;
use domain::{Comment, CommentFilter, CommentStatus, SiteId};
use storage::{BulkRemoval, Db, ModerationSession};

/// Persistence collaborator of the moderation service.
#[async_trait]
pub trait ModerationStore: Send + Sync {
    type Session: ModerationWriter;

    async fn query_comments(
        &self,
        filter: &CommentFilter,
        reverse_chrono: bool,
        offset: i64,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<Comment>>;

    async fn count_matching_comments(&self, filter: &CommentFilter) -> anyhow::Result<i64>;

    async fn comments_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Comment>>;

    async fn remove_matching_comments(&self, filter: &CommentFilter)
        -> anyhow::Result<BulkRemoval>;

    async fn begin(&self) -> anyhow::Result<Self::Session>;
}

/// Writes staged until `flush`; dropping without flushing discards them.
#[async_trait]
pub trait ModerationWriter: Send + Sized {
    async fn remove_comment(&mut self, id: &str) -> anyhow::Result<bool>;
    async fn save_status(&mut self, id: &str, status: CommentStatus) -> anyhow::Result<bool>;
    async fn flush(self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait CommentInvalidator: Send + Sync {
    async fn invalidate(&self, comment: &Comment);
    async fn invalidate_post(&self, site_id: &SiteId, post_slug: &str);
}

#[async_trait]
impl ModerationStore for Db {
    type Session = ModerationSession;

    async fn query_comments(
        &self,
        filter: &CommentFilter,
        reverse_chrono: bool,
        offset: i64,
        limit: Option<i64>,
    ) -> anyhow::Result<Vec<Comment>> {
        Db::query_comments(self, filter, reverse_chrono, offset, limit).await
    }

    async fn count_matching_comments(&self, filter: &CommentFilter) -> anyhow::Result<i64> {
        Db::count_matching_comments(self, filter).await
    }

    async fn comments_by_ids(&self, ids: &[String]) -> anyhow::Result<Vec<Comment>> {
        self.get_comments_by_ids(ids).await
    }

    async fn remove_matching_comments(
        &self,
        filter: &CommentFilter,
    ) -> anyhow::Result<BulkRemoval> {
        Db::remove_matching_comments(self, filter).await
    }

    async fn begin(&self) -> anyhow::Result<ModerationSession> {
        self.begin_moderation().await
    }
}

#[async_trait]
impl ModerationWriter for ModerationSession {
    async fn remove_comment(&mut self, id: &str) -> anyhow::Result<bool> {
        ModerationSession::remove_comment(self, id).await
    }

    async fn save_status(&mut self, id: &str, status: CommentStatus) -> anyhow::Result<bool> {
        ModerationSession::save_status(self, id, status).await
    }

    async fn flush(self) -> anyhow::Result<()> {
        ModerationSession::flush(self).await
    }
}

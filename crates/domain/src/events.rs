use crate::models::SiteId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IngestEvent {
    CommentInvalidated {
        site_id: SiteId,
        post_slug: String,
        comment_id: String,
    },
    PostInvalidated {
        site_id: SiteId,
        post_slug: String,
    },
}

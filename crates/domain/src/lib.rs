mod events;
mod filter;
mod models;
pub mod moderation;
pub mod pagination;

pub use events::IngestEvent;
pub use filter::{CommentFilter, FilterOption, SpamFilter, StatusFilter};
pub use models::{Comment, CommentStatus, SiteId, SiteIdError, StatusParseError};
pub use moderation::{reconcile, LookupError, ReconciliationRequest, ReconciliationResult};
pub use pagination::Page;

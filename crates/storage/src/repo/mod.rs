mod comments;
mod session;

pub use comments::BulkRemoval;
pub use session::ModerationSession;

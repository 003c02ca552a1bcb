mod service;
mod store;
mod view;

pub use service::CommentModeration;
pub use store::CommentInvalidator;
pub use view::{ManagementView, UpdateForm};

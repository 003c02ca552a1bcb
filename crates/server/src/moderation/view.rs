use domain::{Comment, CommentFilter, Page};
use serde::{Deserialize, Serialize};

/// State of the comment management page after an action.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManagementView {
    pub filter: CommentFilter,
    pub comments: Vec<Comment>,
    pub first_comment_id: Option<String>,
    pub last_comment_id: Option<String>,
    pub more_results: bool,
    /// Non-zero only when bulk removal is worth offering.
    pub bulk_delete_count: i64,
    /// Comma separated ids of the displayed comments.
    pub ids: String,
    /// Displayed comments that are already spam; their boxes start checked.
    pub spam_comments: Vec<String>,
    pub messages: Vec<String>,
    pub errors: Vec<String>,
}

impl ManagementView {
    pub fn new(filter: CommentFilter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn load_page(&mut self, page: Page<Comment>) {
        self.first_comment_id = page.first().map(|c| c.id.clone());
        self.last_comment_id = page.last().map(|c| c.id.clone());
        self.more_results = page.has_more;
        self.ids = page
            .items
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        self.spam_comments = page
            .items
            .iter()
            .filter(|c| c.status.is_spam())
            .map(|c| c.id.clone())
            .collect();
        self.comments = page.items;
    }
}

/// Submitted bulk update form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateForm {
    pub ids: String,
    pub delete_comments: Vec<String>,
    pub spam_comments: Vec<String>,
    pub filter: CommentFilter,
}

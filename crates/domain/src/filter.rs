use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::CommentStatus;

pub const DEFAULT_PAGE_SIZE: i64 = 30;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    #[default]
    All,
    OnlyPending,
    OnlyApproved,
    OnlyDisapproved,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpamFilter {
    #[default]
    All,
    NoSpam,
    OnlySpam,
}

/// A selectable filter value and the message key used to label it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub key: &'static str,
    pub label: &'static str,
}

impl FilterOption {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

impl StatusFilter {
    pub fn status(&self) -> Option<CommentStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::OnlyPending => Some(CommentStatus::Pending),
            StatusFilter::OnlyApproved => Some(CommentStatus::Approved),
            StatusFilter::OnlyDisapproved => Some(CommentStatus::Disapproved),
        }
    }

    pub fn options() -> Vec<FilterOption> {
        vec![
            FilterOption::new("ALL", "commentManagement.all"),
            FilterOption::new("ONLY_PENDING", "commentManagement.onlyPending"),
            FilterOption::new("ONLY_APPROVED", "commentManagement.onlyApproved"),
            FilterOption::new("ONLY_DISAPPROVED", "commentManagement.onlyDisapproved"),
        ]
    }
}

impl SpamFilter {
    pub fn options() -> Vec<FilterOption> {
        vec![
            FilterOption::new("ALL", "commentManagement.all"),
            FilterOption::new("NO_SPAM", "commentManagement.noSpam"),
            FilterOption::new("ONLY_SPAM", "commentManagement.onlySpam"),
        ]
    }
}

/// Search criteria of the global comment management page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentFilter {
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// Inclusive: comments from the whole day match.
    pub end_date: Option<NaiveDate>,
    pub status: StatusFilter,
    pub spam: SpamFilter,
    pub offset: i64,
    pub count: i64,
}

impl Default for CommentFilter {
    fn default() -> Self {
        Self {
            search: None,
            start_date: None,
            end_date: None,
            status: StatusFilter::All,
            spam: SpamFilter::All,
            offset: 0,
            count: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CommentFilter {
    pub fn with_page_size(count: i64) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }

    pub fn page_size(&self) -> i64 {
        self.count.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }

    /// Trimmed search text, `None` when blank.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

//! Bulk comment reconciliation.
//!
//! The management page submits the ids it displayed along with the ids whose
//! delete and spam boxes were checked. [`reconcile`] turns that submission into
//! the writes to perform. It does no I/O itself: the current status of each
//! comment comes from the `lookup` the caller passes in.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::models::CommentStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("comment not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRequest {
    /// Ids shown to the operator; defines processing order.
    pub displayed_ids: Vec<String>,
    pub delete_ids: Vec<String>,
    pub spam_ids: Vec<String>,
}

impl ReconciliationRequest {
    /// Builds a request from the form fields: `ids` is the comma separated list
    /// of displayed comment ids.
    pub fn from_form(ids: &str, delete_ids: Vec<String>, spam_ids: Vec<String>) -> Self {
        let displayed_ids = ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self {
            displayed_ids,
            delete_ids,
            spam_ids,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub to_delete: Vec<String>,
    pub to_mark_spam: Vec<String>,
    pub to_unmark_spam: Vec<String>,
    /// Every mutated id, deletions first. This is the cache invalidation order.
    pub affected: Vec<String>,
}

impl ReconciliationResult {
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
    }
}

/// Computes the deletes and status changes for one bulk update.
///
/// Deleted comments are never looked up or touched again. A displayed comment
/// that is checked as spam and not already spam gets marked; any other
/// displayed comment currently marked spam gets approved, including one whose
/// box was simply left unchecked.
///
/// The first `lookup` error aborts the computation and is returned as is.
pub fn reconcile<F, E>(
    request: &ReconciliationRequest,
    mut lookup: F,
) -> Result<ReconciliationResult, E>
where
    F: FnMut(&str) -> Result<CommentStatus, E>,
{
    let mut result = ReconciliationResult::default();

    let mut deleted: HashSet<&str> = HashSet::new();
    for id in &request.delete_ids {
        if deleted.insert(id.as_str()) {
            result.to_delete.push(id.clone());
            result.affected.push(id.clone());
        }
    }

    let spam: HashSet<&str> = request.spam_ids.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    for id in &request.displayed_ids {
        if deleted.contains(id.as_str()) || !seen.insert(id.as_str()) {
            continue;
        }

        let current = lookup(id)?;

        if spam.contains(id.as_str()) && !current.is_spam() {
            result.to_mark_spam.push(id.clone());
            result.affected.push(id.clone());
        } else if current.is_spam() && !spam.contains(id.as_str()) {
            result.to_unmark_spam.push(id.clone());
            result.affected.push(id.clone());
        }
    }

    Ok(result)
}

//! Review threads and edit requests.

use crate::domain::models::{Actor, CommentType, EditRequestStatus, FieldComment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const MAX_COMMENT_LEN: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentError {
    #[error("Comment cannot be empty")]
    EmptyContent,
    #[error("Comment must be at most 5000 characters")]
    TooLong,
    #[error("You are not allowed to post this type of comment")]
    TypeNotAllowed,
    #[error("Replies must target a top-level comment on the same submission")]
    InvalidParent,
    #[error("Edit requests must be top-level comments")]
    EditRequestReply,
    #[error("Only the owner of a submission can request edits")]
    NotOwner,
    #[error("Edits can only be requested for a locked submission")]
    SubmissionNotLocked,
    #[error("An edit request is already pending for this submission")]
    EditRequestPending,
    #[error("Comment is not an edit request")]
    NotAnEditRequest,
    #[error("This edit request has already been decided")]
    AlreadyDecided,
    #[error("A reason is required when denying an edit request")]
    ReasonRequired,
    #[error("Only the author can change this comment")]
    NotAuthor,
    #[error("Comments with replies cannot be deleted")]
    HasReplies,
    #[error("This comment can no longer be changed")]
    Immutable,
    #[error("Only administrators can do this")]
    AdminOnly,
}

/// Facts about the submission a comment is posted on.
#[derive(Debug, Clone, Copy)]
pub struct CommentTarget {
    pub submission_id: Uuid,
    pub owner_id: Uuid,
    pub locked: bool,
    pub has_pending_edit_request: bool,
}

pub fn allowed_comment_types(actor: &Actor) -> &'static [CommentType] {
    if actor.is_admin() {
        &[
            CommentType::General,
            CommentType::AdminFeedback,
            CommentType::ChangeRequest,
        ]
    } else {
        &[CommentType::General, CommentType::EditRequest]
    }
}

pub fn check_content(content: &str) -> Result<&str, CommentError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(CommentError::EmptyContent);
    }
    if trimmed.chars().count() > MAX_COMMENT_LEN {
        return Err(CommentError::TooLong);
    }
    Ok(trimmed)
}

/// Validates a new comment before it is stored.
pub fn check_new_comment(
    actor: &Actor,
    target: &CommentTarget,
    comment_type: CommentType,
    content: &str,
    parent: Option<&FieldComment>,
) -> Result<(), CommentError> {
    check_content(content)?;

    if !allowed_comment_types(actor).contains(&comment_type) {
        return Err(CommentError::TypeNotAllowed);
    }

    if let Some(parent) = parent {
        if parent.submission_id != target.submission_id || parent.parent_comment_id.is_some() {
            return Err(CommentError::InvalidParent);
        }
    }

    if comment_type == CommentType::EditRequest {
        if parent.is_some() {
            return Err(CommentError::EditRequestReply);
        }
        if actor.user_id != target.owner_id {
            return Err(CommentError::NotOwner);
        }
        if !target.locked {
            return Err(CommentError::SubmissionNotLocked);
        }
        if target.has_pending_edit_request {
            return Err(CommentError::EditRequestPending);
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditDecision {
    Approve,
    Deny,
}

/// Resulting status for a staff decision on an edit request.
pub fn decide_edit_request(
    actor: &Actor,
    comment: &FieldComment,
    decision: EditDecision,
    reason: Option<&str>,
) -> Result<EditRequestStatus, CommentError> {
    if !actor.is_admin() {
        return Err(CommentError::AdminOnly);
    }
    if comment.comment_type != CommentType::EditRequest {
        return Err(CommentError::NotAnEditRequest);
    }
    if comment.edit_request_status != Some(EditRequestStatus::Pending) {
        return Err(CommentError::AlreadyDecided);
    }
    match decision {
        EditDecision::Approve => Ok(EditRequestStatus::Approved),
        EditDecision::Deny => {
            if reason.map(str::trim).unwrap_or_default().is_empty() {
                Err(CommentError::ReasonRequired)
            } else {
                Ok(EditRequestStatus::Denied)
            }
        }
    }
}

/// An approved edit request that has not yet been spent by a resubmission.
pub fn active_edit_grant(comments: &[FieldComment]) -> Option<&FieldComment> {
    comments.iter().find(|c| {
        c.comment_type == CommentType::EditRequest
            && c.edit_request_status == Some(EditRequestStatus::Approved)
            && !c.is_resolved
    })
}

pub fn has_edit_grant(comments: &[FieldComment]) -> bool {
    active_edit_grant(comments).is_some()
}

pub fn has_pending_edit_request(comments: &[FieldComment]) -> bool {
    comments.iter().any(|c| {
        c.comment_type == CommentType::EditRequest
            && c.edit_request_status == Some(EditRequestStatus::Pending)
    })
}

pub fn check_can_edit(actor: &Actor, comment: &FieldComment) -> Result<(), CommentError> {
    if comment.author_id != actor.user_id {
        return Err(CommentError::NotAuthor);
    }
    match (comment.comment_type, comment.edit_request_status) {
        (CommentType::System, _) => Err(CommentError::Immutable),
        (CommentType::EditRequest, Some(status)) if status != EditRequestStatus::Pending => {
            Err(CommentError::Immutable)
        }
        _ => Ok(()),
    }
}

pub fn check_can_delete(
    actor: &Actor,
    comment: &FieldComment,
    reply_count: usize,
) -> Result<(), CommentError> {
    check_can_edit(actor, comment)?;
    if reply_count > 0 {
        return Err(CommentError::HasReplies);
    }
    Ok(())
}

pub fn check_can_pin(actor: &Actor) -> Result<(), CommentError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CommentError::AdminOnly)
    }
}

/// Resolving a decided edit request spends (or revokes) its grant, so it cannot be reopened.
pub fn check_can_resolve(
    actor: &Actor,
    target: &CommentTarget,
    comment: &FieldComment,
    resolved: bool,
) -> Result<(), CommentError> {
    if !actor.is_admin() && actor.user_id != target.owner_id {
        return Err(CommentError::NotOwner);
    }
    let decided = comment.comment_type == CommentType::EditRequest
        && comment.edit_request_status != Some(EditRequestStatus::Pending);
    if decided && comment.is_resolved && !resolved {
        return Err(CommentError::Immutable);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentFilter {
    #[default]
    All,
    Unresolved,
    Pinned,
}

impl CommentFilter {
    fn admits(&self, root: &FieldComment) -> bool {
        match self {
            CommentFilter::All => true,
            CommentFilter::Unresolved => !root.is_resolved,
            CommentFilter::Pinned => root.is_pinned,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    #[serde(flatten)]
    pub root: FieldComment,
    pub replies: Vec<FieldComment>,
}

/// Groups a flat comment list into one-level threads.
///
/// Roots are ordered pinned first, then newest first; replies newest first.
/// A reply whose parent is missing from the list is shown as a root.
pub fn build_threads(comments: Vec<FieldComment>, filter: CommentFilter) -> Vec<CommentThread> {
    let ids: std::collections::HashSet<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut replies: HashMap<Uuid, Vec<FieldComment>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        match comment.parent_comment_id {
            Some(parent) if ids.contains(&parent) => replies.entry(parent).or_default().push(comment),
            _ => roots.push(comment),
        }
    }

    roots.retain(|root| filter.admits(root));
    roots.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    roots
        .into_iter()
        .map(|root| {
            let mut thread_replies = replies.remove(&root.id).unwrap_or_default();
            thread_replies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            CommentThread {
                root,
                replies: thread_replies,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSummary {
    pub total: usize,
    pub unresolved: usize,
    pub pinned: usize,
    pub pending_edit_requests: usize,
}

pub fn summarize(comments: &[FieldComment]) -> CommentSummary {
    comments.iter().fold(CommentSummary::default(), |mut acc, c| {
        acc.total += 1;
        if !c.is_resolved {
            acc.unresolved += 1;
        }
        if c.is_pinned {
            acc.pinned += 1;
        }
        if c.edit_request_status == Some(EditRequestStatus::Pending) {
            acc.pending_edit_requests += 1;
        }
        acc
    })
}

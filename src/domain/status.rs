//! Submission lifecycle.
//!
//! ```text
//! (new) --save--> DRAFT --submit--> SUBMITTED --admin--> UNDER_REVIEW
//!                                                  |-> APPROVED
//!                                                  |-> REJECTED
//!                                                  '-> CHANGES_REQUESTED --admin--> UNDER_REVIEW
//! ```
//!
//! Anything past DRAFT is locked against owner edits unless the owner holds an
//! edit grant (an approved, unresolved EDIT_REQUEST).

use crate::domain::models::{FormStatus, FormSubmission};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("This form has already been submitted and is locked for editing")]
    Locked,
    #[error("A submission for this form already exists")]
    AlreadySubmitted { existing_id: Uuid },
    #[error("Submission not found")]
    NotFound,
    #[error("Only draft submissions can be deleted (current status: {0})")]
    NotDeletable(FormStatus),
    #[error("Cannot move a submission from {from} to {to}")]
    InvalidTransition { from: FormStatus, to: FormStatus },
}

/// What the owner is asking for when saving answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIntent {
    Draft,
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveAction {
    Insert,
    Update(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavePlan {
    pub action: SaveAction,
    pub status: FormStatus,
    /// The edit grant is spent by this save and must be marked resolved.
    pub consumes_edit_grant: bool,
}

pub fn is_form_locked(status: FormStatus, has_edit_grant: bool) -> bool {
    status != FormStatus::Draft && !has_edit_grant
}

/// Decides how an owner save is applied.
///
/// `existing` is the owner's current record for the form type, if any;
/// `target_id` is the submission id the client claims to be editing.
pub fn plan_save(
    existing: Option<&FormSubmission>,
    target_id: Option<Uuid>,
    intent: SaveIntent,
    has_edit_grant: bool,
) -> Result<SavePlan, StatusError> {
    let requested = match intent {
        SaveIntent::Draft => FormStatus::Draft,
        SaveIntent::Submit => FormStatus::Submitted,
    };

    let Some(current) = existing else {
        if target_id.is_some() {
            return Err(StatusError::NotFound);
        }
        return Ok(SavePlan {
            action: SaveAction::Insert,
            status: requested,
            consumes_edit_grant: false,
        });
    };

    match target_id {
        Some(id) if id != current.id => return Err(StatusError::NotFound),
        None if current.status != FormStatus::Draft => {
            return Err(StatusError::AlreadySubmitted {
                existing_id: current.id,
            })
        }
        _ => {}
    }

    if current.status == FormStatus::Draft {
        return Ok(SavePlan {
            action: SaveAction::Update(current.id),
            status: requested,
            consumes_edit_grant: false,
        });
    }

    if is_form_locked(current.status, has_edit_grant) {
        return Err(StatusError::Locked);
    }

    Ok(match intent {
        SaveIntent::Draft => SavePlan {
            action: SaveAction::Update(current.id),
            status: current.status,
            consumes_edit_grant: false,
        },
        SaveIntent::Submit => SavePlan {
            action: SaveAction::Update(current.id),
            status: FormStatus::Submitted,
            consumes_edit_grant: true,
        },
    })
}

pub fn ensure_deletable(status: FormStatus) -> Result<(), StatusError> {
    if status == FormStatus::Draft {
        Ok(())
    } else {
        Err(StatusError::NotDeletable(status))
    }
}

/// Review moves performed by staff.
pub fn can_admin_transition(from: FormStatus, to: FormStatus) -> bool {
    use FormStatus::*;
    matches!(
        (from, to),
        (Submitted, UnderReview)
            | (UnderReview, Approved)
            | (UnderReview, Rejected)
            | (UnderReview, ChangesRequested)
            | (ChangesRequested, UnderReview)
    )
}

/// Final decisions close review; any outstanding edit grant is revoked with them.
pub fn closes_review(to: FormStatus) -> bool {
    matches!(to, FormStatus::Approved | FormStatus::Rejected)
}

pub fn admin_transition(from: FormStatus, to: FormStatus) -> Result<FormStatus, StatusError> {
    if can_admin_transition(from, to) {
        Ok(to)
    } else {
        Err(StatusError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn submission(status: FormStatus) -> FormSubmission {
        FormSubmission {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            form_type: crate::domain::models::FormType::WorkHistory,
            status,
            form_data: serde_json::json!({}),
            submitted_at: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn first_save_creates_draft_or_submission() {
        let plan = plan_save(None, None, SaveIntent::Draft, false).unwrap();
        assert_eq!(plan.action, SaveAction::Insert);
        assert_eq!(plan.status, FormStatus::Draft);

        let plan = plan_save(None, None, SaveIntent::Submit, false).unwrap();
        assert_eq!(plan.status, FormStatus::Submitted);

        assert_eq!(
            plan_save(None, Some(Uuid::new_v4()), SaveIntent::Draft, false),
            Err(StatusError::NotFound)
        );
    }

    #[test]
    fn only_final_decisions_close_review() {
        assert!(closes_review(FormStatus::Approved));
        assert!(closes_review(FormStatus::Rejected));
        for status in [
            FormStatus::Draft,
            FormStatus::Submitted,
            FormStatus::UnderReview,
            FormStatus::ChangesRequested,
        ] {
            assert!(!closes_review(status), "{status}");
        }
    }

    #[test]
    fn approved_submission_without_grant_is_locked() {
        let approved = submission(admin_transition(FormStatus::UnderReview, FormStatus::Approved).unwrap());
        assert!(closes_review(approved.status));
        assert_eq!(
            plan_save(Some(&approved), Some(approved.id), SaveIntent::Draft, false),
            Err(StatusError::Locked)
        );
    }

    #[test]
    fn draft_is_replaced_and_submitted() {
        let draft = submission(FormStatus::Draft);
        let plan = plan_save(Some(&draft), None, SaveIntent::Submit, false).unwrap();
        assert_eq!(plan.action, SaveAction::Update(draft.id));
        assert_eq!(plan.status, FormStatus::Submitted);
        assert!(!plan.consumes_edit_grant);
    }

    #[test]
    fn second_non_draft_without_id_conflicts() {
        let submitted = submission(FormStatus::Submitted);
        for intent in [SaveIntent::Draft, SaveIntent::Submit] {
            assert_eq!(
                plan_save(Some(&submitted), None, intent, false),
                Err(StatusError::AlreadySubmitted {
                    existing_id: submitted.id
                })
            );
        }
    }

    #[test]
    fn locked_submission_rejects_updates() {
        for status in [
            FormStatus::Submitted,
            FormStatus::UnderReview,
            FormStatus::ChangesRequested,
            FormStatus::Approved,
            FormStatus::Rejected,
        ] {
            let current = submission(status);
            assert_eq!(
                plan_save(Some(&current), Some(current.id), SaveIntent::Draft, false),
                Err(StatusError::Locked)
            );
            assert!(is_form_locked(status, false));
            assert!(!is_form_locked(status, true));
        }
        assert!(!is_form_locked(FormStatus::Draft, false));
    }

    #[test]
    fn edit_grant_unlocks_and_is_consumed_on_resubmit() {
        let current = submission(FormStatus::ChangesRequested);

        let plan = plan_save(Some(&current), Some(current.id), SaveIntent::Draft, true).unwrap();
        assert_eq!(plan.status, FormStatus::ChangesRequested);
        assert!(!plan.consumes_edit_grant);

        let plan = plan_save(Some(&current), Some(current.id), SaveIntent::Submit, true).unwrap();
        assert_eq!(plan.action, SaveAction::Update(current.id));
        assert_eq!(plan.status, FormStatus::Submitted);
        assert!(plan.consumes_edit_grant);
    }

    #[test]
    fn mismatched_target_is_not_found() {
        let current = submission(FormStatus::Draft);
        assert_eq!(
            plan_save(Some(&current), Some(Uuid::new_v4()), SaveIntent::Draft, false),
            Err(StatusError::NotFound)
        );
    }

    #[test]
    fn only_drafts_are_deletable() {
        assert!(ensure_deletable(FormStatus::Draft).is_ok());
        assert_eq!(
            ensure_deletable(FormStatus::Submitted),
            Err(StatusError::NotDeletable(FormStatus::Submitted))
        );
    }

    #[test]
    fn admin_transitions() {
        assert_eq!(
            admin_transition(FormStatus::Submitted, FormStatus::UnderReview),
            Ok(FormStatus::UnderReview)
        );
        assert!(can_admin_transition(FormStatus::UnderReview, FormStatus::Approved));
        assert!(can_admin_transition(FormStatus::UnderReview, FormStatus::ChangesRequested));
        assert!(!can_admin_transition(FormStatus::Draft, FormStatus::UnderReview));
        assert!(!can_admin_transition(FormStatus::Submitted, FormStatus::Approved));
        assert!(!can_admin_transition(FormStatus::Approved, FormStatus::Rejected));
        assert_eq!(
            admin_transition(FormStatus::Rejected, FormStatus::Draft),
            Err(StatusError::InvalidTransition {
                from: FormStatus::Rejected,
                to: FormStatus::Draft
            })
        );
    }
}

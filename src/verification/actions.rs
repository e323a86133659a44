use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RecordError;
use crate::records::{UserRecord, REJECTED_STATE};
use crate::verification::dto::UserBadge;
use crate::verification::services::classify_user_parts;

/// Administrator decisions on an identity document.
///
/// Each action writes both legacy fields in one step, so a record produced
/// here never carries a rejection next to an approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminAction {
    Approve,
    Reject {
        #[serde(default)]
        comment: Option<String>,
    },
    Revoke,
    Resubmit { document_path: String },
}

impl AdminAction {
    fn apply_to(&self, user: &mut UserRecord) {
        match self {
            AdminAction::Approve => {
                user.verified_flag = Some(true);
                user.verification_state = None;
                user.verification_comment = None;
            }
            AdminAction::Reject { comment } => {
                user.verified_flag = Some(false);
                user.verification_state = Some(REJECTED_STATE.to_string());
                user.verification_comment = comment.clone();
            }
            // rejection sentinel stays: revoking does not un-reject
            AdminAction::Revoke => {
                user.verified_flag = None;
            }
            AdminAction::Resubmit { document_path } => {
                user.identity_document_path = Some(document_path.clone());
                user.verified_flag = None;
                user.verification_state = None;
                user.verification_comment = None;
            }
        }
    }
}

/// Applies `action` to a copy of `user` and returns it with its new badge.
///
/// Actions never touch `id` or `role`, so validating the updated copy
/// covers the original.
pub fn apply_action(
    user: &UserRecord,
    action: &AdminAction,
) -> Result<(UserRecord, UserBadge), RecordError> {
    let mut updated = user.clone();
    action.apply_to(&mut updated);
    let (id, _, bucket) = classify_user_parts(&updated)?;
    let badge = UserBadge::new(id.clone(), bucket);
    debug!(?action, ?bucket, "admin action applied");
    Ok((updated, badge))
}

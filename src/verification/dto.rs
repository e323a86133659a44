use serde::{Deserialize, Serialize};

use crate::records::{RecordId, UserRecord};
use crate::verification::actions::AdminAction;

/// Computed verification state shared by users and vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationBucket {
    Unverified,
    Pending,
    Verified,
    Rejected,
}

/// Badge colour class used by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Neutral,
    Warning,
    Success,
    Danger,
}

impl VerificationBucket {
    pub const ALL: [VerificationBucket; 4] = [
        VerificationBucket::Unverified,
        VerificationBucket::Pending,
        VerificationBucket::Verified,
        VerificationBucket::Rejected,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VerificationBucket::Unverified => "Non vérifié",
            VerificationBucket::Pending => "En attente",
            VerificationBucket::Verified => "Vérifié",
            VerificationBucket::Rejected => "Rejeté",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            VerificationBucket::Unverified => Severity::Neutral,
            VerificationBucket::Pending => Severity::Warning,
            VerificationBucket::Verified => Severity::Success,
            VerificationBucket::Rejected => Severity::Danger,
        }
    }
}

/// Status badge for one user row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserBadge {
    pub user_id: RecordId,
    pub bucket: VerificationBucket,
    pub label: &'static str,
    pub severity: Severity,
}

impl UserBadge {
    pub fn new(user_id: RecordId, bucket: VerificationBucket) -> Self {
        Self {
            user_id,
            bucket,
            label: bucket.label(),
            severity: bucket.severity(),
        }
    }
}

/// Status badge for one vehicle row. `comment` is only set for rejections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleBadge {
    pub vehicle_id: RecordId,
    pub owner_id: RecordId,
    pub bucket: VerificationBucket,
    pub label: &'static str,
    pub severity: Severity,
    pub comment: Option<String>,
}

/// Request body for previewing an administrator action.
#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub user: UserRecord,
    pub action: AdminAction,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub user: UserRecord,
    pub badge: UserBadge,
}

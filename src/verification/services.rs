use tracing::warn;

use crate::error::RecordError;
use crate::records::{RecordId, Role, UserRecord, VehicleRecord, VehicleState};
use crate::verification::dto::{UserBadge, VehicleBadge, VerificationBucket};

/// Maps a user row onto its verification bucket.
///
/// The rules form one ordered chain, first match wins:
/// no document, then explicit rejection, then the approval flag, then pending.
/// A stale `verified_flag = true` next to a rejection resolves to `Rejected`.
pub fn classify_user(user: &UserRecord) -> Result<VerificationBucket, RecordError> {
    classify_user_parts(user).map(|(_, _, bucket)| bucket)
}

/// Validates the record once and returns its id and role alongside the bucket.
pub(crate) fn classify_user_parts(
    user: &UserRecord,
) -> Result<(&RecordId, Role, VerificationBucket), RecordError> {
    let (id, role) = user.validate().inspect_err(|e| {
        warn!(error = %e, "user record rejected by classifier");
    })?;

    let bucket = if !user.has_document() {
        VerificationBucket::Unverified
    } else if user.is_rejected() {
        VerificationBucket::Rejected
    } else if user.verified_flag == Some(true) {
        VerificationBucket::Verified
    } else {
        VerificationBucket::Pending
    };
    Ok((id, role, bucket))
}

/// Vehicles store an explicit state, so this is a straight mapping.
/// Vehicles never land in `Unverified`.
pub fn classify_vehicle(vehicle: &VehicleRecord) -> Result<VerificationBucket, RecordError> {
    classify_vehicle_parts(vehicle).map(|(_, _, bucket)| bucket)
}

fn classify_vehicle_parts(
    vehicle: &VehicleRecord,
) -> Result<(&RecordId, &RecordId, VerificationBucket), RecordError> {
    let (id, owner, state) = vehicle.validate().inspect_err(|e| {
        warn!(error = %e, "vehicle record rejected by classifier");
    })?;
    Ok((id, owner, bucket_for_state(state)))
}

fn bucket_for_state(state: VehicleState) -> VerificationBucket {
    match state {
        VehicleState::Pending => VerificationBucket::Pending,
        VehicleState::Verified => VerificationBucket::Verified,
        VehicleState::Rejected => VerificationBucket::Rejected,
    }
}

pub fn user_badge(user: &UserRecord) -> Result<UserBadge, RecordError> {
    let (id, _, bucket) = classify_user_parts(user)?;
    Ok(UserBadge::new(id.clone(), bucket))
}

pub fn vehicle_badge(vehicle: &VehicleRecord) -> Result<VehicleBadge, RecordError> {
    let (id, owner, bucket) = classify_vehicle_parts(vehicle)?;
    let comment = match bucket {
        VerificationBucket::Rejected => vehicle.verification_comment.clone(),
        _ => None,
    };
    Ok(VehicleBadge {
        vehicle_id: id.clone(),
        owner_id: owner.clone(),
        bucket,
        label: bucket.label(),
        severity: bucket.severity(),
        comment,
    })
}

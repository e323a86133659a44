use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::error::{RecordError, RecordKind};

/// Value written into `verification_state` by a rejection.
pub const REJECTED_STATE: &str = "rejected";

/// Spellings of the rejection sentinel found in stored data.
const REJECTED_ALIASES: &[&str] = &[REJECTED_STATE, "rejete", "rejeté"];

/// Backend identifier. Ids come over the wire as numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Num(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Num(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Voyageur,
    Conducteur,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_lowercase().as_str() {
            "voyageur" | "passenger" => Some(Role::Voyageur),
            "conducteur" | "driver" => Some(Role::Conducteur),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// User row as the backend returns it.
///
/// `verified_flag` and `verification_state` are the legacy pair the
/// classifier reconciles; see `verification::classify_user`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub identity_document_path: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub verified_flag: Option<bool>,
    #[serde(default)]
    pub verification_state: Option<String>,
    #[serde(default)]
    pub verification_comment: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub created_at: Option<OffsetDateTime>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub email_verified_at: Option<OffsetDateTime>,
}

impl UserRecord {
    /// Checks the required fields and returns the id with the parsed role.
    pub fn validate(&self) -> Result<(&RecordId, Role), RecordError> {
        let id = self
            .id
            .as_ref()
            .ok_or_else(|| RecordError::malformed(RecordKind::User, None, "missing id"))?;
        let raw = self.role.as_deref().ok_or_else(|| {
            RecordError::malformed(RecordKind::User, Some(id.to_string()), "missing role")
        })?;
        let role = Role::parse(raw).ok_or_else(|| {
            RecordError::malformed(
                RecordKind::User,
                Some(id.to_string()),
                format!("unknown role {:?}", raw),
            )
        })?;
        Ok((id, role))
    }

    /// Blank paths count as "never submitted".
    pub fn has_document(&self) -> bool {
        self.identity_document_path
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty())
    }

    pub fn is_rejected(&self) -> bool {
        self.verification_state
            .as_deref()
            .is_some_and(is_rejected_state)
    }

    pub fn is_active(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// Explicit vehicle state as stored by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    Pending,
    Verified,
    Rejected,
}

impl VehicleState {
    pub fn parse(raw: &str) -> Option<VehicleState> {
        match raw.trim().to_lowercase().as_str() {
            "pending" | "en_attente" => Some(VehicleState::Pending),
            "verified" | "verifie" | "vérifié" => Some(VehicleState::Verified),
            s if is_rejected_state(s) => Some(VehicleState::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub owner_id: Option<RecordId>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub seats: Option<u32>,
    #[serde(default)]
    pub verification_state: Option<String>,
    #[serde(default)]
    pub verification_comment: Option<String>,
}

impl VehicleRecord {
    /// Returns the vehicle id, owner id and stored state. An absent state is `Pending`.
    pub fn validate(&self) -> Result<(&RecordId, &RecordId, VehicleState), RecordError> {
        let id = self
            .id
            .as_ref()
            .ok_or_else(|| RecordError::malformed(RecordKind::Vehicle, None, "missing id"))?;
        let owner = self.owner_id.as_ref().ok_or_else(|| {
            RecordError::malformed(RecordKind::Vehicle, Some(id.to_string()), "missing owner_id")
        })?;
        let state = match self.verification_state.as_deref() {
            None => VehicleState::Pending,
            Some(raw) => VehicleState::parse(raw).ok_or_else(|| {
                RecordError::malformed(
                    RecordKind::Vehicle,
                    Some(id.to_string()),
                    format!("unknown verification_state {:?}", raw),
                )
            })?,
        };
        Ok((id, owner, state))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub driver_id: Option<RecordId>,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub departure_at: Option<OffsetDateTime>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub price_per_seat: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub seats_total: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub distance_km: Option<f64>,
}

fn default_seats() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservationRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub trip_id: Option<RecordId>,
    #[serde(default)]
    pub passenger_id: Option<RecordId>,
    #[serde(default = "default_seats", deserialize_with = "deserialize_seats")]
    pub seats: u32,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Default for ReservationRecord {
    fn default() -> Self {
        Self {
            id: None,
            trip_id: None,
            passenger_id: None,
            seats: default_seats(),
            total_price: None,
            status: None,
        }
    }
}

fn is_rejected_state(raw: &str) -> bool {
    let s = raw.trim().to_lowercase();
    REJECTED_ALIASES.contains(&s.as_str())
}

/// Tri-state flag as the backend serializes it: bool, 0/1, or a string.
/// Unrecognized values are treated as absent.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// RFC 3339, or the backend's `YYYY-MM-DD HH:MM:SS` taken as UTC.
/// Anything else is treated as absent.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => parse_timestamp(s.trim()),
        _ => None,
    })
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw, format)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Number or numeric string. Non-numeric values are treated as absent.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    })
}

/// Reservations book one seat unless a usable count says otherwise.
fn deserialize_seats<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_count(deserializer)?
        .filter(|n| *n > 0)
        .unwrap_or_else(default_seats))
}

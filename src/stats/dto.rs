use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::records::{ReservationRecord, TripRecord, UserRecord, VehicleRecord};

/// Entity lists fetched together by the caller. They are read as one
/// consistent snapshot; nothing is re-fetched during aggregation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub vehicles: Option<Vec<VehicleRecord>>,
    #[serde(default)]
    pub trips: Option<Vec<TripRecord>>,
    #[serde(default)]
    pub reservations: Option<Vec<ReservationRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct StatsRequest {
    #[serde(flatten)]
    pub snapshot: Snapshot,
    /// Overrides the server clock for recency windows.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub now: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleCounts {
    pub voyageur: u64,
    pub conducteur: u64,
    pub admin: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleRatios {
    pub voyageur: u8,
    pub conducteur: u8,
    pub admin: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
    pub unverified: u64,
    pub pending: u64,
    pub verified: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketRatios {
    pub unverified: u8,
    pub pending: u8,
    pub verified: u8,
    pub rejected: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: u64,
    pub by_role: RoleCounts,
    pub role_ratios: RoleRatios,
    pub by_bucket: BucketCounts,
    pub bucket_ratios: BucketRatios,
    pub active: u64,
    pub active_ratio: u8,
    pub recent_signups: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VehicleStats {
    pub total: u64,
    pub by_bucket: BucketCounts,
    pub bucket_ratios: BucketRatios,
}

/// Trip and reservation KPIs.
///
/// Money and CO2 figures are estimates for dashboards. Upstream data may carry
/// placeholder prices, so do not use them for accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActivityKpis {
    pub trip_count: u64,
    pub reservation_count: u64,
    pub upcoming_trips: u64,
    /// Reservations per trip.
    pub occupancy: f64,
    pub seats_booked: u64,
    pub total_revenue: f64,
    pub revenue_per_trip: f64,
    pub co2_saved_kg: f64,
}

/// Dashboard numbers for one snapshot. Recomputed on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub users: UserStats,
    pub vehicles: Option<VehicleStats>,
    pub activity: Option<ActivityKpis>,
}

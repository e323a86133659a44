use std::collections::HashMap;

use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument};

use crate::error::RecordError;
use crate::records::{RecordId, ReservationRecord, Role, TripRecord, UserRecord, VehicleRecord};
use crate::stats::dto::{
    ActivityKpis, AggregateSummary, BucketCounts, BucketRatios, RoleCounts, RoleRatios, Snapshot,
    UserStats, VehicleStats,
};
use crate::verification::dto::VerificationBucket;
use crate::verification::services::{classify_user_parts, classify_vehicle};

pub const DEFAULT_RECENT_WINDOW_DAYS: i64 = 30;

/// Average CO2 avoided per passenger and kilometre of shared ride.
pub const CO2_KG_PER_PASSENGER_KM: f64 = 0.12;

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    /// Reference instant for recency windows and upcoming trips.
    pub now: OffsetDateTime,
    pub recent_window: Duration,
}

impl AggregateOptions {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now,
            recent_window: Duration::days(DEFAULT_RECENT_WINDOW_DAYS),
        }
    }

    pub fn with_recent_window(mut self, window: Duration) -> Self {
        self.recent_window = window;
        self
    }
}

/// Builds the dashboard summary for one snapshot.
///
/// Fails on the first malformed user or vehicle instead of skipping it.
#[instrument(skip_all, fields(users = snapshot.users.len()))]
pub fn aggregate(
    snapshot: &Snapshot,
    options: AggregateOptions,
) -> Result<AggregateSummary, RecordError> {
    let users = user_stats(&snapshot.users, &options)?;
    let vehicles = snapshot.vehicles.as_deref().map(vehicle_stats).transpose()?;
    let activity = match (snapshot.trips.as_deref(), snapshot.reservations.as_deref()) {
        (None, None) => None,
        (trips, reservations) => Some(activity_kpis(
            trips.unwrap_or_default(),
            reservations.unwrap_or_default(),
            &options,
        )),
    };

    debug!(
        total = users.total,
        verified = users.by_bucket.verified,
        vehicles = vehicles.map(|v| v.total),
        trips = activity.map(|a| a.trip_count),
        "aggregate computed"
    );
    Ok(AggregateSummary {
        users,
        vehicles,
        activity,
    })
}

fn user_stats(users: &[UserRecord], options: &AggregateOptions) -> Result<UserStats, RecordError> {
    let mut stats = UserStats::default();
    // None when the window reaches past the representable range: no lower bound
    let since = options.now.checked_sub(options.recent_window);

    for user in users {
        let (_, role, bucket) = classify_user_parts(user)?;
        stats.total += 1;
        match role {
            Role::Voyageur => stats.by_role.voyageur += 1,
            Role::Conducteur => stats.by_role.conducteur += 1,
            Role::Admin => stats.by_role.admin += 1,
        }
        stats.by_bucket.add(bucket);
        if user.is_active() {
            stats.active += 1;
        }
        if user
            .created_at
            .is_some_and(|at| since.map_or(true, |s| at >= s) && at <= options.now)
        {
            stats.recent_signups += 1;
        }
    }

    stats.role_ratios = stats.by_role.ratios(stats.total);
    stats.bucket_ratios = stats.by_bucket.ratios(stats.total);
    stats.active_ratio = percent(stats.active, stats.total);
    Ok(stats)
}

fn vehicle_stats(vehicles: &[VehicleRecord]) -> Result<VehicleStats, RecordError> {
    let mut stats = VehicleStats::default();
    for vehicle in vehicles {
        stats.by_bucket.add(classify_vehicle(vehicle)?);
        stats.total += 1;
    }
    stats.bucket_ratios = stats.by_bucket.ratios(stats.total);
    Ok(stats)
}

fn activity_kpis(
    trips: &[TripRecord],
    reservations: &[ReservationRecord],
    options: &AggregateOptions,
) -> ActivityKpis {
    let trip_count = trips.len() as u64;
    let reservation_count = reservations.len() as u64;
    let denominator = trip_count.max(1) as f64;

    let distances: HashMap<&RecordId, f64> = trips
        .iter()
        .filter_map(|t| Some((t.id.as_ref()?, t.distance_km?)))
        .collect();

    let mut seats_booked = 0u64;
    let mut total_revenue = 0.0;
    let mut co2_saved_kg = 0.0;
    for r in reservations {
        seats_booked += u64::from(r.seats);
        total_revenue += r.total_price.unwrap_or(0.0);
        if let Some(km) = r.trip_id.as_ref().and_then(|id| distances.get(id)) {
            co2_saved_kg += f64::from(r.seats) * km * CO2_KG_PER_PASSENGER_KM;
        }
    }

    let upcoming_trips = trips
        .iter()
        .filter(|t| t.departure_at.is_some_and(|at| at > options.now))
        .count() as u64;

    ActivityKpis {
        trip_count,
        reservation_count,
        upcoming_trips,
        occupancy: round2(reservation_count as f64 / denominator),
        seats_booked,
        total_revenue: round2(total_revenue),
        revenue_per_trip: round2(total_revenue / denominator),
        co2_saved_kg: round2(co2_saved_kg),
    }
}

impl BucketCounts {
    fn add(&mut self, bucket: VerificationBucket) {
        match bucket {
            VerificationBucket::Unverified => self.unverified += 1,
            VerificationBucket::Pending => self.pending += 1,
            VerificationBucket::Verified => self.verified += 1,
            VerificationBucket::Rejected => self.rejected += 1,
        }
    }

    #[cfg(test)]
    fn get(&self, bucket: VerificationBucket) -> u64 {
        match bucket {
            VerificationBucket::Unverified => self.unverified,
            VerificationBucket::Pending => self.pending,
            VerificationBucket::Verified => self.verified,
            VerificationBucket::Rejected => self.rejected,
        }
    }

    fn ratios(&self, total: u64) -> BucketRatios {
        BucketRatios {
            unverified: percent(self.unverified, total),
            pending: percent(self.pending, total),
            verified: percent(self.verified, total),
            rejected: percent(self.rejected, total),
        }
    }
}

impl RoleCounts {
    fn ratios(&self, total: u64) -> RoleRatios {
        RoleRatios {
            voyageur: percent(self.voyageur, total),
            conducteur: percent(self.conducteur, total),
            admin: percent(self.admin, total),
        }
    }
}

/// Integer percentage, halves rounded up. The denominator is floored at 1
/// so the result is always defined and within 0..=100.
pub fn percent(count: u64, total: u64) -> u8 {
    let total = total.max(1);
    let count = count.min(total);
    ((count * 100 + total / 2) / total) as u8
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2024-06-15 12:00 UTC);

    fn snapshot(value: serde_json::Value) -> Snapshot {
        serde_json::from_value(value).expect("snapshot")
    }

    fn run(value: serde_json::Value) -> AggregateSummary {
        aggregate(&snapshot(value), AggregateOptions::new(NOW)).expect("aggregate")
    }

    #[test]
    fn empty_input_is_all_zero() {
        let summary = run(json!({ "users": [] }));
        assert_eq!(summary.users, UserStats::default());
        assert_eq!(summary.vehicles, None);
        assert_eq!(summary.activity, None);
    }

    #[test]
    fn mixed_users_scenario() {
        let summary = run(json!({
            "users": [
                { "id": 1, "role": "voyageur" },
                {
                    "id": 2, "role": "conducteur",
                    "identity_document_path": "ids/2.jpg",
                    "verified_flag": true,
                    "verification_state": "rejected"
                },
                {
                    "id": 3, "role": "voyageur",
                    "identity_document_path": "ids/3.jpg",
                    "verified_flag": null
                }
            ]
        }));
        let users = summary.users;
        assert_eq!(
            users.by_bucket,
            BucketCounts { unverified: 1, pending: 1, verified: 0, rejected: 1 }
        );
        assert_eq!(
            users.bucket_ratios,
            BucketRatios { unverified: 33, pending: 33, verified: 0, rejected: 33 }
        );
        assert_eq!(users.by_role, RoleCounts { voyageur: 2, conducteur: 1, admin: 0 });
        assert_eq!(users.role_ratios.voyageur, 67);
    }

    #[test]
    fn bucket_counts_sum_to_total() {
        let users: Vec<_> = (0..17)
            .map(|i| {
                let role = ["voyageur", "conducteur", "admin"][i % 3];
                let document = (i % 4 != 0).then_some("ids/x.png");
                let flag = i % 2 == 0;
                let state = (i % 5 == 0).then_some("rejete");
                json!({
                    "id": i,
                    "role": role,
                    "identity_document_path": document,
                    "verified_flag": flag,
                    "verification_state": state,
                })
            })
            .collect();
        let summary = run(json!({ "users": users }));
        let total: u64 = VerificationBucket::ALL
            .iter()
            .map(|b| summary.users.by_bucket.get(*b))
            .sum();
        assert_eq!(total, 17);
        assert_eq!(summary.users.total, 17);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let snap = snapshot(json!({
            "users": [
                { "id": 1, "role": "admin", "email_verified_at": "2024-01-01T00:00:00Z" },
                { "id": 2, "role": "voyageur", "identity_document_path": "a" }
            ],
            "trips": [ { "id": 1, "distance_km": 33.3 } ],
            "reservations": [ { "trip_id": 1, "seats": 3, "total_price": 10.1 } ]
        }));
        let options = AggregateOptions::new(NOW);
        let first = aggregate(&snap, options).unwrap();
        let second = aggregate(&snap, options).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn malformed_user_fails_whole_aggregate() {
        let snap = snapshot(json!({
            "users": [ { "id": 1, "role": "voyageur" }, { "id": 2 } ]
        }));
        let err = aggregate(&snap, AggregateOptions::new(NOW)).unwrap_err();
        assert!(err.to_string().contains("missing role"));
    }

    #[test]
    fn malformed_vehicle_fails_whole_aggregate() {
        let snap = snapshot(json!({
            "users": [],
            "vehicles": [ { "id": 1, "verification_state": "verifie" } ]
        }));
        assert!(aggregate(&snap, AggregateOptions::new(NOW)).is_err());
    }

    #[test]
    fn recent_signups_use_supplied_now() {
        let snap = snapshot(json!({
            "users": [
                { "id": 1, "role": "voyageur", "created_at": "2024-06-01T00:00:00Z" },
                { "id": 2, "role": "voyageur", "created_at": "2024-05-16T12:00:00Z" },
                { "id": 3, "role": "voyageur", "created_at": "2024-05-16T11:59:59Z" },
                { "id": 4, "role": "voyageur", "created_at": "2024-07-01T00:00:00Z" },
                { "id": 5, "role": "voyageur" }
            ]
        }));
        let summary = aggregate(&snap, AggregateOptions::new(NOW)).unwrap();
        assert_eq!(summary.users.recent_signups, 2);

        let week = AggregateOptions::new(NOW).with_recent_window(Duration::days(7));
        assert_eq!(aggregate(&snap, week).unwrap().users.recent_signups, 0);

        let later = AggregateOptions::new(datetime!(2024-07-10 00:00 UTC));
        assert_eq!(aggregate(&snap, later).unwrap().users.recent_signups, 1);
    }

    #[test]
    fn oversized_window_counts_all_past_signups() {
        let snap = snapshot(json!({
            "users": [
                { "id": 1, "role": "voyageur", "created_at": "1970-01-01T00:00:00Z" },
                { "id": 2, "role": "voyageur", "created_at": "2024-06-01T00:00:00Z" },
                { "id": 3, "role": "voyageur", "created_at": "2030-01-01T00:00:00Z" }
            ]
        }));
        let huge = AggregateOptions::new(NOW).with_recent_window(Duration::days(5_000_000));
        let summary = aggregate(&snap, huge).unwrap();
        assert_eq!(summary.users.recent_signups, 2);
    }

    #[test]
    fn active_users_have_verified_email() {
        let summary = run(json!({
            "users": [
                { "id": 1, "role": "voyageur", "email_verified_at": "2024-01-01T00:00:00Z" },
                { "id": 2, "role": "voyageur" },
                { "id": 3, "role": "conducteur" }
            ]
        }));
        assert_eq!(summary.users.active, 1);
        assert_eq!(summary.users.active_ratio, 33);
    }

    #[test]
    fn vehicle_buckets() {
        let summary = run(json!({
            "users": [],
            "vehicles": [
                { "id": 1, "owner_id": 1, "verification_state": "verifie" },
                { "id": 2, "owner_id": 1, "verification_state": "rejete", "verification_comment": "x" },
                { "id": 3, "owner_id": 2 },
                { "id": 4, "owner_id": 3, "verification_state": "verified" }
            ]
        }));
        let vehicles = summary.vehicles.expect("vehicle stats");
        assert_eq!(vehicles.total, 4);
        assert_eq!(
            vehicles.by_bucket,
            BucketCounts { unverified: 0, pending: 1, verified: 2, rejected: 1 }
        );
        assert_eq!(vehicles.bucket_ratios.verified, 50);
        assert_eq!(vehicles.bucket_ratios.pending, 25);
    }

    #[test]
    fn empty_vehicle_list_is_reported_not_omitted() {
        let summary = run(json!({ "users": [], "vehicles": [] }));
        assert_eq!(summary.vehicles, Some(VehicleStats::default()));
    }

    #[test]
    fn activity_kpis() {
        let summary = run(json!({
            "users": [],
            "trips": [
                { "id": 1, "distance_km": 100.0, "departure_at": "2024-06-20T08:00:00Z" },
                { "id": 2, "distance_km": 50.0, "departure_at": "2024-06-01T08:00:00Z" }
            ],
            "reservations": [
                { "trip_id": 1, "seats": 2, "total_price": 30.0 },
                { "trip_id": 1, "total_price": 15.5 },
                { "trip_id": 2 },
                { "trip_id": 99, "seats": 4, "total_price": 4.5 }
            ]
        }));
        let a = summary.activity.expect("activity");
        assert_eq!(a.trip_count, 2);
        assert_eq!(a.reservation_count, 4);
        assert_eq!(a.upcoming_trips, 1);
        assert_eq!(a.occupancy, 2.0);
        assert_eq!(a.seats_booked, 8);
        assert_eq!(a.total_revenue, 50.0);
        assert_eq!(a.revenue_per_trip, 25.0);
        // (2 + 1) * 100 km + 1 * 50 km, at 0.12 kg
        assert_eq!(a.co2_saved_kg, 42.0);
    }

    #[test]
    fn reservations_without_trips_do_not_divide_by_zero() {
        let summary = run(json!({
            "users": [],
            "reservations": [ { "total_price": 12.0 }, { "total_price": 8.0 } ]
        }));
        let a = summary.activity.expect("activity");
        assert_eq!(a.trip_count, 0);
        assert_eq!(a.occupancy, 2.0);
        assert_eq!(a.revenue_per_trip, 20.0);
        assert_eq!(a.co2_saved_kg, 0.0);
    }

    #[test]
    fn percent_bounds() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(1, 200), 1);
        assert_eq!(percent(1, 201), 0);
        assert_eq!(percent(5, 5), 100);
    }
}

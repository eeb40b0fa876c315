//! Placeholder route optimization.
//!
//! There is no path search here: routes that run into active traffic alerts are credited
//! with an estimated saving drawn from a [`SavingsEstimator`]. The default estimator draws
//! 2 to 7 minutes and 5 to 15 percent fuel gain at random.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use super::domain::{Route, RouteId, RouteOptimization, TrafficAlert};
use crate::http::round_tenth;

/// Criterion that makes traffic alerts count toward a saving.
pub const TRAFFIC_CRITERION: &str = "traffic";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Savings {
    pub time_saved_minutes: f64,
    pub fuel_efficiency_gain: f64,
}

/// Source of the per-route saving estimate.
pub trait SavingsEstimator: Send + Sync {
    fn estimate(&self, route: &Route, active_alerts: &[&TrafficAlert]) -> Savings;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandomizedTrafficEstimator;

impl SavingsEstimator for RandomizedTrafficEstimator {
    fn estimate(&self, _route: &Route, _active_alerts: &[&TrafficAlert]) -> Savings {
        let mut rng = rand::thread_rng();
        Savings {
            time_saved_minutes: rng.gen_range(2.0..7.0),
            fuel_efficiency_gain: rng.gen_range(5.0..15.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteOptimizationResult {
    pub route_id: RouteId,
    pub route_name: String,
    pub time_saved: f64,
    pub fuel_efficiency_gain: f64,
    pub optimized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSummary {
    pub routes_optimized: usize,
    pub total_routes: usize,
    pub average_time_saved: f64,
    pub average_fuel_efficiency_gain: f64,
    pub results: Vec<RouteOptimizationResult>,
}

/// Scores one route; `alerts` must already be narrowed to the route's linked alerts.
pub(crate) fn evaluate_route<E: SavingsEstimator + ?Sized>(
    route: &Route,
    alerts: &[TrafficAlert],
    criteria: &[String],
    estimator: &E,
    now: DateTime<Utc>,
) -> RouteOptimizationResult {
    let active: Vec<&TrafficAlert> = alerts
        .iter()
        .filter(|alert| route.traffic_alerts.contains(&alert.id) && alert.is_active(now))
        .collect();
    let wants_traffic = criteria
        .iter()
        .any(|criterion| criterion.eq_ignore_ascii_case(TRAFFIC_CRITERION));

    let savings = if !active.is_empty() && wants_traffic {
        estimator.estimate(route, &active)
    } else {
        Savings {
            time_saved_minutes: 0.0,
            fuel_efficiency_gain: 0.0,
        }
    };

    let time_saved = round_tenth(savings.time_saved_minutes.max(0.0));
    RouteOptimizationResult {
        route_id: route.id.clone(),
        route_name: route.name.clone(),
        time_saved,
        fuel_efficiency_gain: round_tenth(savings.fuel_efficiency_gain.max(0.0)),
        optimized: time_saved > 0.0,
    }
}

impl RouteOptimizationResult {
    pub(crate) fn metadata(&self, at: DateTime<Utc>) -> RouteOptimization {
        RouteOptimization {
            time_saved: self.time_saved,
            fuel_efficiency_gain: self.fuel_efficiency_gain,
            optimized: self.optimized,
            optimized_at: at,
        }
    }
}

pub(crate) fn summarize(results: Vec<RouteOptimizationResult>) -> OptimizationSummary {
    let total = results.len();
    let (average_time_saved, average_fuel_efficiency_gain) = if total == 0 {
        (0.0, 0.0)
    } else {
        let time: f64 = results.iter().map(|r| r.time_saved).sum();
        let fuel: f64 = results.iter().map(|r| r.fuel_efficiency_gain).sum();
        (
            round_tenth(time / total as f64),
            round_tenth(fuel / total as f64),
        )
    };

    OptimizationSummary {
        routes_optimized: results.iter().filter(|r| r.optimized).count(),
        total_routes: total,
        average_time_saved,
        average_fuel_efficiency_gain,
        results,
    }
}

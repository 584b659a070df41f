// Dashboard snapshot and alert types
//
// The snapshot has exactly one writer (the state sink); renderers read clones.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Scalar KPI tiles shown at the top of the dashboard
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Kpis {
    pub total_tests: u64,
    pub tests_today: u64,
    pub pass_rate: f64,
    pub active_machines: u64,
    pub pending_teflon_changes: u64,
}

/// Per-machine status card
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MachineStatus {
    pub id: String,
    pub name: String,
    pub status: String,
    pub last_test_at: Option<String>,
    pub teflon_expires_at: Option<String>,
}

/// Quality test currently in progress
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveTest {
    pub id: String,
    pub machine_id: String,
    pub operator: String,
    pub status: String,
    pub started_at: Option<String>,
}

/// Recent activity feed entry
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub timestamp: Option<String>,
}

/// Alert severity tier derived from a counter value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Canonical thresholds: 0 is informational, more than 5 is critical.
    pub fn for_count(count: u64) -> Self {
        match count {
            0 => Severity::Info,
            1..=5 => Severity::Warning,
            _ => Severity::Critical,
        }
    }
}

/// Named alert counters with derived severity tiers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertCounters {
    pub delayed_tests: u64,
    pub expired_teflon: u64,
    pub inactive_machines: u64,
    pub maintenance_needed: u64,
}

impl AlertCounters {
    pub fn total(&self) -> u64 {
        self.delayed_tests + self.expired_teflon + self.inactive_machines + self.maintenance_needed
    }

    /// Worst tier across all counters, for the header badge
    pub fn highest_severity(&self) -> Severity {
        [
            self.delayed_tests,
            self.expired_teflon,
            self.inactive_machines,
            self.maintenance_needed,
        ]
        .into_iter()
        .map(Severity::for_count)
        .max_by_key(|s| match s {
            Severity::Info => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
        })
        .unwrap_or(Severity::Info)
    }
}

/// Partial delta carried on the `update` channel.
///
/// Only top-level fields present in the payload are merged; absent fields
/// leave the snapshot untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePayload {
    pub kpis: Option<Kpis>,
    pub machines: Option<Vec<MachineStatus>>,
    pub active_tests: Option<Vec<ActiveTest>>,
    pub recent_activity: Option<Vec<ActivityEntry>>,
    pub alerts: Option<AlertCounters>,
}

/// Full in-memory picture of dashboard state at a point in time
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardSnapshot {
    pub kpis: Kpis,
    pub machines: Vec<MachineStatus>,
    pub active_tests: Vec<ActiveTest>,
    pub recent_activity: Vec<ActivityEntry>,
    pub alerts: AlertCounters,
    /// RFC 3339, refreshed on every successful apply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl DashboardSnapshot {
    /// Replace the entire snapshot with a fresh one from the `initial` channel
    pub fn apply_initial(&mut self, full: DashboardSnapshot) {
        *self = full;
        self.touch();
    }

    /// Merge the top-level fields present in the partial
    pub fn apply_update(&mut self, partial: UpdatePayload) {
        if let Some(kpis) = partial.kpis {
            self.kpis = kpis;
        }
        if let Some(machines) = partial.machines {
            self.machines = machines;
        }
        if let Some(active_tests) = partial.active_tests {
            self.active_tests = active_tests;
        }
        if let Some(recent_activity) = partial.recent_activity {
            self.recent_activity = recent_activity;
        }
        if let Some(alerts) = partial.alerts {
            self.alerts = alerts;
        }
        self.touch();
    }

    /// Replace the machine list only (fallback poller refresh path)
    pub fn replace_machines(&mut self, machines: Vec<MachineStatus>) {
        self.machines = machines;
        self.touch();
    }

    fn touch(&mut self) {
        self.last_updated = Some(Utc::now().to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_thresholds() {
        assert_eq!(Severity::for_count(0), Severity::Info);
        assert_eq!(Severity::for_count(1), Severity::Warning);
        assert_eq!(Severity::for_count(3), Severity::Warning);
        assert_eq!(Severity::for_count(5), Severity::Warning);
        assert_eq!(Severity::for_count(6), Severity::Critical);
        assert_eq!(Severity::for_count(100), Severity::Critical);
    }

    #[test]
    fn highest_severity_picks_worst_counter() {
        let alerts = AlertCounters {
            delayed_tests: 0,
            expired_teflon: 2,
            inactive_machines: 7,
            maintenance_needed: 0,
        };
        assert_eq!(alerts.highest_severity(), Severity::Critical);
        assert_eq!(alerts.total(), 9);
        assert_eq!(AlertCounters::default().highest_severity(), Severity::Info);
    }
}

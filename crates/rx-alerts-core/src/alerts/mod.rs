//! Appointment alert derivation.
//!
//! Pipeline: Rules (fixed order) → Stable severity sort → Truncate to cap
//!
//! Derivation is a pure function of the appointment list, the current local
//! time and the configuration. Nothing is cached between calls.

mod config;
mod rules;

pub use config::*;

use chrono::NaiveDateTime;

use crate::models::{Alert, Appointment};
use rules::RuleContext;

/// Rule evaluation order. Ties in severity keep this order.
const RULES: [fn(&RuleContext<'_>, &[Appointment], &mut Vec<Alert>); 6] = [
    rules::overdue,
    rules::today,
    rules::tomorrow,
    rules::missed,
    rules::no_recent,
    rules::follow_up_needed,
];

/// Derives prioritized alerts from a patient's appointments.
#[derive(Debug, Clone, Default)]
pub struct AlertDeriver {
    config: AlertConfig,
}

impl AlertDeriver {
    /// Create a deriver with the given configuration.
    pub fn new(config: AlertConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Run every rule, sort by severity and cap the result.
    ///
    /// "Most recent" no-show and completed visits are picked by scheduled
    /// date and time, so `appointments` may arrive in any order.
    pub fn derive(&self, appointments: &[Appointment], now: NaiveDateTime) -> Vec<Alert> {
        let ctx = RuleContext {
            now,
            config: &self.config,
        };

        let mut alerts = Vec::new();
        for rule in RULES {
            rule(&ctx, appointments, &mut alerts);
        }
        let candidates = alerts.len();

        // sort_by_key is stable: equal severities keep rule order
        alerts.sort_by_key(|alert| alert.severity.rank());
        alerts.truncate(self.config.max_alerts);

        tracing::debug!(
            appointments = appointments.len(),
            candidates,
            kept = alerts.len(),
            "Derived appointment alerts"
        );

        alerts
    }

    /// Derive against the wall-clock local time.
    pub fn derive_now(&self, appointments: &[Appointment]) -> Vec<Alert> {
        self.derive(appointments, chrono::Local::now().naive_local())
    }
}

/// Derive alerts with default thresholds and the given cap.
pub fn derive_alerts(
    appointments: &[Appointment],
    now: NaiveDateTime,
    max_alerts: usize,
) -> Vec<Alert> {
    AlertDeriver::new(AlertConfig::with_max_alerts(max_alerts)).derive(appointments, now)
}

/// Derive alerts against the wall-clock local time.
pub fn derive_alerts_now(appointments: &[Appointment], max_alerts: usize) -> Vec<Alert> {
    AlertDeriver::new(AlertConfig::with_max_alerts(max_alerts)).derive_now(appointments)
}

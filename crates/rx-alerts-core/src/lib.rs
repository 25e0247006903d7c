//! Rx-Alerts Core Library
//!
//! Appointment alerts for clinical pharmacy patient records.
//!
//! # Architecture
//!
//! ```text
//! Record service ──► Appointment cache (SQLite)
//!                            │
//!                list_patient_appointments
//!                            │
//!                            ▼
//!     ┌──────────────────────────────────────────┐
//!     │              AlertDeriver                │
//!     │  overdue → today → tomorrow → missed →   │
//!     │  no recent → follow-up needed            │
//!     │  stable severity sort, cap to max_alerts │
//!     └─────────────────────┬────────────────────┘
//!                           │
//!                           ▼
//!               Patient record view (host)
//!               AlertAction → AlertActionHandler
//! ```
//!
//! # Core Principle
//!
//! **Alerts are derived, never stored.** Every call recomputes them from the
//! appointment list and the current time.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Appointment, Alert, AlertAction, etc.)
//! - [`alerts`]: Alert rules, ordering and configuration
//! - [`db`]: SQLite appointment cache

pub mod alerts;
pub mod db;
pub mod models;

// Re-export commonly used types
pub use alerts::{derive_alerts, derive_alerts_now, AlertConfig, AlertDeriver, ConfigError};
pub use db::Database;
pub use models::{
    ActionTarget, Alert, AlertAction, AlertActionHandler, AlertKind, AlertSeverity, Appointment,
    AppointmentOutcome, AppointmentStatus, AppointmentType,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "rx_alerts_core=info";

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RxAlertsError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for RxAlertsError {
    fn from(e: db::DbError) -> Self {
        RxAlertsError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for RxAlertsError {
    fn from(e: serde_json::Error) -> Self {
        RxAlertsError::SerializationError(e.to_string())
    }
}

impl From<alerts::ConfigError> for RxAlertsError {
    fn from(e: alerts::ConfigError) -> Self {
        RxAlertsError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for RxAlertsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RxAlertsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the tracing subscriber. Safe to call more than once.
#[uniffi::export]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .try_init();
}

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<RxAlertsCore>, RxAlertsError> {
    let db = Database::open(&path)?;
    tracing::info!(path = %path, "Opened appointment cache");
    Ok(Arc::new(RxAlertsCore {
        db: Arc::new(Mutex::new(db)),
        config: AlertConfig::default(),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<RxAlertsCore>, RxAlertsError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(RxAlertsCore {
        db: Arc::new(Mutex::new(db)),
        config: AlertConfig::default(),
    }))
}

/// Derive alerts for an in-memory appointment list at a given local time.
///
/// `now` is RFC 3339 (converted to local time) or a naive
/// `YYYY-MM-DDTHH:MM[:SS]` local timestamp.
#[uniffi::export]
pub fn derive_alerts_at(
    appointments: Vec<FfiAppointment>,
    now: String,
    max_alerts: u32,
) -> Result<Vec<FfiAlert>, RxAlertsError> {
    if max_alerts == 0 {
        return Err(RxAlertsError::InvalidInput(
            "max_alerts must be a positive integer".into(),
        ));
    }
    let now = parse_local_timestamp(&now)?;
    let appointments = appointments
        .into_iter()
        .map(Appointment::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(derive_alerts(&appointments, now, max_alerts as usize)
        .into_iter()
        .map(Into::into)
        .collect())
}

fn parse_local_timestamp(value: &str) -> Result<NaiveDateTime, RxAlertsError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&chrono::Local).naive_local());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|_| RxAlertsError::InvalidInput(format!("Invalid timestamp: {}", value)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct RxAlertsCore {
    db: Arc<Mutex<Database>>,
    config: AlertConfig,
}

#[uniffi::export]
impl RxAlertsCore {
    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Add or refresh a cached appointment.
    pub fn upsert_appointment(&self, appointment: FfiAppointment) -> Result<(), RxAlertsError> {
        let db = self.db.lock()?;
        let appointment = Appointment::try_from(appointment)?;
        db.upsert_appointment(&appointment)?;
        Ok(())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: String) -> Result<Option<FfiAppointment>, RxAlertsError> {
        let db = self.db.lock()?;
        let appointment = db.get_appointment(&id)?;
        Ok(appointment.map(|a| a.into()))
    }

    /// List a patient's appointments, most recent first.
    pub fn list_appointments(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiAppointment>, RxAlertsError> {
        let db = self.db.lock()?;
        let appointments = db.list_patient_appointments(&patient_id)?;
        Ok(appointments.into_iter().map(|a| a.into()).collect())
    }

    /// Change an appointment's status.
    pub fn update_appointment_status(
        &self,
        id: String,
        status: String,
    ) -> Result<(), RxAlertsError> {
        let status = AppointmentStatus::parse(&status)
            .ok_or_else(|| RxAlertsError::InvalidInput(format!("Unknown status: {}", status)))?;
        let db = self.db.lock()?;
        if !db.update_appointment_status(&id, status)? {
            return Err(RxAlertsError::NotFound(id));
        }
        Ok(())
    }

    /// Record a visit outcome, marking the appointment completed.
    pub fn record_outcome(
        &self,
        id: String,
        next_actions: Vec<String>,
    ) -> Result<(), RxAlertsError> {
        let db = self.db.lock()?;
        let outcome = AppointmentOutcome { next_actions };
        if !db.record_appointment_outcome(&id, &outcome)? {
            return Err(RxAlertsError::NotFound(id));
        }
        Ok(())
    }

    // =========================================================================
    // Alert Operations
    // =========================================================================

    /// Current alerts for a patient, at wall-clock local time.
    pub fn patient_alerts(
        &self,
        patient_id: String,
        max_alerts: u32,
    ) -> Result<Vec<FfiAlert>, RxAlertsError> {
        self.alerts_for(&patient_id, chrono::Local::now().naive_local(), max_alerts)
    }

    /// Alerts for a patient at an explicit local time.
    pub fn patient_alerts_at(
        &self,
        patient_id: String,
        now: String,
        max_alerts: u32,
    ) -> Result<Vec<FfiAlert>, RxAlertsError> {
        let now = parse_local_timestamp(&now)?;
        self.alerts_for(&patient_id, now, max_alerts)
    }
}

impl RxAlertsCore {
    fn alerts_for(
        &self,
        patient_id: &str,
        now: NaiveDateTime,
        max_alerts: u32,
    ) -> Result<Vec<FfiAlert>, RxAlertsError> {
        let config = AlertConfig {
            max_alerts: max_alerts as usize,
            ..self.config.clone()
        };
        config.validate()?;

        let appointments = {
            let db = self.db.lock()?;
            db.list_patient_appointments(patient_id)?
        };
        let alerts = AlertDeriver::new(config).derive(&appointments, now);
        Ok(alerts.into_iter().map(Into::into).collect())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe appointment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: String,
    pub patient_id: String,
    pub appointment_type: String,
    /// YYYY-MM-DD
    pub scheduled_date: String,
    /// HH:MM
    pub scheduled_time: String,
    pub status: String,
    /// `None` when no outcome was recorded
    pub next_actions: Option<Vec<String>>,
}

impl From<Appointment> for FfiAppointment {
    fn from(apt: Appointment) -> Self {
        Self {
            id: apt.id,
            patient_id: apt.patient_id,
            appointment_type: apt.appointment_type.as_str().to_string(),
            scheduled_date: apt.scheduled_date.format("%Y-%m-%d").to_string(),
            scheduled_time: apt.scheduled_time,
            status: apt.status.as_str().to_string(),
            next_actions: apt.outcome.map(|o| o.next_actions),
        }
    }
}

impl TryFrom<FfiAppointment> for Appointment {
    type Error = RxAlertsError;

    fn try_from(apt: FfiAppointment) -> Result<Self, Self::Error> {
        let scheduled_date = NaiveDate::parse_from_str(&apt.scheduled_date, "%Y-%m-%d")
            .map_err(|_| {
                RxAlertsError::InvalidInput(format!("Invalid date: {}", apt.scheduled_date))
            })?;
        let status = AppointmentStatus::parse(&apt.status)
            .ok_or_else(|| RxAlertsError::InvalidInput(format!("Unknown status: {}", apt.status)))?;

        Ok(Appointment {
            id: apt.id,
            patient_id: apt.patient_id,
            appointment_type: AppointmentType::from_wire(&apt.appointment_type),
            scheduled_date,
            scheduled_time: apt.scheduled_time,
            status,
            outcome: apt
                .next_actions
                .map(|next_actions| AppointmentOutcome { next_actions }),
        })
    }
}

/// FFI-safe alert.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAlert {
    pub id: String,
    pub kind: String,
    pub severity: String,
    pub title: String,
    pub message: String,
    pub appointment_id: Option<String>,
    pub action_label: Option<String>,
    /// "create_appointment" or "view_appointment"
    pub action_target: Option<String>,
    pub action_appointment_id: Option<String>,
}

impl From<Alert> for FfiAlert {
    fn from(alert: Alert) -> Self {
        let appointment_id = alert.appointment_id().map(str::to_string);
        let (action_label, action_target, action_appointment_id) = match alert.action {
            Some(AlertAction { label, target }) => match target {
                ActionTarget::CreateAppointment => {
                    (Some(label), Some("create_appointment".to_string()), None)
                }
                ActionTarget::ViewAppointment { appointment_id } => (
                    Some(label),
                    Some("view_appointment".to_string()),
                    Some(appointment_id),
                ),
            },
            None => (None, None, None),
        };

        Self {
            id: alert.id,
            kind: alert.kind.as_str().to_string(),
            severity: alert.severity.as_str().to_string(),
            title: alert.title,
            message: alert.message,
            appointment_id,
            action_label,
            action_target,
            action_appointment_id,
        }
    }
}

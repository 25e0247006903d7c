//! Alert models surfaced to the patient record view.

use serde::{Deserialize, Serialize};

use super::appointment::Appointment;

/// What an alert is about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overdue,
    Today,
    Tomorrow,
    Missed,
    NoRecent,
    FollowUpNeeded,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Missed => "missed",
            Self::NoRecent => "no_recent",
            Self::FollowUpNeeded => "follow_up_needed",
        }
    }

    /// Prefix used to build stable alert IDs.
    pub(crate) fn id_prefix(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Missed => "missed",
            Self::NoRecent => "no-recent",
            Self::FollowUpNeeded => "follow-up",
        }
    }
}

/// Alert severity. Variant order is display priority: errors first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Error,
    Warning,
    Info,
}

impl AlertSeverity {
    /// Sort rank: error = 0, warning = 1, info = 2.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Warning => 1,
            Self::Info => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// Where an alert's action leads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionTarget {
    /// Open the new-appointment flow
    CreateAppointment,
    /// Open an existing appointment
    ViewAppointment { appointment_id: String },
}

/// Listener the presentation layer implements to react to alert actions.
pub trait AlertActionHandler {
    fn create_appointment(&self);
    fn view_appointment(&self, appointment_id: &str);
}

/// A labelled action attached to an alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertAction {
    /// Button text
    pub label: String,
    pub target: ActionTarget,
}

impl AlertAction {
    pub fn create_appointment(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ActionTarget::CreateAppointment,
        }
    }

    pub fn view_appointment(label: impl Into<String>, appointment_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            target: ActionTarget::ViewAppointment {
                appointment_id: appointment_id.into(),
            },
        }
    }

    /// Route this action to the matching handler callback.
    pub fn dispatch(&self, handler: &dyn AlertActionHandler) {
        match &self.target {
            ActionTarget::CreateAppointment => handler.create_appointment(),
            ActionTarget::ViewAppointment { appointment_id } => {
                handler.view_appointment(appointment_id)
            }
        }
    }
}

/// A derived, user-facing appointment alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    /// Stable for a given kind and source appointment
    pub id: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    /// Appointment that triggered the alert, if any
    pub appointment: Option<Appointment>,
    pub action: Option<AlertAction>,
}

impl Alert {
    /// ID of the source appointment, if any.
    pub fn appointment_id(&self) -> Option<&str> {
        self.appointment.as_ref().map(|apt| apt.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingHandler {
        calls: RefCell<Vec<String>>,
    }

    impl AlertActionHandler for RecordingHandler {
        fn create_appointment(&self) {
            self.calls.borrow_mut().push("create".into());
        }

        fn view_appointment(&self, appointment_id: &str) {
            self.calls.borrow_mut().push(format!("view:{}", appointment_id));
        }
    }

    #[test]
    fn test_severity_rank_matches_ordering() {
        let mut severities = vec![AlertSeverity::Info, AlertSeverity::Error, AlertSeverity::Warning];
        severities.sort();
        assert_eq!(
            severities,
            vec![AlertSeverity::Error, AlertSeverity::Warning, AlertSeverity::Info]
        );
        assert!(AlertSeverity::Error.rank() < AlertSeverity::Warning.rank());
        assert!(AlertSeverity::Warning.rank() < AlertSeverity::Info.rank());
    }

    #[test]
    fn test_action_dispatch() {
        let handler = RecordingHandler::default();

        AlertAction::create_appointment("Schedule").dispatch(&handler);
        AlertAction::view_appointment("View", "apt-9").dispatch(&handler);

        assert_eq!(*handler.calls.borrow(), vec!["create", "view:apt-9"]);
    }

    #[test]
    fn test_action_target_serialization() {
        let action = AlertAction::view_appointment("View", "apt-1");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["target"]["type"], "view_appointment");
        assert_eq!(json["target"]["appointment_id"], "apt-1");
    }
}

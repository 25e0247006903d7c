//! Appointment models as delivered by the patient record service.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Category of a pharmacy appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    /// Medication therapy management session
    MtmSession,
    HealthCheck,
    Vaccination,
    GeneralFollowup,
    ChronicDiseaseReview,
    /// Any category this library does not know about
    #[serde(other)]
    Other,
}

impl AppointmentType {
    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MtmSession => "mtm_session",
            Self::HealthCheck => "health_check",
            Self::Vaccination => "vaccination",
            Self::GeneralFollowup => "general_followup",
            Self::ChronicDiseaseReview => "chronic_disease_review",
            Self::Other => "other",
        }
    }

    /// Parse a stored value. Unknown categories map to [`AppointmentType::Other`].
    pub fn from_wire(value: &str) -> Self {
        match value {
            "mtm_session" => Self::MtmSession,
            "health_check" => Self::HealthCheck,
            "vaccination" => Self::Vaccination,
            "general_followup" => Self::GeneralFollowup,
            "chronic_disease_review" => Self::ChronicDiseaseReview,
            _ => Self::Other,
        }
    }

    /// Human-readable label used in alert text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MtmSession => "MTM Session",
            Self::HealthCheck => "Health Check",
            Self::Vaccination => "Vaccination",
            Self::GeneralFollowup => "General Follow-up",
            Self::ChronicDiseaseReview => "Chronic Disease Review",
            Self::Other => "Appointment",
        }
    }
}

/// Lifecycle status of an appointment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Wire/storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// Parse a stored value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(Self::Scheduled),
            "confirmed" => Some(Self::Confirmed),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }
}

/// Outcome recorded once an appointment has taken place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentOutcome {
    /// Free-text next steps, in the order the pharmacist entered them
    #[serde(default)]
    pub next_actions: Vec<String>,
}

/// A scheduled patient appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Opaque identifier assigned by the record service
    #[serde(alias = "_id")]
    pub id: String,
    /// Owning patient
    #[serde(default)]
    pub patient_id: String,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    /// Calendar date in the pharmacy's local time
    pub scheduled_date: NaiveDate,
    /// Local time of day, "HH:MM"
    pub scheduled_time: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub outcome: Option<AppointmentOutcome>,
}

impl Appointment {
    /// Create a new scheduled appointment with a fresh ID.
    pub fn new(
        patient_id: String,
        appointment_type: AppointmentType,
        scheduled_date: NaiveDate,
        scheduled_time: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            appointment_type,
            scheduled_date,
            scheduled_time,
            status: AppointmentStatus::Scheduled,
            outcome: None,
        }
    }

    /// Parsed time of day, `None` if the stored string is malformed.
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        let raw = self.scheduled_time.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }

    /// Combined local date and time of the appointment.
    pub fn scheduled_at(&self) -> Option<NaiveDateTime> {
        self.time_of_day().map(|t| self.scheduled_date.and_time(t))
    }

    /// Whole calendar days between the scheduled date and `now`.
    ///
    /// Negative for appointments in the future.
    pub fn days_since(&self, now: NaiveDateTime) -> i64 {
        (now.date() - self.scheduled_date).num_days()
    }

    /// Whether the appointment is still expected to happen.
    pub fn is_active(&self) -> bool {
        !matches!(
            self.status,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed
        )
    }

    /// Whether any recorded next action mentions `keyword` (case-insensitive).
    ///
    /// A missing outcome never recommends anything.
    pub fn recommends_follow_up(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.outcome
            .as_ref()
            .map(|outcome| {
                outcome
                    .next_actions
                    .iter()
                    .any(|action| action.to_lowercase().contains(&keyword))
            })
            .unwrap_or(false)
    }

    /// Ordering key for "most recent first" comparisons.
    ///
    /// A malformed time sorts before every valid time on the same date.
    pub fn recency_key(&self) -> (NaiveDate, Option<NaiveTime>) {
        (self.scheduled_date, self.time_of_day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_appointment() {
        let apt = Appointment::new(
            "patient-1".into(),
            AppointmentType::HealthCheck,
            date(2024, 3, 1),
            "09:30".into(),
        );
        assert_eq!(apt.id.len(), 36);
        assert_eq!(apt.status, AppointmentStatus::Scheduled);
        assert!(apt.outcome.is_none());
    }

    #[test]
    fn test_scheduled_at_parses_both_formats() {
        let mut apt = Appointment::new(
            "p".into(),
            AppointmentType::Vaccination,
            date(2024, 3, 1),
            "14:05".into(),
        );
        assert_eq!(
            apt.scheduled_at(),
            Some(date(2024, 3, 1).and_hms_opt(14, 5, 0).unwrap())
        );

        apt.scheduled_time = "14:05:30".into();
        assert_eq!(
            apt.scheduled_at(),
            Some(date(2024, 3, 1).and_hms_opt(14, 5, 30).unwrap())
        );

        apt.scheduled_time = "afternoon".into();
        assert!(apt.scheduled_at().is_none());
    }

    #[test]
    fn test_recommends_follow_up() {
        let mut apt = Appointment::new(
            "p".into(),
            AppointmentType::MtmSession,
            date(2024, 3, 1),
            "10:00".into(),
        );
        assert!(!apt.recommends_follow_up("follow"));

        apt.outcome = Some(AppointmentOutcome {
            next_actions: vec!["Continue current therapy".into()],
        });
        assert!(!apt.recommends_follow_up("follow"));

        apt.outcome = Some(AppointmentOutcome {
            next_actions: vec!["Recheck BP".into(), "FOLLOW-UP in 2 weeks".into()],
        });
        assert!(apt.recommends_follow_up("follow"));
    }

    #[test]
    fn test_deserialize_record_service_payload() {
        let json = r#"{
            "_id": "apt-42",
            "patientId": "patient-7",
            "type": "chronic_disease_review",
            "scheduledDate": "2024-05-10",
            "scheduledTime": "08:15",
            "status": "no_show",
            "outcome": {}
        }"#;

        let apt: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(apt.id, "apt-42");
        assert_eq!(apt.appointment_type, AppointmentType::ChronicDiseaseReview);
        assert_eq!(apt.status, AppointmentStatus::NoShow);
        assert_eq!(apt.outcome.unwrap().next_actions.len(), 0);
    }

    #[test]
    fn test_unknown_type_maps_to_other() {
        let json = r#"{
            "id": "apt-1",
            "type": "smoking_cessation",
            "scheduledDate": "2024-05-10",
            "scheduledTime": "08:15",
            "status": "scheduled"
        }"#;

        let apt: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(apt.appointment_type, AppointmentType::Other);
        assert_eq!(apt.patient_id, "");
        assert_eq!(AppointmentType::from_wire("smoking_cessation"), AppointmentType::Other);
    }

    #[test]
    fn test_status_round_trip_strings() {
        assert_eq!(AppointmentStatus::parse("no_show"), Some(AppointmentStatus::NoShow));
        assert_eq!(AppointmentStatus::NoShow.as_str(), "no_show");
        assert_eq!(AppointmentStatus::parse("rescheduled"), None);
    }
}

//! Appointment database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentOutcome, AppointmentStatus, AppointmentType};

const DATE_FORMAT: &str = "%Y-%m-%d";

impl Database {
    /// Insert an appointment, or replace the cached copy with the same ID.
    pub fn upsert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        let outcome_json = appointment
            .outcome
            .as_ref()
            .map(|outcome| serde_json::to_string(outcome))
            .transpose()?;

        self.conn.execute(
            r#"
            INSERT INTO appointments (
                id, patient_id, appointment_type, scheduled_date,
                scheduled_time, status, outcome
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                patient_id = excluded.patient_id,
                appointment_type = excluded.appointment_type,
                scheduled_date = excluded.scheduled_date,
                scheduled_time = excluded.scheduled_time,
                status = excluded.status,
                outcome = excluded.outcome,
                updated_at = datetime('now')
            "#,
            params![
                appointment.id,
                appointment.patient_id,
                appointment.appointment_type.as_str(),
                appointment.scheduled_date.format(DATE_FORMAT).to_string(),
                appointment.scheduled_time,
                appointment.status.as_str(),
                outcome_json,
            ],
        )?;

        tracing::debug!(
            appointment_id = %appointment.id,
            status = appointment.status.as_str(),
            "Cached appointment"
        );
        Ok(())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, appointment_type, scheduled_date,
                       scheduled_time, status, outcome
                FROM appointments
                WHERE id = ?
                "#,
                [id],
                AppointmentRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List a patient's appointments, most recent first.
    ///
    /// This is the order alert derivation documents for its input.
    pub fn list_patient_appointments(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, appointment_type, scheduled_date,
                   scheduled_time, status, outcome
            FROM appointments
            WHERE patient_id = ?
            ORDER BY scheduled_date DESC, scheduled_time DESC, rowid ASC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], AppointmentRow::from_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// Change an appointment's status.
    pub fn update_appointment_status(&self, id: &str, status: AppointmentStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE appointments SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Store the outcome of a visit and mark it completed.
    pub fn record_appointment_outcome(
        &self,
        id: &str,
        outcome: &AppointmentOutcome,
    ) -> DbResult<bool> {
        let outcome_json = serde_json::to_string(outcome)?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                outcome = ?2,
                status = 'completed',
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![id, outcome_json],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete an appointment.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Raw row as stored; converted with validation.
struct AppointmentRow {
    id: String,
    patient_id: String,
    appointment_type: String,
    scheduled_date: String,
    scheduled_time: String,
    status: String,
    outcome: Option<String>,
}

impl AppointmentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            appointment_type: row.get(2)?,
            scheduled_date: row.get(3)?,
            scheduled_time: row.get(4)?,
            status: row.get(5)?,
            outcome: row.get(6)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let scheduled_date = NaiveDate::parse_from_str(&row.scheduled_date, DATE_FORMAT)
            .map_err(|_| DbError::InvalidValue {
                column: "scheduled_date",
                value: row.scheduled_date.clone(),
            })?;
        let status = AppointmentStatus::parse(&row.status).ok_or_else(|| DbError::InvalidValue {
            column: "status",
            value: row.status.clone(),
        })?;
        let outcome = row
            .outcome
            .as_deref()
            .map(serde_json::from_str::<AppointmentOutcome>)
            .transpose()?;

        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            appointment_type: AppointmentType::from_wire(&row.appointment_type),
            scheduled_date,
            scheduled_time: row.scheduled_time,
            status,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_appointment(id: &str, date: &str, time: &str) -> Appointment {
        Appointment {
            id: id.into(),
            patient_id: "patient-1".into(),
            appointment_type: AppointmentType::MtmSession,
            scheduled_date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            scheduled_time: time.into(),
            status: AppointmentStatus::Scheduled,
            outcome: None,
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let db = setup_db();
        let mut apt = make_appointment("apt-1", "2024-06-01", "09:00");
        db.upsert_appointment(&apt).unwrap();

        let loaded = db.get_appointment("apt-1").unwrap().unwrap();
        assert_eq!(loaded, apt);

        apt.status = AppointmentStatus::Confirmed;
        apt.scheduled_time = "10:30".into();
        db.upsert_appointment(&apt).unwrap();

        let loaded = db.get_appointment("apt-1").unwrap().unwrap();
        assert_eq!(loaded.status, AppointmentStatus::Confirmed);
        assert_eq!(loaded.scheduled_time, "10:30");
    }

    #[test]
    fn test_get_missing() {
        let db = setup_db();
        assert!(db.get_appointment("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_most_recent_first() {
        let db = setup_db();
        db.upsert_appointment(&make_appointment("a", "2024-05-01", "09:00")).unwrap();
        db.upsert_appointment(&make_appointment("b", "2024-06-01", "08:00")).unwrap();
        db.upsert_appointment(&make_appointment("c", "2024-06-01", "15:00")).unwrap();

        let mut other = make_appointment("x", "2024-07-01", "09:00");
        other.patient_id = "patient-2".into();
        db.upsert_appointment(&other).unwrap();

        let ids: Vec<_> = db
            .list_patient_appointments("patient-1")
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_record_outcome_completes() {
        let db = setup_db();
        db.upsert_appointment(&make_appointment("a", "2024-05-01", "09:00")).unwrap();

        let outcome = AppointmentOutcome {
            next_actions: vec!["Schedule follow-up in 2 weeks".into()],
        };
        assert!(db.record_appointment_outcome("a", &outcome).unwrap());

        let loaded = db.get_appointment("a").unwrap().unwrap();
        assert_eq!(loaded.status, AppointmentStatus::Completed);
        assert_eq!(loaded.outcome, Some(outcome));
    }

    #[test]
    fn test_update_status_and_delete() {
        let db = setup_db();
        db.upsert_appointment(&make_appointment("a", "2024-05-01", "09:00")).unwrap();

        assert!(db.update_appointment_status("a", AppointmentStatus::NoShow).unwrap());
        assert!(!db.update_appointment_status("missing", AppointmentStatus::NoShow).unwrap());
        assert_eq!(
            db.get_appointment("a").unwrap().unwrap().status,
            AppointmentStatus::NoShow
        );

        assert!(db.delete_appointment("a").unwrap());
        assert!(!db.delete_appointment("a").unwrap());
    }

    #[test]
    fn test_corrupt_date_is_reported() {
        let db = setup_db();
        db.conn()
            .execute(
                "INSERT INTO appointments (id, patient_id, appointment_type, scheduled_date, scheduled_time)
                 VALUES ('bad', 'patient-1', 'vaccination', 'June 1st', '09:00')",
                [],
            )
            .unwrap();

        let err = db.get_appointment("bad").unwrap_err();
        assert!(matches!(err, DbError::InvalidValue { column: "scheduled_date", .. }));
    }
}

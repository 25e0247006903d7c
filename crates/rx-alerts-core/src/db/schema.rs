//! SQLite schema definition.

/// Complete database schema for rx-alerts.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Appointments (local cache of the record service)
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    appointment_type TEXT NOT NULL,
    scheduled_date TEXT NOT NULL,                 -- YYYY-MM-DD, local
    scheduled_time TEXT NOT NULL,                 -- HH:MM, local
    status TEXT NOT NULL DEFAULT 'scheduled'
        CHECK (status IN ('scheduled', 'confirmed', 'completed', 'cancelled', 'no_show')),
    outcome TEXT,                                 -- JSON object {nextActions: [...]}
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Alert derivation reads a patient's appointments most recent first
CREATE INDEX IF NOT EXISTS idx_appointments_patient_date
    ON appointments(patient_id, scheduled_date DESC, scheduled_time DESC);
CREATE INDEX IF NOT EXISTS idx_appointments_status ON appointments(status);
"#;

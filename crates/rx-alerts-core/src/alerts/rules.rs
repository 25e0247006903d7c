//! Individual alert rules.
//!
//! Each rule appends its alerts to the candidate list in input order. Rules
//! are independent: one appointment may trigger several of them.

use std::cmp::Reverse;

use chrono::{Duration, NaiveDateTime, NaiveTime};

use super::config::AlertConfig;
use crate::models::{Alert, AlertAction, AlertKind, AlertSeverity, Appointment, AppointmentStatus};

const DATE_FORMAT: &str = "%b %-d, %Y";

/// Inputs shared by every rule for one derivation.
pub(crate) struct RuleContext<'a> {
    pub now: NaiveDateTime,
    pub config: &'a AlertConfig,
}

impl RuleContext<'_> {
    fn action(&self, action: AlertAction) -> Option<AlertAction> {
        self.config.attach_actions.then_some(action)
    }

    fn alert(
        &self,
        kind: AlertKind,
        severity: AlertSeverity,
        source: &Appointment,
        title: &str,
        message: String,
        action: AlertAction,
    ) -> Alert {
        Alert {
            id: format!("{}-{}", kind.id_prefix(), source.id),
            kind,
            severity,
            title: title.into(),
            message,
            appointment: Some(source.clone()),
            action: self.action(action),
        }
    }
}

/// First appointment with the latest date/time among those matching `status`.
fn most_recent_with_status(
    appointments: &[Appointment],
    status: AppointmentStatus,
) -> Option<&Appointment> {
    appointments
        .iter()
        .filter(|apt| apt.status == status)
        .min_by_key(|apt| Reverse(apt.recency_key()))
}

fn elapsed_phrase(elapsed: Duration) -> String {
    let hours = elapsed.num_hours();
    if hours < 24 {
        format!("{} hours ago", hours)
    } else {
        format!("{} days ago", hours / 24)
    }
}

/// Scheduled appointments whose start time has already passed.
pub(crate) fn overdue(ctx: &RuleContext<'_>, appointments: &[Appointment], out: &mut Vec<Alert>) {
    for apt in appointments
        .iter()
        .filter(|apt| apt.status == AppointmentStatus::Scheduled)
    {
        let Some(scheduled_at) = apt.scheduled_at() else {
            tracing::warn!(
                appointment_id = %apt.id,
                scheduled_time = %apt.scheduled_time,
                "Skipping overdue check for appointment with malformed time"
            );
            continue;
        };
        if scheduled_at >= ctx.now {
            continue;
        }

        out.push(ctx.alert(
            AlertKind::Overdue,
            AlertSeverity::Error,
            apt,
            "Overdue Appointment",
            format!(
                "{} was scheduled {}",
                apt.appointment_type.label(),
                elapsed_phrase(ctx.now - scheduled_at)
            ),
            AlertAction::view_appointment("Reschedule", apt.id.clone()),
        ));
    }
}

/// Active appointments on the current calendar day.
pub(crate) fn today(ctx: &RuleContext<'_>, appointments: &[Appointment], out: &mut Vec<Alert>) {
    let today = ctx.now.date();
    for apt in appointments
        .iter()
        .filter(|apt| apt.scheduled_date == today && apt.is_active())
    {
        out.push(ctx.alert(
            AlertKind::Today,
            AlertSeverity::Warning,
            apt,
            "Appointment Today",
            format!("{} at {}", apt.appointment_type.label(), apt.scheduled_time),
            AlertAction::view_appointment("View", apt.id.clone()),
        ));
    }
}

/// Non-cancelled appointments on the next calendar day.
pub(crate) fn tomorrow(ctx: &RuleContext<'_>, appointments: &[Appointment], out: &mut Vec<Alert>) {
    let Some(tomorrow) = ctx.now.date().succ_opt() else {
        return;
    };
    for apt in appointments.iter().filter(|apt| {
        apt.scheduled_date == tomorrow && apt.status != AppointmentStatus::Cancelled
    }) {
        out.push(ctx.alert(
            AlertKind::Tomorrow,
            AlertSeverity::Info,
            apt,
            "Appointment Tomorrow",
            format!("{} at {}", apt.appointment_type.label(), apt.scheduled_time),
            AlertAction::view_appointment("View", apt.id.clone()),
        ));
    }
}

/// A single alert for the most recent no-show.
pub(crate) fn missed(ctx: &RuleContext<'_>, appointments: &[Appointment], out: &mut Vec<Alert>) {
    let Some(apt) = most_recent_with_status(appointments, AppointmentStatus::NoShow) else {
        return;
    };

    out.push(ctx.alert(
        AlertKind::Missed,
        AlertSeverity::Warning,
        apt,
        "Missed Appointment",
        format!(
            "Patient missed {} on {}",
            apt.appointment_type.label(),
            apt.scheduled_date.format(DATE_FORMAT)
        ),
        AlertAction::create_appointment("Reschedule"),
    ));
}

/// Either "no appointments at all" or "last completed visit is too old".
pub(crate) fn no_recent(ctx: &RuleContext<'_>, appointments: &[Appointment], out: &mut Vec<Alert>) {
    if appointments.is_empty() {
        out.push(Alert {
            id: "no-appointments".into(),
            kind: AlertKind::NoRecent,
            severity: AlertSeverity::Info,
            title: "No Appointments Scheduled".into(),
            message: "This patient has no appointments on record".into(),
            appointment: None,
            action: ctx.action(AlertAction::create_appointment("Schedule Appointment")),
        });
        return;
    }

    let Some(last) = most_recent_with_status(appointments, AppointmentStatus::Completed) else {
        return;
    };
    let days = last.days_since(ctx.now);
    if days <= ctx.config.no_recent_days {
        return;
    }

    out.push(ctx.alert(
        AlertKind::NoRecent,
        AlertSeverity::Info,
        last,
        "No Recent Appointments",
        format!("Last appointment was {} days ago", days),
        AlertAction::create_appointment("Schedule Appointment"),
    ));
}

/// Recent completed visits whose outcome asks for a follow-up.
pub(crate) fn follow_up_needed(
    ctx: &RuleContext<'_>,
    appointments: &[Appointment],
    out: &mut Vec<Alert>,
) {
    // None: the window reaches past the representable range, so it is unbounded
    let window_start = Duration::try_days(ctx.config.follow_up_window_days)
        .and_then(|window| ctx.now.checked_sub_signed(window));
    let keyword = ctx.config.follow_up_keyword.as_str();

    for apt in appointments.iter().filter(|apt| {
        apt.status == AppointmentStatus::Completed
            && window_start.map_or(true, |start| apt.scheduled_date.and_time(NaiveTime::MIN) >= start)
            && apt.recommends_follow_up(keyword)
    }) {
        out.push(ctx.alert(
            AlertKind::FollowUpNeeded,
            AlertSeverity::Warning,
            apt,
            "Follow-up Needed",
            format!(
                "Follow-up recommended after {} on {}",
                apt.appointment_type.label(),
                apt.scheduled_date.format(DATE_FORMAT)
            ),
            AlertAction::create_appointment("Schedule Follow-up"),
        ));
    }
}

//! Maps audit status to the follow-up a warehouse team must take.

use crate::types::{AuditStatus, RequiredAction};

/// Missing or negative counts need a physical recount; statistical
/// anomalies need a supervisor to confirm; everything else needs nothing.
pub fn required_action(status: AuditStatus) -> RequiredAction {
    match status {
        AuditStatus::Missing | AuditStatus::Negative => RequiredAction::UrgentRecount,
        AuditStatus::StatAnomaly => RequiredAction::SupervisorCheck,
        AuditStatus::Outlier | AuditStatus::Clean => RequiredAction::None,
    }
}

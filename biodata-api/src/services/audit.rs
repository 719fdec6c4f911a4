use uuid::Uuid;

use crate::models::{AdminActionKind, NewAdminAction};
use crate::store::Store;

/// Appends an audit record. A failed write is logged and otherwise ignored:
/// the admin operation it describes has already happened.
pub fn record(
    store: &dyn Store,
    action: AdminActionKind,
    admin_id: Uuid,
    profile_id: Option<Uuid>,
    reason: Option<String>,
    notes: Option<String>,
) {
    let entry = NewAdminAction {
        action,
        reason,
        notes,
        admin_id,
        profile_id,
    };

    match store.insert_admin_action(entry) {
        Ok(saved) => tracing::debug!(action_id = %saved.id, action = %action, "admin action recorded"),
        Err(e) => tracing::error!(
            error = %e,
            action = %action,
            admin_id = %admin_id,
            profile_id = ?profile_id,
            "failed to record admin action"
        ),
    }
}

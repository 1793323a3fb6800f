//! Workout routine adapter
//!
//! Routines hold sessions, each with a list of exercises. Older records kept
//! a flat `exercises` list on the routine itself; both shapes are covered.

use crate::engine::FieldAllowlist;

use super::EntityAdapter;

/// A workout routine
#[derive(Debug, Clone)]
pub struct RoutineAdapter {
    allowlist: FieldAllowlist,
}

impl RoutineAdapter {
    pub fn new() -> Self {
        let exercise = FieldAllowlist::new().text("notes");
        Self {
            allowlist: FieldAllowlist::new()
                .text("name")
                .text("description")
                .nested(
                    "sessions",
                    FieldAllowlist::new().nested("exercises", exercise.clone()),
                )
                // Legacy flat shape
                .nested("exercises", exercise),
        }
    }
}

impl Default for RoutineAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityAdapter for RoutineAdapter {
    fn entity_type(&self) -> &'static str {
        "routine"
    }

    fn allowlist(&self) -> &FieldAllowlist {
        &self.allowlist
    }

    fn date_fields(&self) -> &'static [&'static str] {
        &["createdAt", "updatedAt", "lastCompleted", "sessions.date"]
    }
}

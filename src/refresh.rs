//! When the candidate set is considered current, and which executed statements
//! should trigger a background refresh of the schema partition.
use crate::*;

/// Freshness of the published candidate set.
///
/// `Stale` until the first successful build after a connect; `Fresh` afterwards,
/// and it stays `Fresh` across failed refreshes because the previous set is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum RefreshState {
    #[default]
    #[display("stale")]
    Stale,
    #[display("fresh")]
    Fresh,
}

impl RefreshState {
    pub fn is_fresh(self) -> bool {
        self == RefreshState::Fresh
    }
}

/// Which executed statements cause a schema refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum RefreshTrigger {
    /// Refresh after every statement that produced no result set.
    #[default]
    #[display("always")]
    Always,
    /// Refresh only after statements that may have changed the schema.
    #[display("ddl-only")]
    DdlOnly,
}

impl RefreshTrigger {
    /// Whether executing `sql` (which produced no result set) should refresh the schema.
    pub fn should_refresh(self, sql: &str) -> bool {
        match self {
            RefreshTrigger::Always => true,
            RefreshTrigger::DdlOnly => {
                let kind = StatementKind::classify(sql);
                trace!("Statement classified as {kind} for refresh");
                kind.may_change_schema()
            }
        }
    }
}

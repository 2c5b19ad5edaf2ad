//! Policy engine: which statement kinds may execute under which mode.

use std::fmt;

use crate::validator::classify::StatementKind;

/// Operating mode for SQL validation.
///
/// Read once from configuration at startup and passed by value into
/// [`crate::validator::validate`]; never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityMode {
    /// Only read-oriented statement kinds, single statement per call.
    #[default]
    Restrictive,
    /// Everything the tokenizer accepts. Enabled via
    /// `ALLOW_DANGEROUS_OPERATIONS`.
    Permissive,
}

impl fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restrictive => write!(f, "restrictive"),
            Self::Permissive => write!(f, "permissive"),
        }
    }
}

/// Decide whether a single statement kind is allowed under `mode`.
///
/// Total and pure: no I/O, no state, safe to call from any number of
/// request handlers concurrently. `Union` passes because a set combinator
/// is judged by its operands, which the walker reports separately;
/// `Unknown` never passes.
pub fn is_allowed(kind: StatementKind, mode: SecurityMode) -> bool {
    match mode {
        SecurityMode::Permissive => true,
        SecurityMode::Restrictive => matches!(
            kind,
            StatementKind::Select
                | StatementKind::Show
                | StatementKind::Describe
                | StatementKind::Explain
                | StatementKind::Union
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: &[StatementKind] = &[
        StatementKind::Select,
        StatementKind::Show,
        StatementKind::Describe,
        StatementKind::Explain,
        StatementKind::Insert,
        StatementKind::Update,
        StatementKind::Delete,
        StatementKind::Drop,
        StatementKind::Create,
        StatementKind::Alter,
        StatementKind::Truncate,
        StatementKind::Grant,
        StatementKind::Revoke,
        StatementKind::SetOrConfig,
        StatementKind::Union,
        StatementKind::Unknown,
    ];

    #[test]
    fn test_permissive_allows_everything() {
        for &kind in ALL_KINDS {
            assert!(is_allowed(kind, SecurityMode::Permissive), "{kind}");
        }
    }

    #[test]
    fn test_restrictive_allows_read_kinds() {
        for kind in [
            StatementKind::Select,
            StatementKind::Show,
            StatementKind::Describe,
            StatementKind::Explain,
        ] {
            assert!(is_allowed(kind, SecurityMode::Restrictive), "{kind}");
        }
    }

    #[test]
    fn test_restrictive_denies_writes_and_ddl() {
        for kind in [
            StatementKind::Insert,
            StatementKind::Update,
            StatementKind::Delete,
            StatementKind::Drop,
            StatementKind::Create,
            StatementKind::Alter,
            StatementKind::Truncate,
            StatementKind::Grant,
            StatementKind::Revoke,
            StatementKind::SetOrConfig,
        ] {
            assert!(!is_allowed(kind, SecurityMode::Restrictive), "{kind}");
        }
    }

    #[test]
    fn test_union_is_never_the_deciding_kind() {
        assert!(is_allowed(StatementKind::Union, SecurityMode::Restrictive));
    }

    #[test]
    fn test_unknown_always_denied_under_restrictive() {
        assert!(!is_allowed(StatementKind::Unknown, SecurityMode::Restrictive));
    }

    #[test]
    fn test_default_mode_is_restrictive() {
        assert_eq!(SecurityMode::default(), SecurityMode::Restrictive);
    }
}

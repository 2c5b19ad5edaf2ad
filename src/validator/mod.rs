//! SQL statement validation for read-only enforcement.
//!
//! This module decides whether an arbitrary SQL text submitted by an
//! untrusted caller is safe to execute under the restrictive policy. It
//! classifies every statement kind reachable in the parsed statement tree -
//! top-level, inside subqueries and CTE bodies, and in every operand of a
//! set combinator - and checks each against the allow-list. Anything the
//! parser or classifier cannot establish as safe is denied: parse failures,
//! unknown verbs, and pathological nesting all fail closed.
//!
//! The entry point is [`validate`]; it is a pure function over the input
//! text and the [`SecurityMode`], safe for concurrent use without
//! coordination.

pub mod classify;
pub mod policy;
pub mod tree;
pub mod walker;

pub use classify::StatementKind;
pub use policy::{SecurityMode, is_allowed};
pub use tree::{MAX_NESTING_DEPTH, ParseError};
pub use walker::ReachableKind;

use walker::WalkError;

/// The category of a denial, mirrored in the denial reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// The text could not be tokenized or structured at all.
    ParseFailure,
    /// More than one top-level statement under restrictive mode.
    MultiStatement,
    /// A reachable statement kind outside the allow-list.
    ForbiddenStatement,
    /// Statement nesting beyond [`MAX_NESTING_DEPTH`].
    DepthExceeded,
    /// A blocked function or construct inside an allowed statement.
    DangerousConstruct,
}

/// A rejected validation. `reason` is surfaced verbatim to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Denial {
    pub violation: Violation,
    pub reason: String,
    /// The statement kind that triggered the denial, when one did.
    pub offending_kind: Option<StatementKind>,
    /// Nesting depth at which the offending construct was found.
    pub depth: usize,
}

/// The result of validating one SQL text. Produced fresh per call, never
/// cached.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Allowed,
    Denied(Denial),
}

impl ValidationOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Allowed => None,
            Self::Denied(denial) => Some(denial),
        }
    }
}

fn denied(
    violation: Violation,
    reason: String,
    offending_kind: Option<StatementKind>,
    depth: usize,
) -> ValidationOutcome {
    ValidationOutcome::Denied(Denial {
        violation,
        reason,
        offending_kind,
        depth,
    })
}

/// Validate a SQL text under the given mode.
///
/// Restrictive mode accepts exactly one top-level statement whose full set
/// of reachable statement kinds lies within the allow-list (SELECT, SHOW,
/// DESCRIBE, EXPLAIN) and which contains no blocked construct. Permissive
/// mode accepts anything the tokenizer accepts, including multiple
/// statements. In both modes, untokenizable input is denied.
///
/// # Examples
///
/// ```
/// use pg_mcp_server::validator::{SecurityMode, validate};
///
/// assert!(validate("SELECT * FROM users", SecurityMode::Restrictive).is_allowed());
/// assert!(!validate("DROP TABLE users", SecurityMode::Restrictive).is_allowed());
/// assert!(validate("DROP TABLE users", SecurityMode::Permissive).is_allowed());
/// ```
pub fn validate(sql: &str, mode: SecurityMode) -> ValidationOutcome {
    let statements = match tree::parse_statements(sql) {
        Ok(statements) => statements,
        Err(ParseError::TooDeep) => {
            return denied(
                Violation::DepthExceeded,
                format!(
                    "Statement nesting exceeds the maximum depth of {MAX_NESTING_DEPTH}, query rejected"
                ),
                None,
                MAX_NESTING_DEPTH,
            );
        }
        Err(err) => {
            return denied(
                Violation::ParseFailure,
                format!("SQL parsing failed, query rejected: {err}"),
                None,
                0,
            );
        }
    };

    if mode == SecurityMode::Permissive {
        return ValidationOutcome::Allowed;
    }

    // The primary defense against `;`-separated injection riding on a safe
    // first statement: under restrictive mode the count alone is a denial.
    if statements.len() > 1 {
        return denied(
            Violation::MultiStatement,
            format!(
                "Multiple SQL statements are not allowed in a single query ({} found)",
                statements.len()
            ),
            None,
            0,
        );
    }

    for statement in &statements {
        let kinds = match walker::reachable_kinds(statement) {
            Ok(kinds) => kinds,
            Err(WalkError::DepthExceeded { depth }) => {
                return denied(
                    Violation::DepthExceeded,
                    format!(
                        "Statement nesting exceeds the maximum depth of {MAX_NESTING_DEPTH}, query rejected"
                    ),
                    None,
                    depth,
                );
            }
        };

        for reachable in kinds {
            if !policy::is_allowed(reachable.kind, mode) {
                let reason = if reachable.depth == 0 {
                    format!(
                        "Disallowed SQL command: {}. Only SELECT, SHOW, DESCRIBE, EXPLAIN \
                         queries are allowed unless dangerous operations are enabled.",
                        reachable.kind
                    )
                } else {
                    format!(
                        "Detected dangerous {} operation nested in the statement",
                        reachable.kind
                    )
                };
                return denied(
                    Violation::ForbiddenStatement,
                    reason,
                    Some(reachable.kind),
                    reachable.depth,
                );
            }
        }

        if let Some(construct) = walker::find_dangerous_construct(statement) {
            return denied(
                Violation::DangerousConstruct,
                format!(
                    "Detected dangerous {} operation, query rejected",
                    construct.description
                ),
                None,
                construct.depth,
            );
        }
    }

    ValidationOutcome::Allowed
}

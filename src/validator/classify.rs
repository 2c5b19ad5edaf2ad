//! Statement classification.
//!
//! Maps a statement tree to a [`StatementKind`] by its leading tokens. The
//! kind set is closed and the fallback is [`StatementKind::Unknown`], which
//! the policy engine always denies, so an unrecognized verb can never slip
//! through as safe.

use std::fmt;

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::Token;

use crate::validator::tree::{Node, StatementTree};

/// The closed set of statement kinds the policy engine decides over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Show,
    Describe,
    Explain,
    Insert,
    Update,
    Delete,
    Drop,
    Create,
    Alter,
    Truncate,
    Grant,
    Revoke,
    /// SET, RESET, USE - session and configuration changes.
    SetOrConfig,
    /// A statement combining operands via UNION/INTERSECT/EXCEPT. Never the
    /// deciding kind itself; its operands are classified separately.
    Union,
    /// Anything the classifier cannot confidently name. Always denied.
    Unknown,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Show => "SHOW",
            Self::Describe => "DESCRIBE",
            Self::Explain => "EXPLAIN",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Drop => "DROP",
            Self::Create => "CREATE",
            Self::Alter => "ALTER",
            Self::Truncate => "TRUNCATE",
            Self::Grant => "GRANT",
            Self::Revoke => "REVOKE",
            Self::SetOrConfig => "SET",
            Self::Union => "UNION",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a defining keyword to its statement kind. Keywords that never open a
/// statement (FROM, AS, WITH, ...) map to nothing and are scanned past.
fn keyword_kind(keyword: Keyword) -> Option<StatementKind> {
    match keyword {
        Keyword::SELECT => Some(StatementKind::Select),
        Keyword::SHOW => Some(StatementKind::Show),
        Keyword::DESCRIBE | Keyword::DESC => Some(StatementKind::Describe),
        Keyword::EXPLAIN => Some(StatementKind::Explain),
        Keyword::INSERT => Some(StatementKind::Insert),
        Keyword::UPDATE => Some(StatementKind::Update),
        Keyword::DELETE => Some(StatementKind::Delete),
        Keyword::DROP => Some(StatementKind::Drop),
        Keyword::CREATE => Some(StatementKind::Create),
        Keyword::ALTER => Some(StatementKind::Alter),
        Keyword::TRUNCATE => Some(StatementKind::Truncate),
        Keyword::GRANT => Some(StatementKind::Grant),
        Keyword::REVOKE => Some(StatementKind::Revoke),
        Keyword::SET | Keyword::RESET | Keyword::USE => Some(StatementKind::SetOrConfig),
        _ => None,
    }
}

/// Classify a statement tree by its leading tokens, case-insensitively.
///
/// A top-level set combinator makes the statement [`StatementKind::Union`]
/// regardless of what its operands are. Otherwise the first recognized
/// keyword at the tree's own level decides; this naturally skips a `WITH`
/// clause (CTE names, AS, commas and the parenthesized bodies) and lands on
/// the main statement verb. A statement that is a sole parenthesized group,
/// e.g. `(SELECT 1)`, classifies as the group does.
pub fn classify(tree: &StatementTree) -> StatementKind {
    if tree.has_top_level_combinator() {
        return StatementKind::Union;
    }

    for token in tree.significant_tokens() {
        if let Token::Word(word) = token {
            if word.quote_style.is_none() {
                if let Some(kind) = keyword_kind(word.keyword) {
                    return kind;
                }
            }
        }
    }

    if let Some(Node::Group(inner)) = tree.first_significant_node() {
        return classify(inner);
    }
    StatementKind::Unknown
}

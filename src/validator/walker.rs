//! Recursive safety walker.
//!
//! Enumerates every statement kind reachable inside one statement tree:
//! the root, every set-combinator operand, every EXPLAIN body, and every
//! parenthesized subquery or CTE body that is statement-shaped. Traversal
//! uses an explicit work stack with a hard depth bound, so adversarially
//! deep input produces a clean denial instead of a stack overflow.

use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::Token;

use crate::validator::classify::{StatementKind, classify};
use crate::validator::tree::{MAX_NESTING_DEPTH, Node, StatementTree};

/// A statement kind found somewhere in a statement tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachableKind {
    pub kind: StatementKind,
    /// Nesting depth at which the kind was found; 0 is the statement root.
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkError {
    DepthExceeded { depth: usize },
}

/// Enumerate every reachable statement kind, root first.
///
/// Expression groups (column lists, argument lists) are not statements:
/// they are descended through, in case a statement hides deeper inside,
/// but not reported. Branch subtrees are always reported, including an
/// `Unknown` operand of a set combinator - that stays fail-closed.
pub fn reachable_kinds(tree: &StatementTree) -> Result<Vec<ReachableKind>, WalkError> {
    let mut found = vec![ReachableKind {
        kind: classify(tree),
        depth: 0,
    }];
    let mut work: Vec<(&StatementTree, usize)> = vec![(tree, 0)];

    while let Some((current, depth)) = work.pop() {
        let child_depth = depth + 1;
        if child_depth > MAX_NESTING_DEPTH {
            return Err(WalkError::DepthExceeded { depth: child_depth });
        }
        for node in current.nodes() {
            match node {
                Node::Token(_) => {}
                Node::Group(subtree) => {
                    let kind = classify(subtree);
                    if kind != StatementKind::Unknown {
                        found.push(ReachableKind {
                            kind,
                            depth: child_depth,
                        });
                    }
                    work.push((subtree, child_depth));
                }
                Node::Branch(subtree) => {
                    found.push(ReachableKind {
                        kind: classify(subtree),
                        depth: child_depth,
                    });
                    work.push((subtree, child_depth));
                }
            }
        }
    }
    Ok(found)
}

/// Server-side functions that read files, list directories, or touch large
/// objects - exfiltration vectors even inside an otherwise harmless SELECT.
const BLOCKED_FUNCTIONS: &[&str] = &[
    "pg_read_file",
    "pg_read_binary_file",
    "pg_ls_dir",
    "lo_import",
    "lo_export",
];

/// A construct that is denied regardless of the statement kind it hides in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DangerousConstruct {
    pub description: String,
    pub depth: usize,
}

/// Scan every token in the tree for blocked constructs: file-access
/// functions, `INTO OUTFILE`/`INTO DUMPFILE`, and `@@` variable access.
pub fn find_dangerous_construct(tree: &StatementTree) -> Option<DangerousConstruct> {
    let mut work: Vec<(&StatementTree, usize)> = vec![(tree, 0)];

    while let Some((current, depth)) = work.pop() {
        let mut after_into = false;
        let mut after_at = false;
        for node in current.nodes() {
            if !matches!(node, Node::Token(Token::AtSign)) {
                after_at = false;
            }
            match node {
                Node::Token(Token::Word(word)) => {
                    let lower = word.value.to_lowercase();
                    if word.quote_style.is_none()
                        && BLOCKED_FUNCTIONS.contains(&lower.as_str())
                    {
                        return Some(DangerousConstruct {
                            description: format!("file access function {lower}"),
                            depth,
                        });
                    }
                    if after_into && (lower == "outfile" || lower == "dumpfile") {
                        return Some(DangerousConstruct {
                            description: format!("INTO {}", lower.to_uppercase()),
                            depth,
                        });
                    }
                    after_into = word.keyword == Keyword::INTO;
                }
                Node::Token(Token::AtAt) => {
                    return Some(DangerousConstruct {
                        description: "system variable access".to_string(),
                        depth,
                    });
                }
                // The PostgreSQL dialect may tokenize `@@` as a custom operator.
                Node::Token(Token::CustomBinaryOperator(op)) if op.contains("@@") => {
                    return Some(DangerousConstruct {
                        description: "system variable access".to_string(),
                        depth,
                    });
                }
                // ...or as two adjacent `@` tokens.
                Node::Token(Token::AtSign) => {
                    if after_at {
                        return Some(DangerousConstruct {
                            description: "system variable access".to_string(),
                            depth,
                        });
                    }
                    after_at = true;
                }
                Node::Token(Token::Whitespace(_)) => {}
                Node::Token(_) => after_into = false,
                Node::Group(subtree) | Node::Branch(subtree) => {
                    after_into = false;
                    work.push((subtree, depth + 1));
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::tree::parse_statements;

    fn kinds_of(sql: &str) -> Vec<ReachableKind> {
        let statements = parse_statements(sql).expect("parse failed");
        reachable_kinds(&statements[0]).expect("walk failed")
    }

    fn has_kind(kinds: &[ReachableKind], kind: StatementKind) -> bool {
        kinds.iter().any(|r| r.kind == kind)
    }

    #[test]
    fn test_root_kind_always_reported() {
        let kinds = kinds_of("SELECT 1");
        assert_eq!(kinds[0].kind, StatementKind::Select);
        assert_eq!(kinds[0].depth, 0);
    }

    #[test]
    fn test_expression_groups_not_reported() {
        let kinds = kinds_of("SELECT COUNT(*) FROM t WHERE x IN (1, 2, 3)");
        assert_eq!(kinds.len(), 1, "only the root SELECT should be reported");
    }

    #[test]
    fn test_subquery_reported_with_depth() {
        let kinds = kinds_of("SELECT * FROM (SELECT id FROM t) x");
        assert!(kinds.contains(&ReachableKind {
            kind: StatementKind::Select,
            depth: 1
        }));
    }

    #[test]
    fn test_nested_delete_found() {
        let kinds = kinds_of("SELECT * FROM (DELETE FROM users RETURNING id) AS x");
        assert!(kinds.contains(&ReachableKind {
            kind: StatementKind::Delete,
            depth: 1
        }));
    }

    #[test]
    fn test_deeply_nested_statement_found() {
        let kinds = kinds_of("SELECT * FROM (SELECT * FROM (INSERT INTO t VALUES (1)) a) b");
        assert!(has_kind(&kinds, StatementKind::Insert));
    }

    #[test]
    fn test_union_operands_reported() {
        let kinds = kinds_of("SELECT a FROM t1 UNION SELECT b FROM t2");
        assert_eq!(kinds[0].kind, StatementKind::Union);
        let selects = kinds
            .iter()
            .filter(|r| r.kind == StatementKind::Select && r.depth == 1)
            .count();
        assert_eq!(selects, 2);
    }

    #[test]
    fn test_unknown_union_operand_reported() {
        // An operand the classifier cannot name must surface as Unknown,
        // not vanish as a non-statement.
        let kinds = kinds_of("SELECT a FROM t UNION FLUSH TABLES");
        assert!(has_kind(&kinds, StatementKind::Unknown));
    }

    #[test]
    fn test_explain_body_reported() {
        let kinds = kinds_of("EXPLAIN DELETE FROM t");
        assert_eq!(kinds[0].kind, StatementKind::Explain);
        assert!(kinds.contains(&ReachableKind {
            kind: StatementKind::Delete,
            depth: 1
        }));
    }

    #[test]
    fn test_cte_body_reported() {
        let kinds = kinds_of("WITH cte AS (UPDATE t SET x = 1 RETURNING x) SELECT * FROM cte");
        assert!(has_kind(&kinds, StatementKind::Update));
    }

    #[test]
    fn test_blocked_function_found() {
        let statements = parse_statements("SELECT pg_read_file('/etc/passwd')").unwrap();
        let hit = find_dangerous_construct(&statements[0]).expect("should be flagged");
        assert!(hit.description.contains("pg_read_file"));
    }

    #[test]
    fn test_blocked_function_found_in_subquery() {
        let statements =
            parse_statements("SELECT * FROM (SELECT pg_ls_dir('/')) x").unwrap();
        assert!(find_dangerous_construct(&statements[0]).is_some());
    }

    #[test]
    fn test_into_outfile_found() {
        let statements =
            parse_statements("SELECT * FROM t INTO OUTFILE '/tmp/out'").unwrap();
        let hit = find_dangerous_construct(&statements[0]).expect("should be flagged");
        assert!(hit.description.contains("OUTFILE"));
    }

    #[test]
    fn test_plain_select_not_flagged() {
        let statements =
            parse_statements("SELECT name, email FROM users WHERE id = $1").unwrap();
        assert!(find_dangerous_construct(&statements[0]).is_none());
    }

    #[test]
    fn test_quoted_identifier_not_flagged() {
        let statements = parse_statements("SELECT \"pg_read_file\" FROM t").unwrap();
        assert!(find_dangerous_construct(&statements[0]).is_none());
    }
}

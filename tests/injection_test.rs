//! Adversarial validation tests.
//!
//! These tests exercise the validator against injection patterns: multiple
//! statements riding on a safe first statement, writes smuggled into
//! subqueries, CTE bodies and UNION branches, EXPLAIN wrapping, formatting
//! tricks, and pathologically deep nesting.

use pg_mcp_server::validator::{
    MAX_NESTING_DEPTH, SecurityMode, StatementKind, ValidationOutcome, Violation, validate,
};

fn deny(sql: &str) -> pg_mcp_server::validator::Denial {
    match validate(sql, SecurityMode::Restrictive) {
        ValidationOutcome::Denied(denial) => denial,
        ValidationOutcome::Allowed => panic!("expected denial for: {sql}"),
    }
}

/// Classic `;`-separated injection: a safe SELECT towing a DROP.
#[test]
fn test_multi_statement_injection_denied() {
    let denial = deny("SELECT * FROM users; DROP TABLE users;");
    assert_eq!(denial.violation, Violation::MultiStatement);
}

/// Even two harmless statements are denied: the count alone decides.
#[test]
fn test_two_safe_statements_denied() {
    assert_eq!(
        deny("SELECT 1; SELECT 2;").violation,
        Violation::MultiStatement
    );
}

/// A comment-only trailing segment is not a second statement.
#[test]
fn test_trailing_comment_segment_is_not_a_statement() {
    assert!(validate("SELECT 1; --comment", SecurityMode::Restrictive).is_allowed());
    assert!(validate("SELECT 1;", SecurityMode::Restrictive).is_allowed());
}

/// A DELETE hidden inside a FROM-clause subquery.
#[test]
fn test_nested_delete_in_subquery_denied() {
    let denial = deny("SELECT * FROM (DELETE FROM users RETURNING id) AS x");
    assert_eq!(denial.violation, Violation::ForbiddenStatement);
    assert_eq!(denial.offending_kind, Some(StatementKind::Delete));
    assert_eq!(denial.depth, 1);
}

/// A write hidden two levels down.
#[test]
fn test_doubly_nested_write_denied() {
    let denial =
        deny("SELECT * FROM (SELECT * FROM (UPDATE t SET x = 1 RETURNING x) a) b");
    assert_eq!(denial.offending_kind, Some(StatementKind::Update));
    assert_eq!(denial.depth, 2);
}

/// A write hidden in a CTE body.
#[test]
fn test_write_in_cte_body_denied() {
    let denial =
        deny("WITH purge AS (DELETE FROM users WHERE inactive RETURNING id) SELECT * FROM purge");
    assert_eq!(denial.offending_kind, Some(StatementKind::Delete));
}

/// UNION of two SELECT branches is fine.
#[test]
fn test_union_of_selects_allowed() {
    let sql = "SELECT id FROM users UNION SELECT password FROM admin WHERE 1=1; --";
    assert!(validate(sql, SecurityMode::Restrictive).is_allowed());
    assert!(validate("SELECT a FROM t1 UNION ALL SELECT b FROM t2", SecurityMode::Restrictive).is_allowed());
    assert!(validate("SELECT a FROM t1 INTERSECT SELECT b FROM t2", SecurityMode::Restrictive).is_allowed());
    assert!(validate("SELECT a FROM t1 EXCEPT SELECT b FROM t2", SecurityMode::Restrictive).is_allowed());
}

/// UNION whose second branch smuggles a forbidden statement.
#[test]
fn test_union_smuggling_denied() {
    let denial = deny("SELECT a FROM t UNION SELECT b FROM (DROP TABLE x) y");
    assert_eq!(denial.offending_kind, Some(StatementKind::Drop));

    let denial = deny("SELECT a FROM t UNION DELETE FROM users");
    assert_eq!(denial.offending_kind, Some(StatementKind::Delete));
}

/// A UNION branch the classifier cannot name must not slip through.
#[test]
fn test_union_with_unknown_branch_denied() {
    let denial = deny("SELECT a FROM t UNION FLUSH TABLES");
    assert_eq!(denial.offending_kind, Some(StatementKind::Unknown));
}

/// EXPLAIN does not confer safety on the statement it wraps.
#[test]
fn test_explain_wrapping_write_denied() {
    let denial = deny("EXPLAIN DELETE FROM users");
    assert_eq!(denial.offending_kind, Some(StatementKind::Delete));
    assert_eq!(denial.depth, 1);

    let denial = deny("EXPLAIN ANALYZE UPDATE t SET x = 1");
    assert_eq!(denial.offending_kind, Some(StatementKind::Update));
}

/// EXPLAIN of a SELECT stays allowed, options and all.
#[test]
fn test_explain_select_allowed() {
    assert!(validate("EXPLAIN SELECT * FROM t", SecurityMode::Restrictive).is_allowed());
    assert!(validate("EXPLAIN (FORMAT JSON) SELECT 1", SecurityMode::Restrictive).is_allowed());
}

/// Unterminated literals fail closed.
#[test]
fn test_unterminated_literal_denied() {
    for sql in ["SELECT 'oops", "SELECT \"oops", "SELECT /* unclosed"] {
        let denial = deny(sql);
        assert_eq!(denial.violation, Violation::ParseFailure, "{sql}");
    }
}

/// Unbalanced parentheses fail closed.
#[test]
fn test_unbalanced_parens_denied() {
    assert_eq!(deny("SELECT (1").violation, Violation::ParseFailure);
    assert_eq!(deny("SELECT 1)").violation, Violation::ParseFailure);
}

/// Empty and comment-only inputs fail closed.
#[test]
fn test_empty_inputs_denied() {
    for sql in ["", "   ", ";;;", "-- nothing here"] {
        assert_eq!(deny(sql).violation, Violation::ParseFailure, "{sql:?}");
    }
}

/// Nesting beyond the bound is a clean denial, not a stack overflow.
#[test]
fn test_depth_bomb_denied() {
    let depth = MAX_NESTING_DEPTH + 10;
    let sql = format!("SELECT {}1{}", "(".repeat(depth), ")".repeat(depth));
    let denial = deny(&sql);
    assert_eq!(denial.violation, Violation::DepthExceeded);
}

/// A very deep but in-bounds statement still validates.
#[test]
fn test_deep_but_bounded_nesting_allowed() {
    let depth = 20;
    let sql = format!("SELECT {}1{}", "(".repeat(depth), ")".repeat(depth));
    assert!(validate(&sql, SecurityMode::Restrictive).is_allowed());
}

/// Server-side file access functions are denied wherever they hide.
#[test]
fn test_file_access_functions_denied() {
    for sql in [
        "SELECT pg_read_file('/etc/passwd')",
        "SELECT PG_READ_FILE('/etc/passwd')",
        "SELECT pg_ls_dir('/')",
        "SELECT * FROM t WHERE x = (SELECT pg_read_binary_file('/etc/shadow'))",
        "SELECT lo_import('/etc/passwd')",
    ] {
        let denial = deny(sql);
        assert_eq!(denial.violation, Violation::DangerousConstruct, "{sql}");
    }
}

/// INTO OUTFILE / system-variable access are denied.
#[test]
fn test_exfiltration_constructs_denied() {
    assert_eq!(
        deny("SELECT * FROM users INTO OUTFILE '/tmp/dump'").violation,
        Violation::DangerousConstruct
    );
    assert_eq!(
        deny("SELECT @@version").violation,
        Violation::DangerousConstruct
    );
}

/// Formatting tricks around a write don't help.
#[test]
fn test_formatting_tricks_denied() {
    let denial = deny("   \n\t DELETE\nFROM users");
    assert_eq!(denial.offending_kind, Some(StatementKind::Delete));

    let denial = deny("/* just reading */ DROP TABLE users");
    assert_eq!(denial.offending_kind, Some(StatementKind::Drop));
}

/// The nested denial reason mentions the nested kind.
#[test]
fn test_nested_denial_reason() {
    let denial = deny("SELECT * FROM (INSERT INTO t VALUES (1) RETURNING *) x");
    assert_eq!(denial.offending_kind, Some(StatementKind::Insert));
    assert!(denial.reason.contains("INSERT"), "reason: {}", denial.reason);
}

//! Parser adapter: raw SQL text to statement trees.
//!
//! This is the only module that touches [sqlparser](https://docs.rs/sqlparser/)
//! token types directly. It tokenizes the input with the PostgreSQL dialect,
//! splits on top-level semicolons, and builds one [`StatementTree`] per
//! statement, grouping parentheses with an explicit stack so attacker-supplied
//! nesting can never exhaust the call stack. Set-combinator operands and
//! EXPLAIN bodies are rewritten into branch subtrees so the classifier and
//! walker never need to understand the token stream themselves.

use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};
use thiserror::Error;

/// Hard bound on statement nesting. Anything deeper is rejected outright.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Why a SQL text could not be turned into statement trees.
///
/// Every variant is fail-closed: the orchestrator converts these into a
/// denial, never into an allowance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("failed to tokenize SQL: {0}")]
    Tokenize(String),

    #[error("unbalanced parentheses in SQL statement")]
    UnbalancedParens,

    #[error("statement nesting exceeds the maximum depth of {MAX_NESTING_DEPTH}")]
    TooDeep,

    #[error("empty SQL statement")]
    Empty,
}

/// One child of a statement tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// A plain token: keyword, identifier, literal, operator, or whitespace.
    Token(Token),
    /// A parenthesized group. Only statement-shaped if it classifies to a
    /// known statement kind; expression groups (column lists, argument
    /// lists) stay anonymous.
    Group(StatementTree),
    /// A set-combinator operand or an EXPLAIN body. Always statement-shaped
    /// and always policy-checked.
    Branch(StatementTree),
}

impl Node {
    /// Whitespace and comments don't count toward statement content.
    pub fn is_significant(&self) -> bool {
        match self {
            Node::Token(token) => token_is_significant(token),
            Node::Group(_) | Node::Branch(_) => true,
        }
    }
}

/// An ordered, immutable tree of tokens and nested statements rooted at one
/// top-level statement.
#[derive(Debug, Clone, Default)]
pub struct StatementTree {
    nodes: Vec<Node>,
}

impl StatementTree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Top-level tokens with whitespace and comments skipped.
    pub fn significant_tokens(&self) -> impl Iterator<Item = &Token> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Token(token) if token_is_significant(token) => Some(token),
            _ => None,
        })
    }

    pub fn first_significant_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|node| node.is_significant())
    }

    /// True if a `UNION`/`INTERSECT`/`EXCEPT` sits at this tree's own level.
    pub fn has_top_level_combinator(&self) -> bool {
        self.significant_tokens().any(|token| match token {
            Token::Word(word) => is_combinator(word.keyword),
            _ => false,
        })
    }
}

fn token_is_significant(token: &Token) -> bool {
    !matches!(token, Token::Whitespace(_))
}

pub(crate) fn is_combinator(keyword: Keyword) -> bool {
    matches!(
        keyword,
        Keyword::UNION | Keyword::INTERSECT | Keyword::EXCEPT
    )
}

/// Tokenize `sql` and build one tree per semicolon-delimited statement,
/// preserving statement order. Segments holding only whitespace or comments
/// (e.g. a trailing `; --`) are dropped.
pub fn parse_statements(sql: &str) -> Result<Vec<StatementTree>, ParseError> {
    let dialect = PostgreSqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| ParseError::Tokenize(e.to_string()))?;

    let mut statements = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    for token in tokens {
        if token == Token::SemiColon {
            if current.iter().any(token_is_significant) {
                statements.push(build_statement(std::mem::take(&mut current))?);
            } else {
                current.clear();
            }
        } else {
            current.push(token);
        }
    }
    if current.iter().any(token_is_significant) {
        statements.push(build_statement(current)?);
    }

    if statements.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(statements)
}

/// Group parentheses into subtrees with an explicit stack.
fn build_statement(tokens: Vec<Token>) -> Result<StatementTree, ParseError> {
    let mut stack: Vec<Vec<Node>> = vec![Vec::new()];
    for token in tokens {
        match token {
            Token::LParen => {
                if stack.len() >= MAX_NESTING_DEPTH {
                    return Err(ParseError::TooDeep);
                }
                stack.push(Vec::new());
            }
            Token::RParen => {
                let nodes = match stack.pop() {
                    Some(nodes) if !stack.is_empty() => nodes,
                    _ => return Err(ParseError::UnbalancedParens),
                };
                let group = normalize(nodes, stack.len())?;
                if let Some(top) = stack.last_mut() {
                    top.push(Node::Group(group));
                }
            }
            other => {
                if let Some(top) = stack.last_mut() {
                    top.push(Node::Token(other));
                }
            }
        }
    }
    if stack.len() != 1 {
        return Err(ParseError::UnbalancedParens);
    }
    normalize(stack.pop().unwrap_or_default(), 0)
}

/// Rewrite a flat node list into its final shape: set-combinator operands
/// and EXPLAIN bodies become branch subtrees. `depth` threads the current
/// nesting level through so the rewrite itself stays bounded.
fn normalize(nodes: Vec<Node>, depth: usize) -> Result<StatementTree, ParseError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ParseError::TooDeep);
    }
    if let Some(tree) = split_combinators(&nodes, depth)? {
        return Ok(tree);
    }
    wrap_explain_body(nodes, depth)
}

/// `a UNION b UNION c` becomes `[Branch(a), UNION, Branch(b), UNION,
/// Branch(c)]`; each operand is judged on its own.
fn split_combinators(nodes: &[Node], depth: usize) -> Result<Option<StatementTree>, ParseError> {
    let positions: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter_map(|(i, node)| match node {
            Node::Token(Token::Word(word)) if is_combinator(word.keyword) => Some(i),
            _ => None,
        })
        .collect();
    if positions.is_empty() {
        return Ok(None);
    }

    let mut out = Vec::new();
    let mut start = 0usize;
    for &pos in &positions {
        out.push(branch_node(&nodes[start..pos], depth)?);
        out.push(nodes[pos].clone());
        start = pos + 1;
    }
    out.push(branch_node(&nodes[start..], depth)?);
    Ok(Some(StatementTree { nodes: out }))
}

fn branch_node(segment: &[Node], depth: usize) -> Result<Node, ParseError> {
    let mut nodes: Vec<Node> = segment.to_vec();
    // Strip the ALL/DISTINCT quantifier left over from `UNION ALL` so the
    // operand starts at its own statement keyword.
    let quantifier = nodes.iter().position(|node| node.is_significant());
    if let Some(idx) = quantifier {
        if let Node::Token(Token::Word(word)) = &nodes[idx] {
            if matches!(word.keyword, Keyword::ALL | Keyword::DISTINCT) {
                nodes.remove(idx);
            }
        }
    }
    Ok(Node::Branch(normalize(nodes, depth + 1)?))
}

/// `EXPLAIN [ANALYZE|VERBOSE] [(options)] <stmt>` gets its body wrapped as
/// a branch so the wrapped statement is subject to the same policy walk.
fn wrap_explain_body(mut nodes: Vec<Node>, depth: usize) -> Result<StatementTree, ParseError> {
    let mut idx = 0usize;
    let mut seen_explain = false;
    let mut seen_options = false;
    while idx < nodes.len() {
        match &nodes[idx] {
            Node::Token(Token::Whitespace(_)) => idx += 1,
            Node::Token(Token::Word(word))
                if !seen_explain && word.keyword == Keyword::EXPLAIN =>
            {
                seen_explain = true;
                idx += 1;
            }
            Node::Token(Token::Word(word))
                if seen_explain
                    && matches!(word.keyword, Keyword::ANALYZE | Keyword::VERBOSE) =>
            {
                idx += 1;
            }
            Node::Group(_) if seen_explain && !seen_options => {
                seen_options = true;
                idx += 1;
            }
            _ => break,
        }
    }
    if !seen_explain {
        return Ok(StatementTree { nodes });
    }

    let body: Vec<Node> = nodes.split_off(idx);
    if body.iter().any(Node::is_significant) {
        nodes.push(Node::Branch(normalize(body, depth + 1)?));
    } else {
        nodes.extend(body);
    }
    Ok(StatementTree { nodes })
}

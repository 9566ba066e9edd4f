// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boolean predicate tree rendered to query-string syntax.
//!
//! Compiled criteria are kept as a tree of field clauses and boolean combinators. The tree only
//! turns into a query string when it is rendered through [`Display`], which is also the single
//! place where field names and values get escaped and quoted.
//!
//! Field names and wildcard terms are single terms: whitespace inside of them is escaped as well,
//! otherwise the backend would split them into several OR-ed terms. Only free text keeps its
//! whitespace.
use std::fmt::{self, Display, Write};

/// Characters with special meaning in query-string syntax.
const RESERVED: &[char] = &[
    '\\', '+', '-', '=', '&', '|', '>', '<', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~',
    '*', '?', ':', '/',
];

/// How a clause matches the value(s) of a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Matcher {
    /// Free text, analyzed by the search backend.
    Text(String),

    /// Exact quoted phrase.
    Phrase(String),

    /// Any of a set of quoted phrases.
    AnyOf(Vec<String>),

    Prefix(String),

    Suffix(String),
}

/// Predicate on a single field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    pub field: String,
    pub negated: bool,
    pub matcher: Matcher,
}

impl Clause {
    pub fn new(field: impl Into<String>, matcher: Matcher) -> Self {
        Self {
            field: field.into(),
            negated: false,
            matcher,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Predicate {
    Clause(Clause),

    /// Conjunction of all children. Without children this is the empty predicate.
    And(Vec<Predicate>),

    /// Disjunction of all children. Without children this is the empty predicate.
    Or(Vec<Predicate>),

    /// Matches no resource at all.
    MatchNone,
}

impl Predicate {
    /// Conjunction of the given predicates. A single match-nothing child turns the whole
    /// conjunction into [`Predicate::MatchNone`].
    pub fn and(children: Vec<Predicate>) -> Self {
        if children.iter().any(Predicate::is_match_none) {
            return Predicate::MatchNone;
        }
        Predicate::And(children)
    }

    /// Disjunction of the given predicates. Match-nothing and empty children do not contribute
    /// and are dropped.
    pub fn or(children: Vec<Predicate>) -> Self {
        Predicate::Or(
            children
                .into_iter()
                .filter(|child| !child.is_match_none() && !child.is_empty())
                .collect(),
        )
    }

    /// Predicate has no children and renders to an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Predicate::And(children) | Predicate::Or(children) => children.is_empty(),
            Predicate::Clause(_) | Predicate::MatchNone => false,
        }
    }

    pub fn is_match_none(&self) -> bool {
        matches!(self, Predicate::MatchNone)
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Clause(clause) => write!(f, "{clause}"),
            Predicate::And(children) => {
                if children.is_empty() {
                    return Ok(());
                }

                f.write_char('(')?;
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" AND ")?;
                    }

                    // Disjunctions bind weaker than AND.
                    match child {
                        Predicate::Or(inner) if inner.len() > 1 => write!(f, "({child})")?,
                        _ => write!(f, "{child}")?,
                    }
                }
                f.write_char(')')
            }
            Predicate::Or(children) => {
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" OR ")?;
                    }
                    write!(f, "{child}")?;
                }
                Ok(())
            }
            Predicate::MatchNone => f.write_str("(NOT *:*)"),
        }
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_char('-')?;
        }
        write_term(f, &self.field)?;
        f.write_str(":(")?;

        match &self.matcher {
            Matcher::Text(value) => write_escaped(f, value)?,
            Matcher::Phrase(value) => write_quoted(f, value)?,
            Matcher::AnyOf(values) => {
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" OR ")?;
                    }
                    write_quoted(f, value)?;
                }
            }
            Matcher::Prefix(value) => {
                write_term(f, value)?;
                f.write_char('*')?;
            }
            Matcher::Suffix(value) => {
                f.write_char('*')?;
                write_term(f, value)?;
            }
        }

        f.write_char(')')
    }
}

/// Backslash-escape reserved characters. Whitespace is kept as-is.
fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for c in value.chars() {
        if RESERVED.contains(&c) {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

/// Backslash-escape reserved characters and whitespace, keeping the value a single term.
fn write_term(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for c in value.chars() {
        if RESERVED.contains(&c) || c.is_whitespace() {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

/// Wrap value in double quotes, escaping quotes and backslashes inside of it.
fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in value.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

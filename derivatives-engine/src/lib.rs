//! Parsing with Brzozowski derivatives.
//!
//! A [`Grammar`] is an arena of expression nodes. Rules may refer to
//! themselves, directly or through other rules, including on the left, so the
//! nodes form a graph with cycles. Every operation on that graph (nullability,
//! equality, simplification, the derivative itself, extracting parse trees) is
//! a table of per-variant rules run by one memoising fixpoint evaluator, which
//! is what makes them terminate on cyclic grammars.
//!
//! ```
//! use derivatives_engine::{Grammar, Tree};
//!
//! let g = Grammar::new();
//! // s = '(' s ')' | ε
//! let s = g.rule("s");
//! g.define("s", g.or(g.seq([g.char('('), s, g.char(')')]), g.empty()))?;
//!
//! assert!(g.matches(s, "(())")?);
//! assert!(!g.matches(s, "(()")?);
//! assert_eq!(g.parse(g.star('a'), "aa")?.len(), 1);
//! # Ok::<(), derivatives_engine::GrammarError>(())
//! ```

use thiserror::Error;

mod deriv;
mod display;
mod equals;
mod expr;
mod fixpoint;
mod height;
mod nullable;
mod parse;
mod simplify;
mod tree;

#[cfg(feature = "dot")]
mod dot;

pub use display::Shown;
pub use expr::{Count, Expr, Grammar, IntoExpr, Node};
pub use tree::{Forest, Reducer, Tree};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("invalid range: {from:?} comes after {to:?}")]
    InvalidRange { from: char, to: char },
    #[error("a token must contain at least one character")]
    EmptyToken,
    #[error("rule `{0}` is referenced but never defined")]
    UndefinedRule(String),
    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),
    #[error("rule `{0}` is defined as nothing but itself")]
    CyclicRule(String),
    #[error("a suspended reference resolves to nothing but itself")]
    CyclicReference,
}

/// A grammar together with its entry rule.
///
/// Implemented by the structs `grammar!` generates, but any type that owns a
/// [`Grammar`] can implement it.
pub trait Language {
    fn grammar(&self) -> &Grammar;

    /// The entry rule.
    fn start(&self) -> Expr;

    /// Returns true if the entry rule accepts all of `text`.
    fn matches(&self, text: &str) -> Result<bool, GrammarError> {
        self.grammar().matches(self.start(), text)
    }

    fn parse(&self, text: &str) -> Result<Forest, GrammarError> {
        self.grammar().parse(self.start(), text)
    }
}

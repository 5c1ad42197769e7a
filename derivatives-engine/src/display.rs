use crate::expr::{Count, Expr, Grammar, Node};
use crate::fixpoint::{Fixpoint, Rules};
use crate::GrammarError;
use std::fmt::{Display, Formatter};

/// Printed in place of a node that is reached again while it is still being
/// printed.
const CYCLE: &str = "…";

pub(crate) struct Show;

impl Show {
    fn operand(fix: &mut Fixpoint<Self>, g: &Grammar, expr: Expr) -> String {
        let text = fix.apply(g, expr, ());
        let node = g.get(expr);
        if node.is_atomic() || matches!(node, Node::Nullability(_)) || text == CYCLE {
            text
        } else {
            format!("({text})")
        }
    }
}

impl Rules for Show {
    type Aux = ();
    type Out = String;
    const NAME: &'static str = "show";
    const ITERATE: bool = false;

    fn bottom(_: &Grammar, _: Expr, _: ()) -> String {
        CYCLE.to_string()
    }

    fn rule(fix: &mut Fixpoint<Self>, g: &Grammar, _: Expr, node: Node, _: ()) -> String {
        match node {
            Node::Nil => "∅".to_string(),
            Node::Empty => "ε".to_string(),
            Node::Any => ".".to_string(),
            Node::Char(c) => format!("{c:?}"),
            Node::Range(from, to) => format!("[{from:?}-{to:?}]"),
            Node::Token(value) => format!("{value:?}"),
            Node::Alt(l, r) => {
                let l = Self::operand(fix, g, l);
                let r = Self::operand(fix, g, r);
                format!("{l} | {r}")
            }
            Node::Seq(f, s) => {
                let f = Self::operand(fix, g, f);
                let s = Self::operand(fix, g, s);
                format!("{f} {s}")
            }
            Node::Star(p) => format!("{}*", Self::operand(fix, g, p)),
            Node::Rep(p, Count::Exactly(n)) => format!("{}{{{n}}}", Self::operand(fix, g, p)),
            Node::Rep(p, Count::Unbounded) => format!("{}{{∞}}", Self::operand(fix, g, p)),
            Node::Not(p) => format!("~{}", Self::operand(fix, g, p)),
            Node::Nullability(p) => format!("δ({})", fix.apply(g, p, ())),
            Node::EmptyReduction(trees) => {
                let trees: Vec<_> = trees.iter().map(ToString::to_string).collect();
                format!("ε↓{{{}}}", trees.join(", "))
            }
            Node::Reduction(p, f) => format!("{} → {}", Self::operand(fix, g, p), f.name()),
        }
    }
}

impl Grammar {
    /// A printable form of `expr`, meant for debugging and test fixtures.
    pub fn show(&self, expr: Expr) -> Result<String, GrammarError> {
        let expr = self.prepare(expr)?;
        Ok(Fixpoint::<Show>::run(self, expr, ()))
    }

    /// Adapts [`Grammar::show`] to [`Display`].
    pub fn display(&self, expr: Expr) -> Shown<'_> {
        Shown {
            grammar: self,
            expr,
        }
    }
}

pub struct Shown<'g> {
    grammar: &'g Grammar,
    expr: Expr,
}

impl Display for Shown<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.grammar.show(self.expr) {
            Ok(text) => write!(f, "{text}"),
            Err(e) => write!(f, "<{e}>"),
        }
    }
}

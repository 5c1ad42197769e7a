use crate::expr::{Expr, Grammar, Node};
use crate::fixpoint::{Fixpoint, Rules};
use crate::GrammarError;

/// Structural equality of two expression graphs.
///
/// Greatest fixpoint, starting from `true`: two nodes that are only
/// distinguished by reaching each other again are equal. This is bisimilarity
/// of the two graphs.
pub(crate) struct Equals;

impl Rules for Equals {
    /// The node on the other side.
    type Aux = Expr;
    type Out = bool;
    const NAME: &'static str = "equals";

    fn bottom(_: &Grammar, _: Expr, _: Expr) -> bool {
        true
    }

    fn rule(fix: &mut Fixpoint<Self>, g: &Grammar, expr: Expr, node: Node, other: Expr) -> bool {
        let other = g.resolve(other);
        if expr == other {
            return true;
        }
        let eq = |fix: &mut Fixpoint<Self>, a: Expr, b: Expr| fix.apply(g, a, g.resolve(b));

        match (node, g.get(other)) {
            (Node::Nil, Node::Nil) | (Node::Empty, Node::Empty) | (Node::Any, Node::Any) => true,
            (Node::Char(a), Node::Char(b)) => a == b,
            (Node::Range(a1, b1), Node::Range(a2, b2)) => a1 == a2 && b1 == b2,
            (Node::Token(a), Node::Token(b)) => a == b,
            (Node::Alt(l1, r1), Node::Alt(l2, r2)) | (Node::Seq(l1, r1), Node::Seq(l2, r2)) => {
                eq(fix, l1, l2) && eq(fix, r1, r2)
            }
            (Node::Star(a), Node::Star(b))
            | (Node::Not(a), Node::Not(b))
            | (Node::Nullability(a), Node::Nullability(b)) => eq(fix, a, b),
            (Node::Rep(a, n), Node::Rep(b, m)) => n == m && eq(fix, a, b),
            (Node::EmptyReduction(a), Node::EmptyReduction(b)) => a == b,
            (Node::Reduction(a, f), Node::Reduction(b, h)) => f == h && eq(fix, a, b),
            _ => false,
        }
    }
}

impl Grammar {
    /// Whether `a` and `b` are the same expression, structurally.
    pub fn equals(&self, a: Expr, b: Expr) -> Result<bool, GrammarError> {
        let a = self.prepare(a)?;
        let b = self.prepare(b)?;
        Ok(self.equals_prepared(a, b))
    }

    pub(crate) fn equals_prepared(&self, a: Expr, b: Expr) -> bool {
        Fixpoint::<Equals>::run(self, a, self.resolve(b))
    }
}

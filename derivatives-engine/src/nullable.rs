use crate::expr::{Count, Expr, Grammar, Node};
use crate::fixpoint::{Fixpoint, Rules};
use crate::GrammarError;

/// `δ(p)`: whether an expression matches the empty string.
///
/// Least fixpoint, starting from `false`: a rule that only reaches itself
/// through a cycle is not nullable unless some other branch is.
pub(crate) struct Nullable;

impl Rules for Nullable {
    type Aux = ();
    type Out = bool;
    const NAME: &'static str = "nullable";

    fn bottom(_: &Grammar, _: Expr, _: ()) -> bool {
        false
    }

    fn rule(fix: &mut Fixpoint<Self>, g: &Grammar, _: Expr, node: Node, _: ()) -> bool {
        match node {
            Node::Nil | Node::Any | Node::Char(_) | Node::Range(_, _) | Node::Token(_) => false,
            Node::Empty | Node::Star(_) | Node::EmptyReduction(_) => true,
            // δ(P ∪ Q) = δ(P) ∪ δ(Q)
            Node::Alt(l, r) => fix.apply(g, l, ()) || fix.apply(g, r, ()),
            // δ(P ◦ Q) = δ(P) ◦ δ(Q)
            Node::Seq(f, s) => fix.apply(g, f, ()) && fix.apply(g, s, ()),
            Node::Rep(_, Count::Exactly(0) | Count::Unbounded) => true,
            Node::Rep(p, Count::Exactly(_)) => fix.apply(g, p, ()),
            // δ(¬P) = ε iff δ(P) = ∅
            Node::Not(p) => !fix.apply(g, p, ()),
            Node::Nullability(p) | Node::Reduction(p, _) => fix.apply(g, p, ()),
        }
    }
}

impl Grammar {
    /// Whether `expr` matches the empty string.
    pub fn nullable(&self, expr: Expr) -> Result<bool, GrammarError> {
        let expr = self.prepare(expr)?;
        Ok(self.nullable_prepared(expr))
    }

    pub(crate) fn nullable_prepared(&self, expr: Expr) -> bool {
        Fixpoint::<Nullable>::run(self, expr, ())
    }
}

#[cfg(test)]
mod tests {
    use crate::Grammar;

    #[test]
    fn nullable() {
        let g = Grammar::new();
        assert!(g.nullable(g.empty()).unwrap());
        assert!(!g.nullable(g.nil()).unwrap());
        assert!(!g.nullable(g.any()).unwrap());
        assert!(!g.nullable(g.char('a')).unwrap());
        assert!(!g.nullable(g.lit("ab")).unwrap());

        assert!(g.nullable(g.or(g.empty(), g.empty())).unwrap());
        assert!(g.nullable(g.or(g.empty(), 'a')).unwrap());
        assert!(g.nullable(g.or('a', g.empty())).unwrap());
        assert!(!g.nullable(g.or('a', 'b')).unwrap());

        assert!(g.nullable(g.then(g.empty(), g.empty())).unwrap());
        assert!(!g.nullable(g.then('a', g.empty())).unwrap());
        assert!(!g.nullable(g.then(g.empty(), 'b')).unwrap());

        assert!(g.nullable(g.star('a')).unwrap());
        assert!(!g.nullable(g.plus('a')).unwrap());
        assert!(g.nullable(g.opt('a')).unwrap());

        assert!(g.nullable(g.not('a')).unwrap());
        assert!(!g.nullable(g.not(g.star('a'))).unwrap());

        assert!(g.nullable(g.rep('a', 0)).unwrap());
        assert!(!g.nullable(g.rep('a', 3)).unwrap());
        assert!(g.nullable(g.rep(g.opt('a'), 3)).unwrap());
    }

    #[test]
    fn recursive_rules() {
        let g = Grammar::new();
        // s = '(' s ')' | ε
        let s = g.rule("s");
        g.define("s", g.or(g.seq([g.char('('), s, g.char(')')]), g.empty()))
            .unwrap();
        assert!(g.nullable(s).unwrap());

        // l = l 'a' | 'a'
        let l = g.rule("l");
        g.define("l", g.or(g.then(l, 'a'), 'a')).unwrap();
        assert!(!g.nullable(l).unwrap());

        // m = m m | ε, nullable only through the second branch
        let m = g.rule("m");
        g.define("m", g.or(g.then(m, m), g.empty())).unwrap();
        assert!(g.nullable(m).unwrap());
    }
}

use crate::expr::{Count, Expr, Grammar, Node};
use crate::fixpoint::{Fixpoint, Rules};
use crate::tree::{Reducer, Tree};
use crate::GrammarError;

/// `Dc(p)`: the expression matching what remains of every string of `p` that
/// starts with `c`, with `c` itself recorded in the parse trees.
///
/// Like [`Simplify`](crate::simplify::Simplify) this builds a graph, so the
/// provisional result is a placeholder that is redirected once the real
/// derivative is known. A rule that is re-entered while its own derivative is
/// being computed therefore ends up referring to that derivative.
pub(crate) struct Deriv;

impl Deriv {
    fn matched(g: &Grammar, c: char) -> Expr {
        g.empty_reduction([Tree::Char(c)])
    }
}

impl Rules for Deriv {
    /// The character being consumed.
    type Aux = char;
    type Out = Expr;
    const NAME: &'static str = "deriv";
    const ITERATE: bool = false;

    fn bottom(g: &Grammar, _: Expr, _: char) -> Expr {
        g.placeholder(Expr::NIL)
    }

    fn settle(g: &Grammar, provisional: &Expr, computed: Expr) -> Expr {
        g.redirect(*provisional, computed);
        computed
    }

    fn rule(fix: &mut Fixpoint<Self>, g: &Grammar, expr: Expr, node: Node, c: char) -> Expr {
        match node {
            // Dc(∅) = Dc(ε) = ∅
            Node::Nil | Node::Empty => Expr::NIL,
            // Dc(.) = ε
            Node::Any => Expr::EMPTY,
            // Dc(c) = ε ↓ {c}
            Node::Char(v) if v == c => Self::matched(g, c),
            Node::Char(_) => Expr::NIL,
            Node::Range(from, to) if (from..=to).contains(&c) => Self::matched(g, c),
            Node::Range(_, _) => Expr::NIL,
            // Dc("abc") = Dc('a') "bc"
            Node::Token(value) => {
                let mut chars = value.chars();
                match chars.next() {
                    Some(first) if first == c => {
                        let rest = g.lit(chars.as_str());
                        g.make(Node::Seq(Self::matched(g, c), rest))
                    }
                    _ => Expr::NIL,
                }
            }
            // Dc(P ∪ Q) = Dc(P) ∪ Dc(Q)
            Node::Alt(l, r) => {
                let dl = fix.apply(g, l, c);
                let dr = fix.apply(g, r, c);
                g.make(Node::Alt(dl, dr))
            }
            // Dc(P ◦ Q) = Dc(P) ◦ Q ∪ δ(P) ◦ Dc(Q)
            Node::Seq(f, s) => {
                let df = fix.apply(g, f, c);
                let left = g.make(Node::Seq(df, s));
                let ds = fix.apply(g, s, c);
                let right = g.make(Node::Seq(g.nullability(f), ds));
                g.make(Node::Alt(left, right))
            }
            // Dc(¬P) = ¬Dc(P)
            Node::Not(p) => {
                let dp = fix.apply(g, p, c);
                g.make(Node::Not(dp))
            }
            // Dc(P*) = Dc(P) ◦ P* → prepend
            Node::Star(p) | Node::Rep(p, Count::Unbounded) => {
                let dp = fix.apply(g, p, c);
                let rest = g.make(Node::Seq(dp, expr));
                g.make(Node::Reduction(rest, Reducer::prepend()))
            }
            Node::Rep(_, Count::Exactly(0)) => Expr::NIL,
            Node::Rep(p, Count::Exactly(1)) => fix.apply(g, p, c),
            // The empty parse of P{n} is a flat list of n trees; keep it flat
            // here too.
            Node::Rep(p, Count::Exactly(2)) => {
                let dp = fix.apply(g, p, c);
                g.make(Node::Seq(dp, p))
            }
            Node::Rep(p, Count::Exactly(n)) => {
                let dp = fix.apply(g, p, c);
                let rest = g.make(Node::Rep(p, Count::Exactly(n - 1)));
                let rest = g.make(Node::Seq(dp, rest));
                g.make(Node::Reduction(rest, Reducer::prepend()))
            }
            Node::Nullability(_) | Node::EmptyReduction(_) => Expr::NIL,
            // Dc(P → f) = Dc(P) → f
            Node::Reduction(p, f) => {
                let dp = fix.apply(g, p, c);
                g.make(Node::Reduction(dp, f))
            }
        }
    }
}

impl Grammar {
    /// The derivative of `expr` with respect to `c`. The result is not
    /// simplified.
    pub fn deriv(&self, expr: Expr, c: char) -> Result<Expr, GrammarError> {
        let expr = self.prepare(expr)?;
        Ok(self.deriv_prepared(expr, c))
    }

    pub(crate) fn deriv_prepared(&self, expr: Expr, c: char) -> Expr {
        Fixpoint::<Deriv>::run(self, expr, c)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Count, Grammar, Node, Tree};

    #[test]
    fn leaves() {
        let g = Grammar::new();
        assert_eq!(g.show(g.deriv(g.nil(), 'a').unwrap()).unwrap(), "∅");
        assert_eq!(g.show(g.deriv(g.empty(), 'a').unwrap()).unwrap(), "∅");
        assert_eq!(g.show(g.deriv(g.any(), 'a').unwrap()).unwrap(), "ε");
        assert_eq!(g.show(g.deriv(g.char('a'), 'a').unwrap()).unwrap(), "ε↓{'a'}");
        assert_eq!(g.show(g.deriv(g.char('a'), 'b').unwrap()).unwrap(), "∅");

        let digit = g.range('1', '9').unwrap();
        assert_eq!(g.show(g.deriv(digit, '8').unwrap()).unwrap(), "ε↓{'8'}");
        assert_eq!(g.show(g.deriv(digit, 'x').unwrap()).unwrap(), "∅");

        let abc = g.lit("abc");
        assert_eq!(g.show(g.deriv(abc, 'a').unwrap()).unwrap(), "ε↓{'a'} \"bc\"");
        assert_eq!(g.show(g.deriv(abc, 'b').unwrap()).unwrap(), "∅");
        assert_eq!(g.show(g.deriv(g.lit("ab"), 'a').unwrap()).unwrap(), "ε↓{'a'} 'b'");
    }

    #[test]
    fn composites() {
        let g = Grammar::new();
        assert_eq!(
            g.show(g.deriv(g.or('a', 'b'), 'a').unwrap()).unwrap(),
            "ε↓{'a'} | ∅"
        );
        assert_eq!(
            g.show(g.deriv(g.then('a', 'b'), 'a').unwrap()).unwrap(),
            "(ε↓{'a'} 'b') | (δ('a') ∅)"
        );
        assert_eq!(
            g.show(g.deriv(g.star('a'), 'a').unwrap()).unwrap(),
            "(ε↓{'a'} ('a'*)) → prepend"
        );
        assert_eq!(g.show(g.deriv(g.not('a'), 'a').unwrap()).unwrap(), "~ε↓{'a'}");
    }

    #[test]
    fn repetition() {
        let g = Grammar::new();
        assert_eq!(g.show(g.deriv(g.rep('a', 0), 'a').unwrap()).unwrap(), "∅");
        assert_eq!(g.show(g.deriv(g.rep('a', 1), 'a').unwrap()).unwrap(), "ε↓{'a'}");
        assert_eq!(
            g.show(g.deriv(g.rep('a', 2), 'a').unwrap()).unwrap(),
            "ε↓{'a'} 'a'"
        );
        assert_eq!(
            g.show(g.deriv(g.rep('a', 3), 'a').unwrap()).unwrap(),
            "(ε↓{'a'} ('a'{2})) → prepend"
        );
        assert_eq!(
            g.show(g.deriv(g.rep('a', Count::Unbounded), 'a').unwrap()).unwrap(),
            "(ε↓{'a'} ('a'{∞})) → prepend"
        );
    }

    #[test]
    fn resolved_nodes_have_no_derivative() {
        let g = Grammar::new();
        let e = g.empty_reduction([Tree::Char('a')]);
        assert!(matches!(g.get(g.deriv(e, 'a').unwrap()), Node::Nil));
        let d = g.nullability(g.star('a'));
        assert!(matches!(g.get(g.deriv(d, 'a').unwrap()), Node::Nil));
    }

    #[test]
    fn recursive_rules_derive_into_cycles() {
        let g = Grammar::new();
        // l = l 'a' | 'b'
        let l = g.rule("l");
        g.define("l", g.or(g.then(l, 'a'), 'b')).unwrap();
        let dl = g.deriv(l, 'b').unwrap();
        // Db(l) = (Db(l) 'a' | δ(l) ∅) | ε↓{'b'}
        assert_eq!(
            g.show(dl).unwrap(),
            "((… 'a') | (δ((… 'a') | 'b') ∅)) | ε↓{'b'}"
        );
        assert!(g.nullable(dl).unwrap());
        let dla = g.deriv(dl, 'a').unwrap();
        assert!(g.nullable(dla).unwrap());
    }
}

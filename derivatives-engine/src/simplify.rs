use crate::expr::{Count, Expr, Grammar, Node};
use crate::fixpoint::{Fixpoint, Rules};
use crate::GrammarError;
use std::rc::Rc;

/// Rewrites an expression bottom-up into a smaller one with the same language
/// and the same parse trees.
///
/// The provisional value of a node that is still being simplified is a
/// placeholder forwarding to the node itself. Once the node is done the
/// placeholder is redirected to the result, so every cycle in the input comes
/// out as a cycle in the output.
pub(crate) struct Simplify;

/// Whether simplifying `old` gave back `old` itself. A placeholder never
/// counts as unchanged, even while it still forwards to `old`: the node it
/// stands for may turn out different.
fn unchanged(g: &Grammar, new: Expr, old: Expr) -> bool {
    new == old || new == g.resolve(old)
}

impl Simplify {
    /// Collects the operands of a chain of alternatives. Only concrete nodes
    /// are opened up; forwards (rules, placeholders) are kept whole, which is
    /// what stops this from walking around a cycle.
    fn branches(g: &Grammar, expr: Expr, out: &mut Vec<Expr>) {
        match g.shallow(expr) {
            Some(Node::Alt(l, r)) => {
                Self::branches(g, l, out);
                Self::branches(g, r, out);
            }
            _ => out.push(expr),
        }
    }

    /// Builds `a1 | (a2 | (... | an))`, reusing the nodes of `existing` where
    /// they already have that shape.
    fn rebuild(g: &Grammar, items: &[Expr], existing: Option<Expr>) -> Expr {
        match items {
            [] => Expr::NIL,
            [only] => *only,
            [first, rest @ ..] => {
                let parts = existing.and_then(|e| match g.shallow(e) {
                    Some(Node::Alt(l, r)) => Some((e, l, r)),
                    _ => None,
                });
                let tail = Self::rebuild(g, rest, parts.map(|(_, _, r)| g.resolve(r)));
                match parts {
                    Some((e, l, r)) if unchanged(g, *first, l) && unchanged(g, tail, r) => e,
                    _ => g.make(Node::Alt(*first, tail)),
                }
            }
        }
    }

    fn alternatives(g: &Grammar, expr: Expr, left: Expr, right: Expr) -> Expr {
        let mut branches = Vec::new();
        Self::branches(g, left, &mut branches);
        Self::branches(g, right, &mut branches);

        let mut kept: Vec<Expr> = Vec::with_capacity(branches.len());
        for branch in branches {
            if g.is_nil(branch) || kept.iter().any(|&k| g.equals_prepared(k, branch)) {
                continue;
            }
            kept.push(branch);
        }
        kept.sort_by_cached_key(|&branch| g.height_prepared(branch));

        Self::rebuild(g, &kept, Some(expr))
    }

    /// `∅* → ε`, `ε* → ε`, `p** → p*`.
    fn starred(g: &Grammar, inner: Expr) -> Option<Expr> {
        match g.get(inner) {
            Node::Nil | Node::Empty => Some(Expr::EMPTY),
            Node::Star(_) => Some(inner),
            _ => None,
        }
    }
}

impl Rules for Simplify {
    type Aux = ();
    type Out = Expr;
    const NAME: &'static str = "simplify";
    const ITERATE: bool = false;

    fn bottom(g: &Grammar, expr: Expr, _: ()) -> Expr {
        g.placeholder(expr)
    }

    fn settle(g: &Grammar, provisional: &Expr, computed: Expr) -> Expr {
        g.redirect(*provisional, computed);
        computed
    }

    fn rule(fix: &mut Fixpoint<Self>, g: &Grammar, expr: Expr, node: Node, _: ()) -> Expr {
        match node {
            Node::Nil
            | Node::Empty
            | Node::Any
            | Node::Char(_)
            | Node::Token(_)
            | Node::EmptyReduction(_) => expr,
            Node::Range(from, to) if from == to => g.char(from),
            Node::Range(_, _) => expr,
            Node::Alt(l, r) => {
                let sl = fix.apply(g, l, ());
                let sr = fix.apply(g, r, ());
                Self::alternatives(g, expr, sl, sr)
            }
            Node::Seq(f, s) => {
                let sf = fix.apply(g, f, ());
                let ss = fix.apply(g, s, ());
                if g.is_nil(sf) || g.is_nil(ss) {
                    Expr::NIL
                } else if g.is_empty_string(sf) {
                    ss
                } else if g.is_empty_string(ss) {
                    sf
                } else if unchanged(g, sf, f) && unchanged(g, ss, s) {
                    expr
                } else {
                    g.make(Node::Seq(sf, ss))
                }
            }
            Node::Star(p) => {
                let sp = fix.apply(g, p, ());
                match Self::starred(g, sp) {
                    Some(done) => done,
                    None if unchanged(g, sp, p) => expr,
                    None => g.make(Node::Star(sp)),
                }
            }
            Node::Rep(_, Count::Exactly(0)) => Expr::EMPTY,
            Node::Rep(p, Count::Exactly(1)) => fix.apply(g, p, ()),
            Node::Rep(p, Count::Unbounded) => {
                let sp = fix.apply(g, p, ());
                Self::starred(g, sp).unwrap_or_else(|| g.make(Node::Star(sp)))
            }
            Node::Rep(p, n) => {
                let sp = fix.apply(g, p, ());
                match g.get(sp) {
                    Node::Nil => Expr::NIL,
                    Node::Empty => Expr::EMPTY,
                    _ if unchanged(g, sp, p) => expr,
                    _ => g.make(Node::Rep(sp, n)),
                }
            }
            Node::Not(p) => {
                let sp = fix.apply(g, p, ());
                match g.get(sp) {
                    Node::Not(inner) => inner,
                    _ if unchanged(g, sp, p) => expr,
                    _ => g.make(Node::Not(sp)),
                }
            }
            Node::Nullability(p) => {
                if !g.nullable_prepared(p) {
                    return Expr::NIL;
                }
                let sp = fix.apply(g, p, ());
                match g.get(sp) {
                    // already matches nothing but the empty string
                    Node::Empty | Node::EmptyReduction(_) | Node::Nullability(_) => sp,
                    _ if unchanged(g, sp, p) => expr,
                    _ => g.make(Node::Nullability(sp)),
                }
            }
            Node::Reduction(p, f) => {
                let sp = fix.apply(g, p, ());
                match g.get(sp) {
                    Node::Nil => Expr::NIL,
                    Node::EmptyReduction(trees) => {
                        let reduced = trees.iter().map(|t| f.apply(t)).collect();
                        g.make(Node::EmptyReduction(Rc::new(reduced)))
                    }
                    _ if unchanged(g, sp, p) => expr,
                    _ => g.make(Node::Reduction(sp, f)),
                }
            }
        }
    }
}

impl Grammar {
    /// One bottom-up simplification pass over `expr`.
    pub fn simplify(&self, expr: Expr) -> Result<Expr, GrammarError> {
        let expr = self.prepare(expr)?;
        Ok(self.simplify_prepared(expr))
    }

    pub(crate) fn simplify_prepared(&self, expr: Expr) -> Expr {
        Fixpoint::<Simplify>::run(self, expr, ())
    }

    /// Simplifies until a pass no longer changes the expression.
    pub(crate) fn normalise(&self, mut expr: Expr) -> Expr {
        let mut passes = 1;
        loop {
            let next = self.simplify_prepared(expr);
            if next == expr || self.equals_prepared(expr, next) {
                log::trace!("normalised to {next:?} in {passes} pass(es)");
                return next;
            }
            expr = next;
            passes += 1;
        }
    }
}

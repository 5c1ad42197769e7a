//! The memoising fixpoint evaluator every structural operation runs on.
//!
//! Expressions may be cyclic, so plain structural recursion over them does not
//! terminate. An operation is instead written as a table of per-variant
//! [`Rules`]; [`Fixpoint`] drives that table over the graph:
//!
//! * results are memoised per `(node, auxiliary input)`,
//! * before a node's rule runs its entry is seeded with [`Rules::bottom`], so
//!   revisiting the node further down the same descent reads that provisional
//!   value instead of recursing forever,
//! * when [`Rules::ITERATE`] is set, passes are repeated (reusing the memo
//!   table) until no provisional value read during a pass turned out to
//!   differ from the node's final value.
//!
//! A memo table lives for exactly one call of [`Fixpoint::run`].

use crate::expr::{Expr, Grammar, Node};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

pub(crate) trait Rules: Sized {
    type Aux: Copy + Eq + Hash;
    type Out: Clone + PartialEq;

    const NAME: &'static str;
    const ITERATE: bool = true;

    fn bottom(grammar: &Grammar, expr: Expr, aux: Self::Aux) -> Self::Out;

    fn rule(
        fix: &mut Fixpoint<Self>,
        grammar: &Grammar,
        expr: Expr,
        node: Node,
        aux: Self::Aux,
    ) -> Self::Out;

    /// Called with the provisional value once the real one is known.
    fn settle(_grammar: &Grammar, _provisional: &Self::Out, computed: Self::Out) -> Self::Out {
        computed
    }
}

type Key<R> = (Expr, <R as Rules>::Aux);

pub(crate) struct Fixpoint<R: Rules> {
    memo: HashMap<Key<R>, R::Out>,
    visited: HashSet<Key<R>>,
    active: HashSet<Key<R>>,
    read_early: HashSet<Key<R>>,
    stale: bool,
}

impl<R: Rules> Fixpoint<R> {
    fn new() -> Self {
        Self {
            memo: HashMap::new(),
            visited: HashSet::new(),
            active: HashSet::new(),
            read_early: HashSet::new(),
            stale: false,
        }
    }

    pub(crate) fn run(grammar: &Grammar, root: Expr, aux: R::Aux) -> R::Out {
        let mut fix = Self::new();
        let mut pass = 1;
        loop {
            fix.visited.clear();
            fix.stale = false;
            let out = fix.apply(grammar, root, aux);
            if !R::ITERATE || !fix.stale {
                log::trace!(
                    "{} of {root:?} settled after {pass} pass(es), {} memo entries",
                    R::NAME,
                    fix.memo.len()
                );
                return out;
            }
            pass += 1;
        }
    }

    pub(crate) fn apply(&mut self, grammar: &Grammar, expr: Expr, aux: R::Aux) -> R::Out {
        let (expr, node) = grammar.view(expr);
        let key = (expr, aux);

        if self.visited.contains(&key) {
            if self.active.contains(&key) {
                self.read_early.insert(key);
            }
            return self.memo[&key].clone();
        }
        self.visited.insert(key);
        self.active.insert(key);

        let provisional = match self.memo.get(&key) {
            Some(previous) => previous.clone(),
            None => {
                let bottom = R::bottom(grammar, expr, aux);
                self.memo.insert(key, bottom.clone());
                bottom
            }
        };

        let computed = R::rule(self, grammar, expr, node, aux);
        let computed = R::settle(grammar, &provisional, computed);

        self.active.remove(&key);
        if self.read_early.remove(&key) && provisional != computed {
            self.stale = true;
        }
        self.memo.insert(key, computed.clone());
        computed
    }
}

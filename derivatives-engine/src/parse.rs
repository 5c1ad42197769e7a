use crate::expr::{Count, Expr, Grammar, Node};
use crate::fixpoint::{Fixpoint, Rules};
use crate::tree::{Forest, Tree};
use crate::GrammarError;
use std::rc::Rc;

/// `⌊p⌋(ε)`: the parse trees `p` assigns to the empty string.
///
/// Least fixpoint over forests, starting from the empty forest. A grammar with
/// infinitely many empty parses (`s = s s | ε`) has no finite fixpoint.
pub(crate) struct ParseEmpty;

fn unit() -> Rc<Forest> {
    Rc::new(Forest::from([Tree::unit()]))
}

impl Rules for ParseEmpty {
    type Aux = ();
    type Out = Rc<Forest>;
    const NAME: &'static str = "parse-empty";

    fn bottom(_: &Grammar, _: Expr, _: ()) -> Rc<Forest> {
        Rc::default()
    }

    fn rule(fix: &mut Fixpoint<Self>, g: &Grammar, _: Expr, node: Node, _: ()) -> Rc<Forest> {
        match node {
            Node::Empty | Node::Star(_) => unit(),
            Node::Rep(_, Count::Exactly(0) | Count::Unbounded) => unit(),
            Node::EmptyReduction(trees) => trees,
            // ⌊P ∪ Q⌋(ε) = ⌊P⌋(ε) ∪ ⌊Q⌋(ε)
            Node::Alt(l, r) => {
                let left = fix.apply(g, l, ());
                let right = fix.apply(g, r, ());
                Rc::new(left.union(&right).cloned().collect())
            }
            // ε is the unit of sequencing, for trees as much as for strings
            Node::Seq(f, s) if g.is_empty_string(f) => fix.apply(g, s, ()),
            Node::Seq(f, s) if g.is_empty_string(s) => fix.apply(g, f, ()),
            // ⌊P ◦ Q⌋(ε) = ⌊P⌋(ε) × ⌊Q⌋(ε)
            Node::Seq(f, s) => {
                let first = fix.apply(g, f, ());
                let second = fix.apply(g, s, ());
                let mut out = Forest::new();
                for a in first.iter() {
                    for b in second.iter() {
                        out.insert(Tree::pair(a.clone(), b.clone()));
                    }
                }
                Rc::new(out)
            }
            Node::Rep(p, Count::Exactly(1)) => fix.apply(g, p, ()),
            Node::Rep(p, Count::Exactly(n)) => {
                let each = fix.apply(g, p, ());
                let mut lists: Vec<Vec<Tree>> = vec![Vec::with_capacity(n)];
                for _ in 0..n {
                    lists = lists
                        .iter()
                        .flat_map(|prefix| {
                            each.iter().map(move |t| {
                                let mut list = prefix.clone();
                                list.push(t.clone());
                                list
                            })
                        })
                        .collect();
                }
                Rc::new(lists.into_iter().map(Tree::List).collect())
            }
            Node::Not(p) => {
                if g.nullable_prepared(p) {
                    Rc::default()
                } else {
                    unit()
                }
            }
            Node::Nullability(p) => fix.apply(g, p, ()),
            // ⌊P → f⌋(ε) = { f(t) | t ∈ ⌊P⌋(ε) }
            Node::Reduction(p, f) => {
                let trees = fix.apply(g, p, ());
                Rc::new(trees.iter().map(|t| f.apply(t)).collect())
            }
            Node::Nil | Node::Any | Node::Char(_) | Node::Range(_, _) | Node::Token(_) => {
                Rc::default()
            }
        }
    }
}

impl Grammar {
    /// The parse trees `expr` assigns to the empty string.
    pub fn parse_empty(&self, expr: Expr) -> Result<Forest, GrammarError> {
        let expr = self.prepare(expr)?;
        Ok(owned(self.parse_empty_prepared(expr)))
    }

    pub(crate) fn parse_empty_prepared(&self, expr: Expr) -> Rc<Forest> {
        Fixpoint::<ParseEmpty>::run(self, expr, ())
    }

    /// Whether `expr` matches all of `text`.
    ///
    /// Takes one derivative per character, simplifying once after each step,
    /// and gives up as soon as nothing can match anymore. The nodes built
    /// along the way are released before returning.
    pub fn matches(&self, expr: Expr, text: &str) -> Result<bool, GrammarError> {
        let expr = self.prepare(expr)?;
        let mark = self.node_count();
        let accepted = self.matches_prepared(expr, text);
        self.truncate(mark);
        Ok(accepted)
    }

    fn matches_prepared(&self, mut expr: Expr, text: &str) -> bool {
        for (offset, c) in text.char_indices() {
            expr = self.simplify_prepared(self.deriv_prepared(expr, c));
            log::trace!("matches: {c:?} at {offset}, {} slots", self.node_count());
            if self.is_nil(expr) {
                log::debug!("matches: rejected {text:?} at offset {offset}");
                return false;
            }
        }
        let accepted = self.nullable_prepared(expr);
        log::debug!("matches: {text:?} accepted: {accepted}");
        accepted
    }

    /// Every parse tree `expr` assigns to `text`. An empty forest means the
    /// text is not in the language. Like [`Grammar::matches`] this leaves the
    /// grammar as it found it.
    pub fn parse(&self, expr: Expr, text: &str) -> Result<Forest, GrammarError> {
        let expr = self.prepare(expr)?;
        let mark = self.node_count();
        let forest = self.parse_prepared(expr, text);
        self.truncate(mark);
        Ok(forest)
    }

    fn parse_prepared(&self, expr: Expr, text: &str) -> Forest {
        let mut expr = self.normalise(expr);
        for (offset, c) in text.char_indices() {
            expr = self.normalise(self.deriv_prepared(expr, c));
            log::trace!("parse: {c:?} at {offset}, {} slots", self.node_count());
            if self.is_nil(expr) {
                log::debug!("parse: rejected {text:?} at offset {offset}");
                return Forest::new();
            }
        }
        let forest = owned(self.parse_empty_prepared(expr));
        log::debug!("parse: {text:?} has {} parse(s)", forest.len());
        forest
    }
}

fn owned(forest: Rc<Forest>) -> Forest {
    Rc::try_unwrap(forest).unwrap_or_else(|shared| (*shared).clone())
}

#[cfg(test)]
mod tests {
    use crate::{Count, Forest, Grammar, Reducer, Tree};

    #[test]
    fn empty_parses() {
        let g = Grammar::new();
        let unit = Forest::from([Tree::unit()]);
        assert_eq!(g.parse_empty(g.nil()).unwrap(), Forest::new());
        assert_eq!(g.parse_empty(g.char('a')).unwrap(), Forest::new());
        assert_eq!(g.parse_empty(g.empty()).unwrap(), unit);
        assert_eq!(g.parse_empty(g.star('a')).unwrap(), unit);
        assert_eq!(g.parse_empty(g.rep('a', 0)).unwrap(), unit);
        assert_eq!(g.parse_empty(g.rep('a', Count::Unbounded)).unwrap(), unit);
        assert_eq!(g.parse_empty(g.not('a')).unwrap(), unit);
        assert_eq!(g.parse_empty(g.not(g.empty())).unwrap(), Forest::new());

        let x = g.empty_reduction([Tree::Char('x')]);
        let y = g.empty_reduction([Tree::Char('y')]);
        assert_eq!(
            g.parse_empty(g.or(x, y)).unwrap(),
            Forest::from([Tree::Char('x'), Tree::Char('y')])
        );
        assert_eq!(
            g.parse_empty(g.then(x, y)).unwrap(),
            Forest::from([Tree::list(['x', 'y'])])
        );
        assert_eq!(
            g.parse_empty(g.then(g.empty(), y)).unwrap(),
            Forest::from([Tree::Char('y')])
        );
        assert_eq!(
            g.parse_empty(g.rep(g.or(x, y), 2)).unwrap(),
            Forest::from([
                Tree::list(['x', 'x']),
                Tree::list(['x', 'y']),
                Tree::list(['y', 'x']),
                Tree::list(['y', 'y']),
            ])
        );
        assert_eq!(g.parse_empty(g.nullability(x)).unwrap(), Forest::from([Tree::Char('x')]));

        let wrap = Reducer::new("wrap", |t| Tree::list([t.clone()]));
        assert_eq!(
            g.parse_empty(g.reduce(x, wrap)).unwrap(),
            Forest::from([Tree::list(['x'])])
        );
    }

    #[test]
    fn matches_characters_and_stars() {
        let g = Grammar::new();
        let a = g.char('a');
        assert!(g.matches(a, "a").unwrap());
        assert!(!g.matches(a, "b").unwrap());
        assert!(!g.matches(a, "").unwrap());
        assert!(!g.matches(a, "aa").unwrap());

        let many = g.star('a');
        assert!(g.matches(many, "").unwrap());
        assert!(g.matches(many, "aaa").unwrap());
        assert!(!g.matches(many, "b").unwrap());
        assert!(!g.matches(many, "aab").unwrap());

        assert!(g.matches(g.any(), "z").unwrap());
        assert!(g.matches(g.lit("abc"), "abc").unwrap());
        assert!(!g.matches(g.lit("abc"), "ab").unwrap());
        assert!(g.matches(g.rep('a', 3), "aaa").unwrap());
        assert!(!g.matches(g.rep('a', 3), "aa").unwrap());
        assert!(!g.matches(g.rep('a', 3), "aaaa").unwrap());
    }

    #[test]
    fn complement() {
        let g = Grammar::new();
        let not_abc = g.not(g.lit("abc"));
        assert!(g.matches(not_abc, "").unwrap());
        assert!(g.matches(not_abc, "ab").unwrap());
        assert!(g.matches(not_abc, "abcd").unwrap());
        assert!(!g.matches(not_abc, "abc").unwrap());
    }

    #[test]
    fn working_nodes_are_released() {
        let g = Grammar::new();
        // s = '(' s ')' | ε
        let s = g.rule("s");
        g.define("s", g.or(g.seq([g.char('('), s, g.char(')')]), g.empty()))
            .unwrap();
        assert!(g.matches(s, "(())").unwrap());
        let settled = g.node_count();

        for _ in 0..100 {
            assert!(g.matches(s, "(())").unwrap());
            assert!(!g.matches(s, "(()").unwrap());
            assert_eq!(g.parse(s, "()").unwrap().len(), 1);
            assert!(g.parse(s, ")").unwrap().is_empty());
        }
        assert_eq!(g.node_count(), settled);
    }

    #[test]
    fn parse_trees() {
        let g = Grammar::new();
        assert_eq!(
            g.parse(g.then('a', 'b'), "ab").unwrap(),
            Forest::from([Tree::list(['a', 'b'])])
        );
        assert_eq!(
            g.parse(g.star('a'), "aaa").unwrap(),
            Forest::from([Tree::list(['a', 'a', 'a'])])
        );
        assert_eq!(
            g.parse(g.rep(g.range('0', '9').unwrap(), 3), "123").unwrap(),
            Forest::from([Tree::list(['1', '2', '3'])])
        );
        assert_eq!(g.parse(g.then('a', 'b'), "ax").unwrap(), Forest::new());

        // ambiguous: (a | a a)*
        let e = g.star(g.or('a', g.lit("aa")));
        let forest = g.parse(e, "aa").unwrap();
        assert_eq!(forest.len(), 2);
    }
}

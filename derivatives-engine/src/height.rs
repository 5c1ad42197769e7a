use crate::expr::{Expr, Grammar, Node};
use crate::fixpoint::{Fixpoint, Rules};
use crate::GrammarError;

/// Height of the expression graph, used to order alternatives when
/// simplifying.
///
/// Runs a single pass: on a cycle the back edge counts as 0, which keeps the
/// value finite.
pub(crate) struct Height;

impl Rules for Height {
    type Aux = ();
    type Out = usize;
    const NAME: &'static str = "height";
    const ITERATE: bool = false;

    fn bottom(_: &Grammar, _: Expr, _: ()) -> usize {
        0
    }

    fn rule(fix: &mut Fixpoint<Self>, g: &Grammar, _: Expr, node: Node, _: ()) -> usize {
        node.children()
            .into_iter()
            .map(|child| fix.apply(g, child, ()) + 1)
            .max()
            .unwrap_or(0)
    }
}

impl Grammar {
    pub fn height(&self, expr: Expr) -> Result<usize, GrammarError> {
        let expr = self.prepare(expr)?;
        Ok(self.height_prepared(expr))
    }

    pub(crate) fn height_prepared(&self, expr: Expr) -> usize {
        Fixpoint::<Height>::run(self, expr, ())
    }
}

#[cfg(test)]
mod tests {
    use crate::Grammar;

    #[test]
    fn leaves_and_composites() {
        let g = Grammar::new();
        assert_eq!(g.height(g.nil()).unwrap(), 0);
        assert_eq!(g.height(g.char('a')).unwrap(), 0);
        assert_eq!(g.height(g.range('a', 'z').unwrap()).unwrap(), 0);
        assert_eq!(g.height(g.star('a')).unwrap(), 1);
        assert_eq!(g.height(g.or(g.star('a'), 'b')).unwrap(), 2);
        assert_eq!(g.height(g.seq(['a', 'b', 'c'])).unwrap(), 2);
    }

    #[test]
    fn cycles_stay_finite() {
        let g = Grammar::new();
        // s = '[' s ']' | s s | ε
        let s = g.rule("s");
        let body = g.alt([
            g.seq([g.char('['), s, g.char(']')]),
            g.then(s, s),
            g.empty(),
        ]);
        g.define("s", body).unwrap();
        // alt(alt(seq(seq('[', s), ']'), seq(s, s)), ε): the longest path is
        // alt, alt, seq, seq, '['
        assert_eq!(g.height(s).unwrap(), 4);
    }
}

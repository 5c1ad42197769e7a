use crate::expr::{Count, Expr, Grammar, Node};
use std::collections::HashSet;
use std::io;
use std::io::Write;

fn label(node: &Node) -> String {
    let label = match node {
        Node::Nil => "∅".to_string(),
        Node::Empty => "ε".to_string(),
        Node::Any => ".".to_string(),
        Node::Char(c) => format!("{c:?}"),
        Node::Range(from, to) => format!("[{from:?}-{to:?}]"),
        Node::Token(value) => format!("{value:?}"),
        Node::Alt(_, _) => "|".to_string(),
        Node::Seq(_, _) => "◦".to_string(),
        Node::Star(_) => "*".to_string(),
        Node::Rep(_, Count::Exactly(n)) => format!("{{{n}}}"),
        Node::Rep(_, Count::Unbounded) => "{∞}".to_string(),
        Node::Not(_) => "¬".to_string(),
        Node::Nullability(_) => "δ".to_string(),
        Node::EmptyReduction(trees) => {
            let trees: Vec<_> = trees.iter().map(ToString::to_string).collect();
            format!("ε↓{{{}}}", trees.join(", "))
        }
        Node::Reduction(_, f) => format!("→ {}", f.name()),
    };
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

impl Grammar {
    /// Writes the graph reachable from `root` in graphviz format. Cycles show
    /// up as back edges; the root is drawn as a double circle.
    pub fn output_dot(&self, root: Expr, w: &mut impl Write) -> io::Result<()> {
        let root = self
            .prepare(root)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        writeln!(w, "digraph {{")?;

        let mut seen = HashSet::new();
        let mut todo = vec![root];
        while let Some(src) = todo.pop() {
            if !seen.insert(src) {
                continue;
            }
            let node = self.get(src);
            let attrs = if src == root {
                ", shape=doublecircle"
            } else {
                ""
            };
            writeln!(w, "node[label=\"{}\"{attrs}] id{}", label(&node), src.index())?;

            let children = node.children();
            let numbered = matches!(node, Node::Seq(_, _));
            for (i, child) in children.into_iter().enumerate() {
                let tgt = self.resolve(child);
                if numbered {
                    writeln!(w, "id{} -> id{} [label=\"{}\"]", src.index(), tgt.index(), i + 1)?;
                } else {
                    writeln!(w, "id{} -> id{}", src.index(), tgt.index())?;
                }
                todo.push(tgt);
            }
        }

        writeln!(w, "}}")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Grammar;

    #[test]
    fn cyclic_graph() {
        let g = Grammar::new();
        let s = g.rule("s");
        g.define("s", g.or(g.then('"', s), g.empty())).unwrap();

        let mut out = Vec::new();
        g.output_dot(s, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.starts_with("digraph {\n"));
        assert!(out.ends_with("}\n"));
        assert!(out.contains("shape=doublecircle"));
        assert!(out.contains(r#"node[label="'\"'"]"#));
        // the alternative, the sequence, the quote and ε
        assert_eq!(out.matches("node[").count(), 4);
        assert_eq!(out.matches(" -> ").count(), 4);
        assert_eq!(out.matches("[label=\"1\"]").count(), 1);
    }

    #[test]
    fn undefined_rules_are_rejected() {
        let g = Grammar::new();
        let mut out = Vec::new();
        let err = g.output_dot(g.rule("missing"), &mut out).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }
}

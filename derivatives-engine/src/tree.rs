use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

/// A parse-tree fragment.
///
/// Matched characters become [`Tree::Char`] leaves. Everything a grammar builds
/// out of them (pairs for sequences, lists for repetitions, whatever a
/// [`Reducer`] returns) is a [`Tree::List`].
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tree {
    Char(char),
    List(Vec<Tree>),
}

/// The set of distinct parse trees an ambiguous grammar assigns to one input.
pub type Forest = BTreeSet<Tree>;

impl Tree {
    /// The empty tuple `[]`, produced when a repetition matches nothing.
    pub fn unit() -> Self {
        Tree::List(Vec::new())
    }

    /// The tree built for a sequence: `[first, second]`.
    pub fn pair(first: Tree, second: Tree) -> Self {
        Tree::List(vec![first, second])
    }

    /// Builds a list from anything that converts into trees.
    pub fn list(items: impl IntoIterator<Item = impl Into<Tree>>) -> Self {
        Tree::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Tree::Char(c) => Some(*c),
            Tree::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tree]> {
        match self {
            Tree::Char(_) => None,
            Tree::List(items) => Some(items),
        }
    }

    /// All characters in the tree, left to right.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Tree::Char(c) => out.push(*c),
            Tree::List(items) => items.iter().for_each(|i| i.collect_text(out)),
        }
    }
}

impl From<char> for Tree {
    fn from(value: char) -> Self {
        Tree::Char(value)
    }
}

impl From<Vec<Tree>> for Tree {
    fn from(value: Vec<Tree>) -> Self {
        Tree::List(value)
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Tree::Char(c) => write!(f, "{c:?}"),
            Tree::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Debug for Tree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A named transformation applied to every tree in a forest once the wrapped
/// expression has been fully parsed.
///
/// Reducers compare equal when their names are equal; the closure itself is
/// opaque.
#[derive(Clone)]
pub struct Reducer {
    name: Rc<str>,
    action: Rc<dyn Fn(&Tree) -> Tree>,
}

impl Reducer {
    pub fn new(name: impl AsRef<str>, action: impl Fn(&Tree) -> Tree + 'static) -> Self {
        Self {
            name: name.as_ref().into(),
            action: Rc::new(action),
        }
    }

    /// `prepend(head, tail) = [head, ...tail]`, used by the derivative of a
    /// Kleene star to glue one more match onto the matches that follow it.
    pub fn prepend() -> Self {
        Self::new("prepend", |tree| match tree.as_list() {
            Some([head, Tree::List(tail)]) => {
                let mut items = Vec::with_capacity(tail.len() + 1);
                items.push(head.clone());
                items.extend(tail.iter().cloned());
                Tree::List(items)
            }
            _ => tree.clone(),
        })
    }

    /// Turns the left-nested pairs a sequence of `n` parts produces,
    /// `[[[a, b], c], d]`, into the flat list `[a, b, c, d]`.
    pub fn flatten(n: usize) -> Self {
        Self::new(format!("flatten{n}"), move |tree| {
            let mut parts = Vec::with_capacity(n);
            let mut rest = tree;
            for _ in 1..n {
                match rest.as_list() {
                    Some([init, last]) => {
                        parts.push(last.clone());
                        rest = init;
                    }
                    _ => return tree.clone(),
                }
            }
            parts.push(rest.clone());
            parts.reverse();
            Tree::List(parts)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, tree: &Tree) -> Tree {
        (self.action)(tree)
    }
}

impl PartialEq for Reducer {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Reducer {}

impl Debug for Reducer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reducer({})", self.name)
    }
}

use crate::tree::{Forest, Reducer, Tree};
use crate::GrammarError;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// A handle to a node in a [`Grammar`].
///
/// Handles are only meaningful for the grammar that created them. Two handles
/// are the same node when they are equal; structural equality is
/// [`Grammar::equals`].
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Expr(u32);

impl Expr {
    /// `∅`, matches nothing. Shared by every grammar.
    pub const NIL: Expr = Expr(0);
    /// `ε`, matches only the empty string. Shared by every grammar.
    pub const EMPTY: Expr = Expr(1);
    /// `.`, matches any single character. Shared by every grammar.
    pub const ANY: Expr = Expr(2);

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How often a [`Node::Rep`] repeats its operand.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Count {
    Exactly(usize),
    Unbounded,
}

impl From<usize> for Count {
    fn from(value: usize) -> Self {
        Count::Exactly(value)
    }
}

#[derive(Clone, Debug)]
pub enum Node {
    Nil,
    Empty,
    Any,
    Char(char),
    Range(char, char),
    Token(Rc<str>),
    Alt(Expr, Expr),
    Seq(Expr, Expr),
    Star(Expr),
    Rep(Expr, Count),
    Not(Expr),
    /// The nullable residue `δ(p)` of its operand.
    Nullability(Expr),
    /// `ε ↓ S`: matches the empty string, producing the trees in `S`.
    EmptyReduction(Rc<Forest>),
    Reduction(Expr, Reducer),
}

impl Node {
    pub fn children(&self) -> Vec<Expr> {
        match self {
            Node::Alt(l, r) | Node::Seq(l, r) => vec![*l, *r],
            Node::Star(p)
            | Node::Rep(p, _)
            | Node::Not(p)
            | Node::Nullability(p)
            | Node::Reduction(p, _) => vec![*p],
            _ => vec![],
        }
    }

    /// Leaves print without parentheses and have height 0.
    pub fn is_atomic(&self) -> bool {
        self.children().is_empty()
    }
}

enum Slot {
    Node(Node),
    /// A suspended reference, forced on first access.
    Thunk(Rc<dyn Fn(&Grammar) -> Expr>),
    /// A rule that has been referenced but not defined yet.
    Rule(Rc<str>),
    Forward(Expr),
}

/// An arena of expression nodes.
///
/// Grammars may refer to themselves through [`Grammar::rule`] and
/// [`Grammar::thunk`], so the nodes form a graph with cycles rather than a
/// tree. Every structural operation is keyed on node identity and terminates
/// on such graphs.
pub struct Grammar {
    slots: RefCell<Vec<Slot>>,
    rules: RefCell<HashMap<Rc<str>, Expr>>,
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Grammar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("nodes", &self.slots.borrow().len())
            .field("rules", &self.rules.borrow().len())
            .finish()
    }
}

/// Anything a combinator accepts as an operand: expressions, and strings or
/// characters, which are coerced with [`Grammar::lit`].
pub trait IntoExpr {
    fn into_expr(self, grammar: &Grammar) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self, _: &Grammar) -> Expr {
        self
    }
}

impl IntoExpr for char {
    fn into_expr(self, grammar: &Grammar) -> Expr {
        grammar.char(self)
    }
}

impl IntoExpr for &str {
    fn into_expr(self, grammar: &Grammar) -> Expr {
        grammar.lit(self)
    }
}

impl IntoExpr for String {
    fn into_expr(self, grammar: &Grammar) -> Expr {
        grammar.lit(&self)
    }
}

impl Grammar {
    pub fn new() -> Self {
        Self {
            slots: RefCell::new(vec![
                Slot::Node(Node::Nil),
                Slot::Node(Node::Empty),
                Slot::Node(Node::Any),
            ]),
            rules: Default::default(),
        }
    }

    /// Number of slots allocated so far, including forwarding slots.
    pub fn node_count(&self) -> usize {
        self.slots.borrow().len()
    }

    /// The node behind a handle, after following references.
    pub fn get(&self, expr: Expr) -> Node {
        self.view(expr).1
    }

    fn alloc(&self, slot: Slot) -> Expr {
        let mut slots = self.slots.borrow_mut();
        let id = Expr(slots.len() as u32);
        slots.push(slot);
        id
    }

    pub(crate) fn make(&self, node: Node) -> Expr {
        match node {
            Node::Nil => Expr::NIL,
            Node::Empty => Expr::EMPTY,
            Node::Any => Expr::ANY,
            node => self.alloc(Slot::Node(node)),
        }
    }

    /// Allocates a forwarding slot. Used by traits as the provisional result
    /// for a node whose own result is still being computed.
    pub(crate) fn placeholder(&self, target: Expr) -> Expr {
        self.alloc(Slot::Forward(target))
    }

    pub(crate) fn redirect(&self, placeholder: Expr, target: Expr) {
        if placeholder != target {
            self.slots.borrow_mut()[placeholder.index()] = Slot::Forward(target);
        }
    }

    /// Follows forwards and forces suspensions until a node (or an undefined
    /// rule) is reached.
    pub(crate) fn resolve(&self, mut expr: Expr) -> Expr {
        loop {
            let thunk = match &self.slots.borrow()[expr.index()] {
                Slot::Node(_) | Slot::Rule(_) => return expr,
                Slot::Forward(target) => {
                    expr = *target;
                    continue;
                }
                Slot::Thunk(f) => f.clone(),
            };
            let target = thunk(self);
            self.slots.borrow_mut()[expr.index()] = Slot::Forward(target);
            expr = target;
        }
    }

    /// The node behind a handle. Undefined rules read as `∅`; the public
    /// operations reject them in [`Grammar::prepare`] before any trait runs.
    pub(crate) fn view(&self, expr: Expr) -> (Expr, Node) {
        let expr = self.resolve(expr);
        match &self.slots.borrow()[expr.index()] {
            Slot::Node(node) => (expr, node.clone()),
            _ => (expr, Node::Nil),
        }
    }

    /// The node stored directly in this slot, without following forwards.
    pub(crate) fn shallow(&self, expr: Expr) -> Option<Node> {
        match &self.slots.borrow()[expr.index()] {
            Slot::Node(node) => Some(node.clone()),
            _ => None,
        }
    }

    pub(crate) fn is_nil(&self, expr: Expr) -> bool {
        matches!(self.view(expr).1, Node::Nil)
    }

    pub(crate) fn is_empty_string(&self, expr: Expr) -> bool {
        matches!(self.view(expr).1, Node::Empty)
    }

    /// Forces every suspension reachable from `root` and checks that every
    /// referenced rule has been defined.
    pub fn prepare(&self, root: Expr) -> Result<Expr, GrammarError> {
        let root = self.resolve_checked(root)?;
        let mut seen = HashSet::new();
        let mut todo = vec![root];
        while let Some(expr) = todo.pop() {
            let expr = self.resolve_checked(expr)?;
            if !seen.insert(expr) {
                continue;
            }
            todo.extend(self.view(expr).1.children());
        }
        log::trace!("prepared {} reachable nodes from {root:?}", seen.len());
        Ok(root)
    }

    /// Like [`Grammar::resolve`], but fails on an undefined rule or on a chain
    /// of references that leads back to itself.
    fn resolve_checked(&self, mut expr: Expr) -> Result<Expr, GrammarError> {
        let mut chain = HashSet::new();
        loop {
            if !chain.insert(expr) {
                return Err(GrammarError::CyclicReference);
            }
            let thunk = match &self.slots.borrow()[expr.index()] {
                Slot::Node(_) => return Ok(expr),
                Slot::Rule(name) => return Err(GrammarError::UndefinedRule(name.to_string())),
                Slot::Forward(target) => {
                    expr = *target;
                    continue;
                }
                Slot::Thunk(f) => f.clone(),
            };
            let target = thunk(self);
            self.slots.borrow_mut()[expr.index()] = Slot::Forward(target);
            expr = target;
        }
    }

    /// Follows forwards without forcing suspensions. Stops at the first slot
    /// that is not a forward, or at one already passed.
    fn follow(&self, mut expr: Expr) -> Expr {
        let mut chain = HashSet::new();
        while chain.insert(expr) {
            match self.slots.borrow()[expr.index()] {
                Slot::Forward(target) => expr = target,
                _ => break,
            }
        }
        expr
    }

    /// Drops every slot allocated after `mark`. Only sound when nothing
    /// allocated before `mark` refers to the dropped slots.
    pub(crate) fn truncate(&self, mark: usize) {
        let mut slots = self.slots.borrow_mut();
        if slots.len() > mark {
            log::trace!("releasing {} working slots", slots.len() - mark);
            slots.truncate(mark);
        }
    }

    // leaves

    pub fn nil(&self) -> Expr {
        Expr::NIL
    }

    pub fn empty(&self) -> Expr {
        Expr::EMPTY
    }

    pub fn any(&self) -> Expr {
        Expr::ANY
    }

    pub fn char(&self, value: char) -> Expr {
        self.make(Node::Char(value))
    }

    /// `[from-to]`. A range of one character is a [`Node::Char`].
    pub fn range(&self, from: char, to: char) -> Result<Expr, GrammarError> {
        if from > to {
            return Err(GrammarError::InvalidRange { from, to });
        }
        if from == to {
            return Ok(self.char(from));
        }
        Ok(self.make(Node::Range(from, to)))
    }

    /// An exact literal string. Single characters become [`Node::Char`].
    pub fn token(&self, value: &str) -> Result<Expr, GrammarError> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Err(GrammarError::EmptyToken),
            (Some(c), None) => Ok(self.char(c)),
            _ => Ok(self.make(Node::Token(value.into()))),
        }
    }

    /// String-literal coercion: `""` is `ε`, one character is a
    /// [`Node::Char`], anything longer is a [`Node::Token`].
    pub fn lit(&self, value: &str) -> Expr {
        self.token(value).unwrap_or(Expr::EMPTY)
    }

    // combinators

    pub fn or(&self, left: impl IntoExpr, right: impl IntoExpr) -> Expr {
        let left = left.into_expr(self);
        let right = right.into_expr(self);
        self.make(Node::Alt(left, right))
    }

    pub fn then(&self, first: impl IntoExpr, second: impl IntoExpr) -> Expr {
        let first = first.into_expr(self);
        let second = second.into_expr(self);
        self.make(Node::Seq(first, second))
    }

    /// `p1 | p2 | ... | pn`, nested to the left. No alternatives at all is `∅`.
    pub fn alt<I>(&self, parsers: I) -> Expr
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        parsers
            .into_iter()
            .map(|p| p.into_expr(self))
            .reduce(|acc, p| self.make(Node::Alt(acc, p)))
            .unwrap_or(Expr::NIL)
    }

    /// `p1 p2 ... pn`, nested to the left. An empty sequence is `ε`.
    pub fn seq<I>(&self, parsers: I) -> Expr
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        parsers
            .into_iter()
            .map(|p| p.into_expr(self))
            .reduce(|acc, p| self.make(Node::Seq(acc, p)))
            .unwrap_or(Expr::EMPTY)
    }

    pub fn star(&self, parser: impl IntoExpr) -> Expr {
        let parser = parser.into_expr(self);
        self.make(Node::Star(parser))
    }

    /// `p{n}`, exactly `n` repetitions (or unboundedly many).
    pub fn rep(&self, parser: impl IntoExpr, n: impl Into<Count>) -> Expr {
        let parser = parser.into_expr(self);
        self.make(Node::Rep(parser, n.into()))
    }

    pub fn not(&self, parser: impl IntoExpr) -> Expr {
        let parser = parser.into_expr(self);
        self.make(Node::Not(parser))
    }

    /// `p?`, equivalent to `p | ε`.
    pub fn opt(&self, parser: impl IntoExpr) -> Expr {
        let parser = parser.into_expr(self);
        self.make(Node::Alt(parser, Expr::EMPTY))
    }

    /// `p+`, equivalent to `p p*`.
    pub fn plus(&self, parser: impl IntoExpr) -> Expr {
        let parser = parser.into_expr(self);
        let star = self.make(Node::Star(parser));
        self.make(Node::Seq(parser, star))
    }

    /// Applies `reducer` to every tree `parser` produces.
    pub fn reduce(&self, parser: impl IntoExpr, reducer: Reducer) -> Expr {
        let parser = parser.into_expr(self);
        self.make(Node::Reduction(parser, reducer))
    }

    /// `δ(p)`: `ε` (carrying the empty parses of `p`) if `p` is nullable, `∅`
    /// otherwise.
    pub fn nullability(&self, parser: impl IntoExpr) -> Expr {
        let parser = parser.into_expr(self);
        self.make(Node::Nullability(parser))
    }

    /// `ε ↓ S`: matches the empty string, producing `trees`.
    pub fn empty_reduction(&self, trees: impl IntoIterator<Item = Tree>) -> Expr {
        self.make(Node::EmptyReduction(Rc::new(trees.into_iter().collect())))
    }

    // suspended references

    /// A reference that is built by `f` the first time it is needed.
    pub fn thunk(&self, f: impl Fn(&Grammar) -> Expr + 'static) -> Expr {
        self.alloc(Slot::Thunk(Rc::new(f)))
    }

    /// A reference to the rule called `name`, which may be defined later.
    /// Every call with the same name returns the same handle.
    pub fn rule(&self, name: &str) -> Expr {
        if let Some(expr) = self.rules.borrow().get(name) {
            return *expr;
        }
        let name: Rc<str> = name.into();
        let expr = self.alloc(Slot::Rule(name.clone()));
        self.rules.borrow_mut().insert(name, expr);
        expr
    }

    /// Gives the rule called `name` its body.
    pub fn define(&self, name: &str, body: impl IntoExpr) -> Result<Expr, GrammarError> {
        let rule = self.rule(name);
        if !matches!(self.slots.borrow()[rule.index()], Slot::Rule(_)) {
            return Err(GrammarError::DuplicateRule(name.to_string()));
        }
        let body = body.into_expr(self);
        if self.follow(body) == rule {
            return Err(GrammarError::CyclicRule(name.to_string()));
        }
        self.slots.borrow_mut()[rule.index()] = Slot::Forward(body);
        log::debug!("defined rule {name} as {body:?}");
        Ok(rule)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        match self.rules.borrow().get(name) {
            Some(rule) => !matches!(self.slots.borrow()[rule.index()], Slot::Rule(_)),
            None => false,
        }
    }
}

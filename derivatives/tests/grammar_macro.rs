use derivatives::*;
use pretty_assertions::assert_eq;

#[ctor::ctor]
fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn infix(t: &Tree) -> Tree {
    match t.as_list() {
        Some([l, op, r]) => Tree::list([op.clone(), l.clone(), r.clone()]),
        _ => t.clone(),
    }
}

grammar! {
    /// Nested parentheses.
    struct Parens {
        s = '(' s ')' | ;
    }
}

grammar! {
    pub(crate) struct Logic {
        formula = formula connective formula => infix | atom;
        atom = 'P'..='S';
        connective = '∧' | '∨';
    }
}

grammar! {
    struct Codes {
        code = letter{3} digit?;
        letter = 'A'..='Z';
        digit = '0'..='9';
    }
}

grammar! {
    struct Misc {
        quoted = '"' _* '"';
        not_if = ~"if";
        keyword = "let" | "fn" | "if";
        many = ('a' | 'b')+;
    }
}

#[test]
fn parens() {
    let parens = Parens::new().unwrap();
    assert!(parens.matches("").unwrap());
    assert!(parens.matches("((()))").unwrap());
    assert!(!parens.matches("(()").unwrap());
    assert_eq!(
        parens.parse("()").unwrap(),
        Forest::from([Tree::list([Tree::Char('('), Tree::unit(), Tree::Char(')')])])
    );
}

#[test]
fn rule_accessors() {
    let parens = Parens::new().unwrap();
    assert_eq!(parens.start(), parens.s());
    assert!(parens.grammar().matches(parens.s(), "()").unwrap());

    let logic = Logic::new().unwrap();
    assert!(logic.grammar().matches(logic.atom(), "Q").unwrap());
    assert!(!logic.grammar().matches(logic.atom(), "T").unwrap());
    assert!(logic.grammar().matches(logic.connective(), "∨").unwrap());
}

#[test]
fn ambiguous_logic() {
    let logic = Logic::new().unwrap();
    assert_eq!(
        logic.parse("P∧Q∨R").unwrap(),
        Forest::from([
            Tree::list([Tree::Char('∨'), Tree::list(['∧', 'P', 'Q']), Tree::Char('R')]),
            Tree::list([Tree::Char('∧'), Tree::Char('P'), Tree::list(['∨', 'Q', 'R'])]),
        ])
    );
    assert_eq!(
        logic.parse("P∧Q").unwrap(),
        Forest::from([Tree::list(['∧', 'P', 'Q'])])
    );
    assert!(logic.parse("P∧").unwrap().is_empty());
}

#[test]
fn counted_and_optional_parts() {
    let codes = Codes::new().unwrap();
    assert!(codes.matches("ABC").unwrap());
    assert!(codes.matches("XYZ7").unwrap());
    assert!(!codes.matches("AB").unwrap());
    assert!(!codes.matches("ABCD").unwrap());
    assert!(!codes.matches("abc").unwrap());

    let forest = codes.parse("ABC1").unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest.iter().map(Tree::text).collect::<Vec<_>>(), ["ABC1"]);
}

#[test]
fn wildcards_complements_and_literals() {
    let misc = Misc::new().unwrap();
    let g = misc.grammar();

    assert!(g.matches(misc.quoted(), "\"\"").unwrap());
    assert!(g.matches(misc.quoted(), "\"any text\"").unwrap());
    assert!(!g.matches(misc.quoted(), "\"open").unwrap());

    assert!(g.matches(misc.not_if(), "").unwrap());
    assert!(g.matches(misc.not_if(), "i").unwrap());
    assert!(g.matches(misc.not_if(), "iff").unwrap());
    assert!(!g.matches(misc.not_if(), "if").unwrap());

    for word in ["let", "fn", "if"] {
        assert!(g.matches(misc.keyword(), word).unwrap(), "{word}");
    }
    assert!(!g.matches(misc.keyword(), "le").unwrap());

    assert!(g.matches(misc.many(), "abba").unwrap());
    assert!(!g.matches(misc.many(), "").unwrap());
}

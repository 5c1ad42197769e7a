//! Prints every parse of a propositional logic sentence.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example logic -- '~P∧(Q→R)'
//! ```

use derivatives::*;

fn infix(t: &Tree) -> Tree {
    match t.as_list() {
        Some([l, op, r]) => Tree::list([op.clone(), l.clone(), r.clone()]),
        _ => t.clone(),
    }
}

fn inner(t: &Tree) -> Tree {
    match t.as_list() {
        Some([_, sentence, _]) => sentence.clone(),
        _ => t.clone(),
    }
}

grammar! {
    struct Logic {
        sentence = atomic | complex;
        atomic = 'P'..='Z';
        complex = '(' sentence ')' => inner
            | sentence connective sentence => infix
            | '~' sentence;
        connective = '∧' | '∨' | '→' | '⟺';
    }
}

fn main() -> Result<(), GrammarError> {
    env_logger::init();

    let logic = Logic::new()?;
    let text = std::env::args().nth(1).unwrap_or_else(|| "P∧Q∨R".to_string());
    let forest = logic.parse(&text)?;
    if forest.is_empty() {
        println!("{text:?} is not a sentence");
    }
    for tree in forest {
        println!("{tree}");
    }
    Ok(())
}

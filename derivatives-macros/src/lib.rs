use crate::notation::GrammarInput;
use proc_macro::TokenStream;
use syn::parse_macro_input;

mod emit;
mod notation;

/// Declares a struct that builds a grammar from rule notation.
///
/// Syntax: `$attrs $vis struct $Name { $rule = $alternatives ; ... }`.
///
/// * `'c'` a character, `'a'..='z'` a range, `"text"` a literal, `_` any
///   character, a name refers to another rule, `( ... )` groups.
/// * postfix `*`, `+`, `?` and `{n}`, prefix `~` for the complement.
/// * parts are sequenced by juxtaposition, alternatives separated by `|`. An
///   empty alternative matches the empty string.
/// * `=> path` after an alternative applies `path: fn(&Tree) -> Tree` to its
///   parse trees. An alternative of three or more parts produces one flat
///   list of their trees.
///
/// The first rule is the entry rule. The struct gets a fallible `new`, a
/// method returning each rule, and an implementation of `Language`.
///
/// ```rust
/// use derivatives::*;
///
/// fn binop(t: &Tree) -> Tree {
///     match t.as_list() {
///         Some([l, op, r]) => Tree::list([op.clone(), l.clone(), r.clone()]),
///         _ => t.clone(),
///     }
/// }
///
/// grammar! {
///     struct Sums {
///         sum = sum '+' digit => binop | digit;
///         digit = '0'..='9';
///     }
/// }
///
/// let sums = Sums::new()?;
/// assert!(sums.matches("1+2+3")?);
/// assert!(!sums.matches("1+")?);
/// assert!(sums.parse("1+2")?.contains(&Tree::list(['+', '1', '2'])));
/// # Ok::<(), GrammarError>(())
/// ```
#[proc_macro]
pub fn grammar(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as GrammarInput);
    input.emit().into()
}

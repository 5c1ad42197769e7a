use syn::parse::{Parse, ParseStream};
use syn::{braced, parenthesized, token, Attribute, Ident, LitChar, LitInt, LitStr, Path, Token, Visibility};

/// One operand of a sequence.
pub(crate) enum Term {
    Rule(Ident),
    Any,
    Char(LitChar),
    Range(LitChar, LitChar),
    Str(LitStr),
    Group(Alts),
    Star(Box<Term>),
    Plus(Box<Term>),
    Opt(Box<Term>),
    Rep(Box<Term>, LitInt),
    Not(Box<Term>),
}

/// `a b c => reducer`
pub(crate) struct Branch {
    pub terms: Vec<Term>,
    pub reducer: Option<Path>,
}

/// `branch | branch | ...`
pub(crate) struct Alts {
    pub branches: Vec<Branch>,
}

/// `name = alts ;`
pub(crate) struct RuleDef {
    pub name: Ident,
    pub body: Alts,
}

/// `#[attrs] pub struct Name { rules }`
pub(crate) struct GrammarInput {
    pub attrs: Vec<Attribute>,
    pub vis: Visibility,
    pub name: Ident,
    pub rules: Vec<RuleDef>,
}

fn ends_branch(input: ParseStream) -> bool {
    input.is_empty() || input.peek(Token![|]) || input.peek(Token![;]) || input.peek(Token![=>])
}

impl Term {
    fn parse_atom(input: ParseStream) -> syn::Result<Self> {
        let lookahead = input.lookahead1();

        if lookahead.peek(token::Paren) {
            let inner;
            parenthesized!(inner in input);
            let alts: Alts = inner.parse()?;
            if !inner.is_empty() {
                return Err(inner.error("expected `|` or `)`"));
            }
            return Ok(Term::Group(alts));
        }

        if lookahead.peek(LitChar) {
            let from: LitChar = input.parse()?;
            if input.peek(Token![..=]) {
                input.parse::<Token![..=]>()?;
                let to: LitChar = input.parse()?;
                return Ok(Term::Range(from, to));
            }
            return Ok(Term::Char(from));
        }

        if lookahead.peek(LitStr) {
            return Ok(Term::Str(input.parse()?));
        }

        if lookahead.peek(Token![_]) {
            input.parse::<Token![_]>()?;
            return Ok(Term::Any);
        }

        if lookahead.peek(Ident) {
            return Ok(Term::Rule(input.parse()?));
        }

        Err(lookahead.error())
    }
}

impl Parse for Term {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        if input.peek(Token![~]) {
            input.parse::<Token![~]>()?;
            return Ok(Term::Not(Box::new(input.parse()?)));
        }

        let mut term = Self::parse_atom(input)?;
        loop {
            if input.peek(Token![*]) {
                input.parse::<Token![*]>()?;
                term = Term::Star(Box::new(term));
            } else if input.peek(Token![+]) {
                input.parse::<Token![+]>()?;
                term = Term::Plus(Box::new(term));
            } else if input.peek(Token![?]) {
                input.parse::<Token![?]>()?;
                term = Term::Opt(Box::new(term));
            } else if input.peek(token::Brace) {
                let inner;
                braced!(inner in input);
                let n: LitInt = inner.parse()?;
                term = Term::Rep(Box::new(term), n);
            } else {
                return Ok(term);
            }
        }
    }
}

impl Parse for Branch {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut terms = Vec::new();
        while !ends_branch(input) {
            terms.push(input.parse()?);
        }
        let reducer = if input.peek(Token![=>]) {
            input.parse::<Token![=>]>()?;
            Some(input.parse()?)
        } else {
            None
        };
        Ok(Self { terms, reducer })
    }
}

impl Parse for Alts {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut branches = vec![input.parse()?];
        while input.peek(Token![|]) {
            input.parse::<Token![|]>()?;
            branches.push(input.parse()?);
        }
        Ok(Self { branches })
    }
}

impl Parse for RuleDef {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name = input.parse()?;
        input.parse::<Token![=]>()?;
        let body = input.parse()?;
        input.parse::<Token![;]>()?;
        Ok(Self { name, body })
    }
}

impl Parse for GrammarInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis = input.parse()?;
        input.parse::<Token![struct]>()?;
        let name = input.parse()?;

        let content;
        braced!(content in input);
        let mut rules = Vec::new();
        while !content.is_empty() {
            rules.push(content.parse()?);
        }

        Ok(Self {
            attrs,
            vis,
            name,
            rules,
        })
    }
}

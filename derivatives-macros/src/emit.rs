use crate::notation::{Alts, Branch, GrammarInput, Term};
use proc_macro2::{Literal, TokenStream};
use quote::{quote, ToTokens};
use std::collections::HashSet;

/// Names a rule can't take because the generated struct already uses them.
const RESERVED: &[&str] = &["new", "grammar", "start", "matches", "parse"];

struct Emitter {
    rules: HashSet<String>,
    errors: Vec<syn::Error>,
}

impl Emitter {
    fn term(&mut self, term: &Term) -> TokenStream {
        match term {
            Term::Rule(name) => {
                let key = name.to_string();
                if !self.rules.contains(&key) {
                    self.errors
                        .push(syn::Error::new(name.span(), format!("unknown rule `{key}`")));
                }
                quote!(g.rule(#key))
            }
            Term::Any => quote!(g.any()),
            Term::Char(c) => quote!(g.char(#c)),
            Term::Range(from, to) => {
                if from.value() > to.value() {
                    self.errors.push(syn::Error::new(
                        from.span(),
                        format!("range starts after it ends: {:?} > {:?}", from.value(), to.value()),
                    ));
                }
                quote!(g.range(#from, #to)?)
            }
            Term::Str(s) => quote!(g.lit(#s)),
            Term::Group(alts) => self.alts(alts),
            Term::Star(t) => {
                let t = self.term(t);
                quote!(g.star(#t))
            }
            Term::Plus(t) => {
                let t = self.term(t);
                quote!(g.plus(#t))
            }
            Term::Opt(t) => {
                let t = self.term(t);
                quote!(g.opt(#t))
            }
            Term::Rep(t, n) => {
                let t = self.term(t);
                match n.base10_parse::<usize>() {
                    Ok(n) => {
                        let n = Literal::usize_suffixed(n);
                        quote!(g.rep(#t, #n))
                    }
                    Err(e) => {
                        self.errors.push(e);
                        t
                    }
                }
            }
            Term::Not(t) => {
                let t = self.term(t);
                quote!(g.not(#t))
            }
        }
    }

    fn branch(&mut self, branch: &Branch) -> TokenStream {
        let terms: Vec<_> = branch.terms.iter().map(|t| self.term(t)).collect();
        let body = match terms.len() {
            0 => quote!(g.empty()),
            1 => terms[0].clone(),
            2 => quote!(g.seq([#(#terms),*])),
            // a flat list of all parts rather than nested pairs
            n => quote!(g.reduce(
                g.seq([#(#terms),*]),
                ::derivatives::Reducer::flatten(#n),
            )),
        };
        match &branch.reducer {
            Some(path) => {
                let name = path.to_token_stream().to_string().replace(' ', "");
                quote!(g.reduce(#body, ::derivatives::Reducer::new(#name, #path)))
            }
            None => body,
        }
    }

    fn alts(&mut self, alts: &Alts) -> TokenStream {
        let branches: Vec<_> = alts.branches.iter().map(|b| self.branch(b)).collect();
        match &branches[..] {
            [only] => only.clone(),
            _ => quote!(g.alt([#(#branches),*])),
        }
    }
}

impl GrammarInput {
    pub fn emit(self) -> TokenStream {
        let mut emitter = Emitter {
            rules: HashSet::new(),
            errors: Vec::new(),
        };

        for rule in &self.rules {
            let key = rule.name.to_string();
            if RESERVED.contains(&key.as_str()) {
                emitter.errors.push(syn::Error::new(
                    rule.name.span(),
                    format!("`{key}` can't be used as a rule name"),
                ));
            }
            if !emitter.rules.insert(key.clone()) {
                emitter.errors.push(syn::Error::new(
                    rule.name.span(),
                    format!("rule `{key}` is defined more than once"),
                ));
            }
        }
        if self.rules.is_empty() {
            emitter
                .errors
                .push(syn::Error::new(self.name.span(), "a grammar needs at least one rule"));
        }

        let definitions: Vec<_> = self
            .rules
            .iter()
            .map(|rule| {
                let key = rule.name.to_string();
                let body = emitter.alts(&rule.body);
                quote!(g.define(#key, #body)?;)
            })
            .collect();

        let errors = emitter.errors.iter().map(syn::Error::to_compile_error);

        let GrammarInput {
            attrs,
            vis,
            name,
            rules,
        } = self;
        let accessors = rules.iter().map(|rule| {
            let ident = &rule.name;
            let key = ident.to_string();
            let doc = format!("The `{key}` rule.");
            quote!(
                #[doc = #doc]
                #vis fn #ident(&self) -> ::derivatives::Expr {
                    self.grammar.rule(#key)
                }
            )
        });
        let start = rules
            .first()
            .map(|rule| rule.name.to_string())
            .unwrap_or_default();

        quote!(
            #(#errors)*

            #(#attrs)*
            #vis struct #name {
                grammar: ::derivatives::Grammar,
                start: ::derivatives::Expr,
            }

            impl #name {
                /// Builds the grammar. Fails if a range or repetition in it is
                /// invalid.
                #vis fn new() -> ::core::result::Result<Self, ::derivatives::GrammarError> {
                    let g = ::derivatives::Grammar::new();
                    #(#definitions)*
                    let start = g.rule(#start);
                    ::core::result::Result::Ok(Self { grammar: g, start })
                }

                #(#accessors)*
            }

            impl ::derivatives::Language for #name {
                fn grammar(&self) -> &::derivatives::Grammar {
                    &self.grammar
                }

                fn start(&self) -> ::derivatives::Expr {
                    self.start
                }
            }
        )
    }
}

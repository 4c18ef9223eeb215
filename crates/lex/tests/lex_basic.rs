use lex::{Keyword as Kw, Lexer, Punctuator as P, TokenKind as K};

fn kinds(src: &str) -> Vec<K> {
    Lexer::new("t", src)
        .tokenize()
        .expect("lex ok")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn lex_var_declaration() {
    let toks = kinds("VAR a, b : INTEGER ;");
    assert_eq!(
        toks,
        vec![
            K::Keyword(Kw::Var),
            K::Identifier("a".into()),
            K::Punct(P::Comma),
            K::Identifier("b".into()),
            K::Punct(P::Colon),
            K::Identifier("INTEGER".into()),
            K::Punct(P::Semicolon),
        ]
    );
}

#[test]
fn lex_program_skeleton() {
    let toks = kinds("BEGIN WRITE 1 END.");
    assert_eq!(
        toks,
        vec![
            K::Keyword(Kw::Begin),
            K::Keyword(Kw::Write),
            K::IntLiteral("1".into()),
            K::Keyword(Kw::End),
            K::Punct(P::Dot),
        ]
    );
}

#[test]
fn lex_relational_and_assign_operators() {
    let toks = kinds("a := b <= c >= d < e > f = g # h");
    let puncts: Vec<_> = toks
        .iter()
        .filter_map(|k| match k {
            K::Punct(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(
        puncts,
        vec![P::Assign, P::Le, P::Ge, P::Lt, P::Gt, P::Eq, P::Hash]
    );
}

#[test]
fn lex_arithmetic_keywords() {
    let toks = kinds("a DIV b MOD c * d");
    assert!(toks.contains(&K::Keyword(Kw::Div)));
    assert!(toks.contains(&K::Keyword(Kw::Mod)));
    assert!(toks.contains(&K::Punct(P::Star)));
}

#[test]
fn comments_run_to_end_of_line() {
    let toks = kinds("x -- this is ignored := 1\n:= 2");
    assert_eq!(
        toks,
        vec![
            K::Identifier("x".into()),
            K::Punct(P::Assign),
            K::IntLiteral("2".into()),
        ]
    );
}

#[test]
fn keywords_are_case_sensitive() {
    // lowercase `begin` is an identifier, not a keyword
    let toks = kinds("begin");
    assert_eq!(toks, vec![K::Identifier("begin".into())]);
}

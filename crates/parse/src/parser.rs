use anyhow::{anyhow, Result};
use lex::{Keyword as Kw, Lexer, Punctuator as P, SourceLoc, Token, TokenKind as K};

use crate::ast::*;

pub struct Parser<'a> {
    filename: &'a str,
    toks: Vec<Token>,
    pos: usize,
}

/// Lex and parse a whole program.
pub fn parse_program(filename: &str, src: &str) -> Result<Program> {
    Parser::from_source(filename, src)?.parse()
}

impl<'a> Parser<'a> {
    pub fn from_source(filename: &'a str, src: &'a str) -> Result<Self> {
        let toks = Lexer::new(filename, src).tokenize()?;
        Ok(Self {
            filename,
            toks,
            pos: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.toks.get(self.pos)
    }

    fn peek_kind(&self) -> Option<K> {
        self.peek().map(|t| t.kind.clone())
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.toks.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Position used for errors at the current token (or past the end).
    fn cur_loc(&self) -> SourceLoc {
        self.peek()
            .or_else(|| self.toks.last())
            .map(|t| t.loc)
            .unwrap_or(SourceLoc { line: 1, col: 1 })
    }

    fn err(&self, loc: SourceLoc, msg: &str) -> anyhow::Error {
        anyhow!(
            "{}:{}:{}: Error: {}",
            self.filename,
            loc.line,
            loc.col,
            msg
        )
    }

    fn consume_punct(&mut self, p: P) -> bool {
        if let Some(K::Punct(pp)) = self.peek().map(|t| &t.kind) {
            if *pp == p {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn expect_punct(&mut self, p: P, what: &str) -> Result<SourceLoc> {
        let loc = self.cur_loc();
        if self.consume_punct(p) {
            Ok(loc)
        } else {
            Err(self.err(loc, &format!("Expected {what}")))
        }
    }

    fn consume_keyword(&mut self, kw: Kw) -> bool {
        if let Some(K::Keyword(k)) = self.peek().map(|t| &t.kind) {
            if *k == kw {
                self.pos += 1;
                return true;
            }
        }
        false
    }

    fn expect_keyword(&mut self, kw: Kw, what: &str) -> Result<SourceLoc> {
        let loc = self.cur_loc();
        if self.consume_keyword(kw) {
            Ok(loc)
        } else {
            Err(self.err(loc, &format!("Expected {what}")))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident> {
        let loc = self.cur_loc();
        match self.bump().map(|t| t.kind) {
            Some(K::Identifier(name)) => Ok(Ident { name, loc }),
            _ => Err(self.err(loc, "Expected an identifier")),
        }
    }

    pub fn parse(&mut self) -> Result<Program> {
        let decls = self.parse_declarations()?;
        self.expect_keyword(Kw::Begin, "BEGIN")?;
        let body = self.parse_statements()?;
        self.expect_keyword(Kw::End, "END")?;
        self.expect_punct(P::Dot, "'.' after END")?;
        if self.peek().is_some() {
            let loc = self.cur_loc();
            return Err(self.err(loc, "Unexpected input after end of program"));
        }
        Ok(Program { decls, body })
    }

    // ===== Declarations =====

    // Each section keyword introduces one or more entries, Pascal style:
    //   VAR a : ARRAY 3 OF INTEGER; i : INTEGER;
    fn parse_declarations(&mut self) -> Result<Vec<Decl>> {
        let mut decls = Vec::new();
        loop {
            if self.consume_keyword(Kw::Const) {
                loop {
                    let name = self.expect_ident()?;
                    self.expect_punct(P::Eq, "'=' in constant declaration")?;
                    let value = self.parse_expr()?;
                    self.expect_punct(P::Semicolon, "';' after declaration")?;
                    decls.push(Decl::Const { name, value });
                    if !matches!(self.peek_kind(), Some(K::Identifier(_))) {
                        break;
                    }
                }
            } else if self.consume_keyword(Kw::Type) {
                loop {
                    let name = self.expect_ident()?;
                    self.expect_punct(P::Eq, "'=' in type declaration")?;
                    let ty = self.parse_type()?;
                    self.expect_punct(P::Semicolon, "';' after declaration")?;
                    decls.push(Decl::Type { name, ty });
                    if !matches!(self.peek_kind(), Some(K::Identifier(_))) {
                        break;
                    }
                }
            } else if self.consume_keyword(Kw::Var) {
                loop {
                    let names = self.parse_ident_list()?;
                    self.expect_punct(P::Colon, "':' in variable declaration")?;
                    let ty = self.parse_type()?;
                    self.expect_punct(P::Semicolon, "';' after declaration")?;
                    decls.push(Decl::Var { names, ty });
                    if !matches!(self.peek_kind(), Some(K::Identifier(_))) {
                        break;
                    }
                }
            } else {
                break;
            }
        }
        Ok(decls)
    }

    fn parse_ident_list(&mut self) -> Result<Vec<Ident>> {
        let mut names = vec![self.expect_ident()?];
        while self.consume_punct(P::Comma) {
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    fn parse_type(&mut self) -> Result<TypeExpr> {
        let loc = self.cur_loc();
        match self.peek_kind() {
            Some(K::Identifier(name)) => {
                self.pos += 1;
                Ok(TypeExpr::Named { name, loc })
            }
            Some(K::Keyword(Kw::Array)) => {
                self.pos += 1;
                let len = match self.bump().map(|t| t.kind) {
                    Some(K::IntLiteral(repr)) => repr,
                    _ => return Err(self.err(loc, "Expected array size")),
                };
                self.expect_keyword(Kw::Of, "OF in array type")?;
                let elem = Box::new(self.parse_type()?);
                Ok(TypeExpr::Array { len, elem, loc })
            }
            Some(K::Keyword(Kw::Record)) => {
                self.pos += 1;
                let mut fields = Vec::new();
                loop {
                    if self.consume_keyword(Kw::End) {
                        break;
                    }
                    let names = self.parse_ident_list()?;
                    self.expect_punct(P::Colon, "':' in record field")?;
                    let ty = self.parse_type()?;
                    fields.push(FieldGroup { names, ty });
                    if self.consume_punct(P::Semicolon) {
                        continue;
                    }
                    self.expect_keyword(Kw::End, "END after record fields")?;
                    break;
                }
                Ok(TypeExpr::Record { fields, loc })
            }
            _ => Err(self.err(loc, "Expected a type")),
        }
    }

    // ===== Statements =====

    fn at_statement_start(&self) -> bool {
        matches!(
            self.peek().map(|t| &t.kind),
            Some(K::Identifier(_))
                | Some(K::Keyword(
                    Kw::Read | Kw::Write | Kw::If | Kw::While | Kw::Repeat
                ))
        )
    }

    fn parse_statements(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while self.at_statement_start() {
            stmts.push(self.parse_statement()?);
            if !self.consume_punct(P::Semicolon) {
                break;
            }
        }
        Ok(stmts)
    }

    fn parse_statement(&mut self) -> Result<Stmt> {
        let loc = self.cur_loc();
        match self.peek_kind() {
            Some(K::Identifier(_)) => {
                let target = self.parse_designator()?;
                self.expect_punct(P::Assign, "':=' in assignment")?;
                let value = self.parse_expr()?;
                Ok(Stmt::Assign { target, value, loc })
            }
            Some(K::Keyword(Kw::Read)) => {
                self.pos += 1;
                let target = self.parse_designator()?;
                Ok(Stmt::Read { target, loc })
            }
            Some(K::Keyword(Kw::Write)) => {
                self.pos += 1;
                let value = self.parse_expr()?;
                Ok(Stmt::Write { value, loc })
            }
            Some(K::Keyword(Kw::If)) => {
                self.pos += 1;
                let cond = self.parse_condition()?;
                self.expect_keyword(Kw::Then, "THEN")?;
                let then_body = self.parse_statements()?;
                let else_body = if self.consume_keyword(Kw::Else) {
                    Some(self.parse_statements()?)
                } else {
                    None
                };
                self.expect_keyword(Kw::End, "END after IF")?;
                Ok(Stmt::If {
                    cond,
                    then_body,
                    else_body,
                    loc,
                })
            }
            Some(K::Keyword(Kw::While)) => {
                self.pos += 1;
                let cond = self.parse_condition()?;
                self.expect_keyword(Kw::Do, "DO")?;
                let body = self.parse_statements()?;
                self.expect_keyword(Kw::End, "END after WHILE")?;
                Ok(Stmt::While { cond, body, loc })
            }
            Some(K::Keyword(Kw::Repeat)) => {
                self.pos += 1;
                let body = self.parse_statements()?;
                self.expect_keyword(Kw::Until, "UNTIL")?;
                let cond = self.parse_condition()?;
                Ok(Stmt::Repeat { body, cond, loc })
            }
            _ => Err(self.err(loc, "Expected a statement")),
        }
    }

    // ===== Conditions and expressions =====

    fn parse_condition(&mut self) -> Result<Condition> {
        let lhs = self.parse_expr()?;
        let loc = self.cur_loc();
        let op = match self.peek_kind() {
            Some(K::Punct(P::Eq)) => RelOp::Eq,
            Some(K::Punct(P::Hash)) => RelOp::Ne,
            Some(K::Punct(P::Lt)) => RelOp::Lt,
            Some(K::Punct(P::Le)) => RelOp::Le,
            Some(K::Punct(P::Gt)) => RelOp::Gt,
            Some(K::Punct(P::Ge)) => RelOp::Ge,
            _ => return Err(self.err(loc, "Expected a comparison operator")),
        };
        self.pos += 1;
        let rhs = self.parse_expr()?;
        Ok(Condition { op, lhs, rhs, loc })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let loc = self.cur_loc();
            let op = match self.peek_kind() {
                Some(K::Punct(P::Plus)) => BinaryOp::Add,
                Some(K::Punct(P::Minus)) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_factor()?;
        loop {
            let loc = self.cur_loc();
            let op = match self.peek_kind() {
                Some(K::Punct(P::Star)) => BinaryOp::Mul,
                Some(K::Keyword(Kw::Div)) => BinaryOp::Div,
                Some(K::Keyword(Kw::Mod)) => BinaryOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                loc,
            };
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr> {
        let loc = self.cur_loc();
        match self.peek_kind() {
            Some(K::IntLiteral(repr)) => {
                self.pos += 1;
                Ok(Expr::IntLiteral { repr, loc })
            }
            Some(K::Identifier(_)) => self.parse_designator(),
            Some(K::Punct(P::LParen)) => {
                self.pos += 1;
                let e = self.parse_expr()?;
                self.expect_punct(P::RParen, "')'")?;
                Ok(e)
            }
            _ => Err(self.err(loc, "Expected an expression")),
        }
    }

    fn parse_designator(&mut self) -> Result<Expr> {
        let id = self.expect_ident()?;
        let mut d = Expr::VarRef {
            name: id.name,
            loc: id.loc,
        };
        loop {
            let loc = self.cur_loc();
            if self.consume_punct(P::LBracket) {
                let index = self.parse_expr()?;
                self.expect_punct(P::RBracket, "']'")?;
                d = Expr::Index {
                    base: Box::new(d),
                    index: Box::new(index),
                    loc,
                };
            } else if self.consume_punct(P::Dot) {
                let field = self.expect_ident()?;
                d = Expr::Field {
                    base: Box::new(d),
                    field: field.name,
                    loc,
                };
            } else {
                break;
            }
        }
        Ok(d)
    }
}

use anyhow::{bail, Result};

use crate::keywords::to_keyword;
use crate::token::{Punctuator as P, SourceLoc, Token, TokenKind as K};

pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    filename: &'a str,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(filename: &'a str, src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            filename,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.bytes
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(s.as_bytes()))
    }

    fn loc(&self) -> SourceLoc {
        SourceLoc {
            line: self.line,
            col: self.col,
        }
    }

    fn is_ident_start(c: u8) -> bool {
        c == b'_' || (c as char).is_ascii_alphabetic()
    }
    fn is_ident_continue(c: u8) -> bool {
        c == b'_' || (c as char).is_ascii_alphanumeric()
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
                let _ = self.bump();
            }
            // -- comment to end of line
            if self.starts_with("--") {
                while let Some(c) = self.bump() {
                    if c == b'\n' {
                        break;
                    }
                }
                continue;
            }
            break;
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_ws_and_comments();
        let loc = self.loc();
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        // Identifier or keyword
        if Self::is_ident_start(c) {
            let _ = self.bump();
            while let Some(c2) = self.peek() {
                if Self::is_ident_continue(c2) {
                    let _ = self.bump();
                } else {
                    break;
                }
            }
            let lex = &self.src[start..self.pos];
            let kind = if let Some(kw) = to_keyword(lex) {
                K::Keyword(kw)
            } else {
                K::Identifier(lex.to_string())
            };
            return Ok(Some(Token { kind, loc }));
        }

        // Integer literal: decimal digit run, lexeme kept for the analyzer
        if (c as char).is_ascii_digit() {
            let _ = self.bump();
            while let Some(c2) = self.peek() {
                if (c2 as char).is_ascii_digit() {
                    let _ = self.bump();
                } else {
                    break;
                }
            }
            let repr = self.src[start..self.pos].to_string();
            return Ok(Some(Token {
                kind: K::IntLiteral(repr),
                loc,
            }));
        }

        // 2-char punctuators first
        for (text, pk) in [(":=", P::Assign), ("<=", P::Le), (">=", P::Ge)] {
            if self.starts_with(text) {
                let _ = self.bump();
                let _ = self.bump();
                return Ok(Some(Token {
                    kind: K::Punct(pk),
                    loc,
                }));
            }
        }

        let ch = self.bump().unwrap_or_default();
        let pk = match ch {
            b'(' => P::LParen,
            b')' => P::RParen,
            b'[' => P::LBracket,
            b']' => P::RBracket,
            b';' => P::Semicolon,
            b':' => P::Colon,
            b',' => P::Comma,
            b'.' => P::Dot,
            b'+' => P::Plus,
            b'-' => P::Minus,
            b'*' => P::Star,
            b'=' => P::Eq,
            b'#' => P::Hash,
            b'<' => P::Lt,
            b'>' => P::Gt,
            _ => {
                bail!(
                    "{}:{}:{}: Error: Unexpected character '{}'",
                    self.filename,
                    loc.line,
                    loc.col,
                    ch as char
                );
            }
        };
        Ok(Some(Token {
            kind: K::Punct(pk),
            loc,
        }))
    }

    /// Run the scanner to completion.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut toks = Vec::new();
        while let Some(t) = self.next_token()? {
            toks.push(t);
        }
        Ok(toks)
    }
}

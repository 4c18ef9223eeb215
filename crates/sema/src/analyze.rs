use anyhow::{anyhow, Result};
use lex::SourceLoc;
use parse::{Condition, Decl, Expr, Ident, Program, Stmt, TypeExpr};

use crate::symtab::{ScopeId, SymbolKind, SymbolTable};
use crate::types::Type;

/// Walk the program, build the global symbol table (offsets in textual
/// order) and check every statement. The first error is fatal.
pub fn analyze(filename: &str, program: &Program) -> Result<SymbolTable> {
    let tab = SymbolTable::new();
    let scope = tab.root();
    let mut a = Analyzer {
        filename,
        tab,
        scope,
    };
    for d in &program.decls {
        a.visit_decl(d)?;
    }
    for s in &program.body {
        a.check_stmt(s)?;
    }
    Ok(a.tab)
}

struct Analyzer<'a> {
    filename: &'a str,
    tab: SymbolTable,
    scope: ScopeId,
}

impl<'a> Analyzer<'a> {
    fn err(&self, loc: SourceLoc, msg: &str) -> anyhow::Error {
        anyhow!(
            "{}:{}:{}: Error: {}",
            self.filename,
            loc.line,
            loc.col,
            msg
        )
    }

    // ===== Declarations =====

    fn visit_decl(&mut self, d: &Decl) -> Result<()> {
        match d {
            Decl::Const { name, value } => {
                // The constant's type comes from its initializer; the value
                // itself is not recorded (const reads behave like variable
                // reads of a zero-initialized slot).
                let ty = self.expr_type(value)?;
                self.declare(name, ty, SymbolKind::Const)
            }
            Decl::Type { name, ty } => {
                let t = self.resolve_type(ty)?;
                self.declare(name, t, SymbolKind::TypeDef)
            }
            Decl::Var { names, ty } => {
                let t = self.resolve_type(ty)?;
                for n in names {
                    self.declare(n, t.clone(), SymbolKind::Variable)?;
                }
                Ok(())
            }
        }
    }

    fn declare(&mut self, name: &Ident, ty: Type, kind: SymbolKind) -> Result<()> {
        if self.tab.exists(self.scope, &name.name) {
            return Err(self.err(
                name.loc,
                &format!("Name '{}' is already defined", name.name),
            ));
        }
        self.tab.insert(self.scope, &name.name, ty, kind);
        Ok(())
    }

    fn resolve_type(&mut self, te: &TypeExpr) -> Result<Type> {
        match te {
            TypeExpr::Named { name, loc } => {
                if name == "INTEGER" {
                    Ok(Type::Integer)
                } else if name == "CHAR" {
                    Ok(Type::Char)
                } else if let Some(sym) = self.tab.lookup(self.scope, name) {
                    Ok(sym.ty.clone())
                } else {
                    Err(self.err(*loc, &format!("Unknown type '{}'", name)))
                }
            }
            TypeExpr::Array { len, elem, loc } => {
                let n: i64 = len
                    .parse()
                    .map_err(|_| self.err(*loc, &format!("Invalid array size '{}'", len)))?;
                if n <= 0 {
                    return Err(self.err(*loc, "Array size must be positive"));
                }
                let e = self.resolve_type(elem)?;
                Ok(Type::Array {
                    len: n,
                    elem: Box::new(e),
                })
            }
            TypeExpr::Record { fields, .. } => {
                // Field offsets start at 0 in the record's own scope; the
                // parent link lets field types resolve user-defined names.
                let rec_scope = self.tab.push_scope(self.scope);
                let saved = std::mem::replace(&mut self.scope, rec_scope);
                for g in fields {
                    let t = self.resolve_type(&g.ty)?;
                    for n in &g.names {
                        self.declare(n, t.clone(), SymbolKind::Variable)?;
                    }
                }
                self.scope = saved;
                Ok(Type::Record { fields: rec_scope })
            }
        }
    }

    // ===== Statements =====

    fn check_stmts(&self, stmts: &[Stmt]) -> Result<()> {
        for s in stmts {
            self.check_stmt(s)?;
        }
        Ok(())
    }

    fn check_stmt(&self, s: &Stmt) -> Result<()> {
        match s {
            Stmt::Assign { target, value, .. } => {
                let tt = self.expr_type(target)?;
                if !tt.is_primitive() {
                    return Err(self.err(target.loc(), "Cannot assign to a value of aggregate type"));
                }
                let vt = self.expr_type(value)?;
                if !vt.is_primitive() {
                    return Err(self.err(value.loc(), "Cannot assign a value of aggregate type"));
                }
                Ok(())
            }
            Stmt::Read { target, .. } => {
                let tt = self.expr_type(target)?;
                if !tt.is_primitive() {
                    return Err(self.err(target.loc(), "Cannot READ into a value of aggregate type"));
                }
                Ok(())
            }
            Stmt::Write { value, .. } => {
                let vt = self.expr_type(value)?;
                if !vt.is_primitive() {
                    return Err(self.err(value.loc(), "Cannot WRITE a value of aggregate type"));
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                self.check_cond(cond)?;
                self.check_stmts(then_body)?;
                if let Some(eb) = else_body {
                    self.check_stmts(eb)?;
                }
                Ok(())
            }
            Stmt::While { cond, body, .. } => {
                self.check_cond(cond)?;
                self.check_stmts(body)
            }
            Stmt::Repeat { body, cond, .. } => {
                self.check_stmts(body)?;
                self.check_cond(cond)
            }
        }
    }

    fn check_cond(&self, c: &Condition) -> Result<()> {
        for side in [&c.lhs, &c.rhs] {
            let t = self.expr_type(side)?;
            if !t.is_primitive() {
                return Err(self.err(side.loc(), "Cannot compare values of aggregate type"));
            }
        }
        Ok(())
    }

    // ===== Expressions =====

    fn expr_type(&self, e: &Expr) -> Result<Type> {
        match e {
            Expr::IntLiteral { repr, loc } => {
                repr.parse::<i64>()
                    .map_err(|_| self.err(*loc, &format!("Integer literal '{}' out of range", repr)))?;
                Ok(Type::Integer)
            }
            Expr::VarRef { name, loc } => match self.tab.lookup(self.scope, name) {
                Some(sym) => Ok(sym.ty.clone()),
                None => Err(self.err(*loc, &format!("Undefined variable '{}'", name))),
            },
            Expr::Index { base, index, loc } => {
                let bt = self.expr_type(base)?;
                let it = self.expr_type(index)?;
                match bt {
                    Type::Array { elem, .. } => {
                        if it != Type::Integer {
                            return Err(
                                self.err(index.loc(), "Array subscript is not an integer")
                            );
                        }
                        Ok(*elem)
                    }
                    _ => Err(self.err(*loc, "Subscripted value is not an array")),
                }
            }
            Expr::Field { base, field, loc } => {
                let bt = self.expr_type(base)?;
                match bt {
                    Type::Record { fields } => match self.tab.lookup_local(fields, field) {
                        Some(sym) => Ok(sym.ty.clone()),
                        None => Err(self.err(*loc, &format!("Record has no field '{}'", field))),
                    },
                    _ => Err(self.err(*loc, "Field reference of non-record value")),
                }
            }
            Expr::Binary { lhs, rhs, loc, .. } => {
                let lt = self.expr_type(lhs)?;
                let rt = self.expr_type(rhs)?;
                if !lt.is_primitive() || !rt.is_primitive() {
                    return Err(self.err(*loc, "Arithmetic on a value of aggregate type"));
                }
                Ok(Type::Integer)
            }
        }
    }
}

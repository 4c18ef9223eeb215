use std::collections::HashSet;
use std::fmt::Write as _;

use crate::types::Type;

/// Handle into the scope arena. The parent link is a back-reference, not
/// ownership, so scopes are stored flat and addressed by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Const,
    Variable,
    TypeDef,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub kind: SymbolKind,
    /// Byte offset within the owning scope, assigned in declaration order.
    pub offset: i64,
}

#[derive(Debug)]
struct Scope {
    symbols: Vec<Symbol>,
    parent: Option<ScopeId>,
    depth: u32,
    next_offset: i64,
}

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                symbols: Vec::new(),
                parent: None,
                depth: 0,
                next_offset: 0,
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn push_scope(&mut self, parent: ScopeId) -> ScopeId {
        let depth = self.scopes[parent.0].depth + 1;
        self.scopes.push(Scope {
            symbols: Vec::new(),
            parent: Some(parent),
            depth,
            next_offset: 0,
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn depth(&self, id: ScopeId) -> u32 {
        self.scopes[id.0].depth
    }

    pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
        self.scopes[id.0].parent
    }

    pub fn symbols(&self, id: ScopeId) -> &[Symbol] {
        &self.scopes[id.0].symbols
    }

    /// Sum of the sizes of everything inserted into the scope so far.
    pub fn storage_size(&self, id: ScopeId) -> i64 {
        self.scopes[id.0].next_offset
    }

    pub fn lookup_local(&self, id: ScopeId, name: &str) -> Option<&Symbol> {
        self.scopes[id.0].symbols.iter().find(|s| s.name == name)
    }

    /// Search the scope chain, innermost first, each scope in insertion order.
    pub fn lookup(&self, id: ScopeId, name: &str) -> Option<&Symbol> {
        let mut cur = Some(id);
        while let Some(sc) = cur {
            if let Some(sym) = self.lookup_local(sc, name) {
                return Some(sym);
            }
            cur = self.scopes[sc.0].parent;
        }
        None
    }

    pub fn exists(&self, id: ScopeId, name: &str) -> bool {
        self.lookup(id, name).is_some()
    }

    /// Insert a symbol, allocating its offset from the scope's running
    /// counter. The caller is responsible for the redefinition check.
    pub fn insert(&mut self, id: ScopeId, name: &str, ty: Type, kind: SymbolKind) -> i64 {
        let size = ty.size(self);
        let scope = &mut self.scopes[id.0];
        let offset = scope.next_offset;
        scope.next_offset += size;
        scope.symbols.push(Symbol {
            name: name.to_string(),
            ty,
            kind,
            offset,
        });
        offset
    }

    /// `depth,kind,name,type` — one line per symbol, top-down, each record
    /// scope printed once, before the first symbol that references it.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut printed: HashSet<ScopeId> = HashSet::new();
        self.render_scope(self.root(), &mut printed, &mut out);
        out
    }

    fn render_scope(&self, id: ScopeId, printed: &mut HashSet<ScopeId>, out: &mut String) {
        for sym in self.symbols(id) {
            self.render_record_scopes(&sym.ty, printed, out);
            let kind = match (sym.kind, &sym.ty) {
                (SymbolKind::TypeDef, Type::Record { .. }) => "RECORD",
                (SymbolKind::TypeDef, _) => "TYPE",
                (SymbolKind::Const, _) => "CONST",
                (SymbolKind::Variable, _) => "VAR",
            };
            let _ = writeln!(
                out,
                "{},{},{},{}",
                self.depth(id),
                kind,
                sym.name,
                sym.ty.text(self)
            );
        }
    }

    fn render_record_scopes(&self, ty: &Type, printed: &mut HashSet<ScopeId>, out: &mut String) {
        match ty {
            Type::Array { elem, .. } => self.render_record_scopes(elem, printed, out),
            Type::Record { fields } => {
                if printed.insert(*fields) {
                    self.render_scope(*fields, printed, out);
                }
            }
            _ => {}
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

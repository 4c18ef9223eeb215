use crate::symtab::{ScopeId, SymbolTable};

/// INTEGER is 8 bytes; the backend treats every slot as 8 bytes regardless.
pub const INTEGER_SIZE: i64 = 8;
pub const CHAR_SIZE: i64 = 1;

/// The primitives are canonical by value equality; record types carry a
/// handle to their field scope in the symbol-table arena rather than owning
/// a nested table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Integer,
    Char,
    Array { len: i64, elem: Box<Type> },
    Record { fields: ScopeId },
}

impl Type {
    pub fn size(&self, tab: &SymbolTable) -> i64 {
        match self {
            Type::Integer => INTEGER_SIZE,
            Type::Char => CHAR_SIZE,
            Type::Array { len, elem } => len * elem.size(tab),
            Type::Record { fields } => tab.storage_size(*fields),
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Integer | Type::Char)
    }

    /// Textual form used by the symbol-table printer:
    /// `INTEGER`, `CHAR`, `ARRAY n OF T`, `RECORD (f:T, g:U)`.
    pub fn text(&self, tab: &SymbolTable) -> String {
        match self {
            Type::Integer => "INTEGER".to_string(),
            Type::Char => "CHAR".to_string(),
            Type::Array { len, elem } => format!("ARRAY {} OF {}", len, elem.text(tab)),
            Type::Record { fields } => {
                let parts: Vec<String> = tab
                    .symbols(*fields)
                    .iter()
                    .map(|s| format!("{}:{}", s.name, s.ty.text(tab)))
                    .collect();
                format!("RECORD ({})", parts.join(", "))
            }
        }
    }
}

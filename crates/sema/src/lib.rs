mod analyze;
pub mod symtab;
pub mod types;

pub use analyze::analyze;
pub use symtab::{ScopeId, Symbol, SymbolKind, SymbolTable};
pub use types::Type;

#[cfg(test)]
mod tests {
    use super::*;
    use parse::parse_program;

    #[test]
    fn single_var_gets_offset_zero() {
        let p = parse_program("t", "VAR x : INTEGER; BEGIN END.").unwrap();
        let tab = analyze("t", &p).unwrap();
        let sym = tab.lookup(tab.root(), "x").unwrap();
        assert_eq!(sym.offset, 0);
        assert_eq!(sym.ty, Type::Integer);
        assert_eq!(tab.storage_size(tab.root()), 8);
    }

    #[test]
    fn primitive_sizes() {
        let tab = SymbolTable::new();
        assert_eq!(Type::Integer.size(&tab), 8);
        assert_eq!(Type::Char.size(&tab), 1);
        assert_eq!(
            Type::Array {
                len: 3,
                elem: Box::new(Type::Integer)
            }
            .size(&tab),
            24
        );
    }
}

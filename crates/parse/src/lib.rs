pub mod ast;
mod parser;
mod printer;

pub use ast::*;
pub use parser::parse_program;
pub use printer::{print_graph, print_tree};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_program() {
        let src = "BEGIN END.";
        let p = parse_program("t", src).unwrap();
        assert!(p.decls.is_empty());
        assert!(p.body.is_empty());
    }

    #[test]
    fn parse_write_literal() {
        let src = "BEGIN WRITE 1 END.";
        let p = parse_program("t", src).unwrap();
        assert_eq!(p.body.len(), 1);
        assert!(matches!(
            p.body[0],
            Stmt::Write {
                value: Expr::IntLiteral { ref repr, .. },
                ..
            } if repr == "1"
        ));
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        let res = parse_program("t", "BEGIN END. VAR");
        assert!(res.is_err());
    }

    #[test]
    fn missing_final_dot_is_an_error() {
        let err = parse_program("t", "BEGIN END").unwrap_err();
        assert!(err.to_string().contains("Error:"), "{err}");
    }
}

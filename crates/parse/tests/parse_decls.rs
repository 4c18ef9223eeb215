use parse::*;

#[test]
fn parse_var_decl_multiple_names() {
    let src = "VAR i, s : INTEGER; BEGIN END.";
    let p = parse_program("t", src).expect("parse ok");
    assert_eq!(p.decls.len(), 1);
    match &p.decls[0] {
        Decl::Var { names, ty } => {
            let ns: Vec<_> = names.iter().map(|n| n.name.as_str()).collect();
            assert_eq!(ns, vec!["i", "s"]);
            assert!(matches!(ty, TypeExpr::Named { name, .. } if name == "INTEGER"));
        }
        other => panic!("expected var decl, got {other:?}"),
    }
}

#[test]
fn parse_const_decl() {
    let src = "CONST n = 10; BEGIN END.";
    let p = parse_program("t", src).expect("parse ok");
    match &p.decls[0] {
        Decl::Const { name, value } => {
            assert_eq!(name.name, "n");
            assert!(matches!(value, Expr::IntLiteral { repr, .. } if repr == "10"));
        }
        other => panic!("expected const decl, got {other:?}"),
    }
}

#[test]
fn parse_array_type() {
    let src = "VAR a : ARRAY 3 OF INTEGER; BEGIN END.";
    let p = parse_program("t", src).expect("parse ok");
    match &p.decls[0] {
        Decl::Var { ty, .. } => match ty {
            TypeExpr::Array { len, elem, .. } => {
                assert_eq!(len, "3");
                assert!(matches!(&**elem, TypeExpr::Named { name, .. } if name == "INTEGER"));
            }
            other => panic!("expected array type, got {other:?}"),
        },
        other => panic!("expected var decl, got {other:?}"),
    }
}

#[test]
fn parse_nested_array_type() {
    let src = "VAR m : ARRAY 2 OF ARRAY 3 OF INTEGER; BEGIN END.";
    let p = parse_program("t", src).expect("parse ok");
    match &p.decls[0] {
        Decl::Var {
            ty: TypeExpr::Array { elem, .. },
            ..
        } => {
            assert!(matches!(&**elem, TypeExpr::Array { .. }));
        }
        other => panic!("expected array of array, got {other:?}"),
    }
}

#[test]
fn parse_record_type_with_field_groups() {
    let src = "TYPE P = RECORD x, y : INTEGER; tag : CHAR END; BEGIN END.";
    let p = parse_program("t", src).expect("parse ok");
    match &p.decls[0] {
        Decl::Type { name, ty } => {
            assert_eq!(name.name, "P");
            match ty {
                TypeExpr::Record { fields, .. } => {
                    assert_eq!(fields.len(), 2);
                    assert_eq!(fields[0].names.len(), 2);
                    assert_eq!(fields[1].names[0].name, "tag");
                }
                other => panic!("expected record type, got {other:?}"),
            }
        }
        other => panic!("expected type decl, got {other:?}"),
    }
}

#[test]
fn declarations_precede_begin() {
    // a VAR section after BEGIN is a parse error
    let res = parse_program("t", "BEGIN VAR x : INTEGER; END.");
    assert!(res.is_err());
}

#[test]
fn var_section_with_multiple_groups() {
    // one VAR keyword, two groups
    let src = "VAR a : ARRAY 3 OF INTEGER; i : INTEGER; BEGIN END.";
    let p = parse_program("t", src).expect("parse ok");
    assert_eq!(p.decls.len(), 2);
    assert!(matches!(&p.decls[0], Decl::Var { ty: TypeExpr::Array { .. }, .. }));
    assert!(matches!(&p.decls[1], Decl::Var { ty: TypeExpr::Named { .. }, .. }));
}

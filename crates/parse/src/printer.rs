//! Renderings of the syntax tree for the -p (text) and -g (DOT) modes.

use std::fmt::Write as _;

use crate::ast::*;

struct PNode {
    label: String,
    kids: Vec<PNode>,
}

fn leaf(label: impl Into<String>) -> PNode {
    PNode {
        label: label.into(),
        kids: Vec::new(),
    }
}

fn node(label: impl Into<String>, kids: Vec<PNode>) -> PNode {
    PNode {
        label: label.into(),
        kids,
    }
}

fn type_node(ty: &TypeExpr) -> PNode {
    match ty {
        TypeExpr::Named { name, .. } => leaf(format!("named_type[{name}]")),
        TypeExpr::Array { len, elem, .. } => {
            node(format!("array_type[{len}]"), vec![type_node(elem)])
        }
        TypeExpr::Record { fields, .. } => node(
            "record_type",
            fields
                .iter()
                .map(|g| {
                    let mut kids: Vec<PNode> = g
                        .names
                        .iter()
                        .map(|n| leaf(format!("identifier[{}]", n.name)))
                        .collect();
                    kids.push(type_node(&g.ty));
                    node("field_def", kids)
                })
                .collect(),
        ),
    }
}

fn expr_node(e: &Expr) -> PNode {
    match e {
        Expr::IntLiteral { repr, .. } => leaf(format!("int_literal[{repr}]")),
        Expr::VarRef { name, .. } => leaf(format!("var_ref[{name}]")),
        Expr::Index { base, index, .. } => {
            node("array_element_ref", vec![expr_node(base), expr_node(index)])
        }
        Expr::Field { base, field, .. } => {
            node(format!("field_ref[{field}]"), vec![expr_node(base)])
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            let label = match op {
                BinaryOp::Add => "add",
                BinaryOp::Sub => "subtract",
                BinaryOp::Mul => "multiply",
                BinaryOp::Div => "divide",
                BinaryOp::Mod => "modulus",
            };
            node(label, vec![expr_node(lhs), expr_node(rhs)])
        }
    }
}

fn cond_node(c: &Condition) -> PNode {
    let label = match c.op {
        RelOp::Eq => "compare_eq",
        RelOp::Ne => "compare_neq",
        RelOp::Lt => "compare_lt",
        RelOp::Le => "compare_lte",
        RelOp::Gt => "compare_gt",
        RelOp::Ge => "compare_gte",
    };
    node(label, vec![expr_node(&c.lhs), expr_node(&c.rhs)])
}

fn stmt_node(s: &Stmt) -> PNode {
    match s {
        Stmt::Assign { target, value, .. } => {
            node("assign", vec![expr_node(target), expr_node(value)])
        }
        Stmt::Read { target, .. } => node("read", vec![expr_node(target)]),
        Stmt::Write { value, .. } => node("write", vec![expr_node(value)]),
        Stmt::If {
            cond,
            then_body,
            else_body,
            ..
        } => {
            let mut kids = vec![cond_node(cond), block_node(then_body)];
            if let Some(eb) = else_body {
                kids.push(block_node(eb));
                node("if_else", kids)
            } else {
                node("if", kids)
            }
        }
        Stmt::While { cond, body, .. } => {
            node("while", vec![cond_node(cond), block_node(body)])
        }
        Stmt::Repeat { body, cond, .. } => {
            node("repeat", vec![block_node(body), cond_node(cond)])
        }
    }
}

fn block_node(stmts: &[Stmt]) -> PNode {
    node("statements", stmts.iter().map(stmt_node).collect())
}

fn decl_node(d: &Decl) -> PNode {
    match d {
        Decl::Const { name, value } => node(
            "constant_def",
            vec![leaf(format!("identifier[{}]", name.name)), expr_node(value)],
        ),
        Decl::Type { name, ty } => node(
            "type_def",
            vec![leaf(format!("identifier[{}]", name.name)), type_node(ty)],
        ),
        Decl::Var { names, ty } => {
            let mut kids: Vec<PNode> = names
                .iter()
                .map(|n| leaf(format!("identifier[{}]", n.name)))
                .collect();
            kids.push(type_node(ty));
            node("var_def", kids)
        }
    }
}

fn program_node(p: &Program) -> PNode {
    node(
        "program",
        vec![
            node("declarations", p.decls.iter().map(decl_node).collect()),
            block_node(&p.body),
        ],
    )
}

fn render(n: &PNode, prefix: &str, out: &mut String) {
    for (i, kid) in n.kids.iter().enumerate() {
        let last = i + 1 == n.kids.len();
        let _ = writeln!(out, "{}+--{}", prefix, kid.label);
        let deeper = if last {
            format!("{prefix}   ")
        } else {
            format!("{prefix}|  ")
        };
        render(kid, &deeper, out);
    }
}

/// Indented text rendering of the whole tree.
pub fn print_tree(p: &Program) -> String {
    let root = program_node(p);
    let mut out = String::new();
    let _ = writeln!(out, "{}", root.label);
    render(&root, "", &mut out);
    out
}

fn graph_node(n: &PNode, next_id: &mut usize, out: &mut String) -> usize {
    let id = *next_id;
    *next_id += 1;
    let _ = writeln!(out, "  n{} [label=\"{}\"];", id, n.label);
    for kid in &n.kids {
        let kid_id = graph_node(kid, next_id, out);
        let _ = writeln!(out, "  n{id} -> n{kid_id};");
    }
    id
}

/// DOT (graphviz) rendering of the whole tree.
pub fn print_graph(p: &Program) -> String {
    let root = program_node(p);
    let mut out = String::new();
    let _ = writeln!(out, "digraph ast {{");
    let _ = writeln!(out, "  node [shape=box];");
    let mut next_id = 0usize;
    let _ = graph_node(&root, &mut next_id, &mut out);
    let _ = writeln!(out, "}}");
    out
}

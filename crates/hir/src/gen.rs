use anyhow::{anyhow, bail, Result};
use parse::{BinaryOp, Condition, Expr, Program, RelOp, Stmt};
use sema::{ScopeId, SymbolTable, Type};

use crate::instr::{HighLevelOpcode as Op, Instruction, InstructionSequence};
use crate::operand::Operand;

/// The lowered unit: the instruction sequence plus the two scalars the
/// backend needs for frame layout.
pub struct HirProgram {
    pub code: InstructionSequence<Op>,
    /// Bytes of declared storage in the global scope.
    pub storage_size: i64,
    /// Number of vreg slots used (max index + 1).
    pub vreg_count: i64,
}

/// Lower an analyzed program to HIR. Declarations emit nothing; only the
/// statement list is visited.
pub fn generate(tab: &SymbolTable, program: &Program) -> Result<HirProgram> {
    let mut g = HirGen {
        tab,
        scope: tab.root(),
        code: InstructionSequence::new(),
        vreg: -1,
        vreg_max: -1,
        labels: 0,
    };
    g.gen_stmts(&program.body)?;
    Ok(HirProgram {
        code: g.code,
        storage_size: tab.storage_size(tab.root()),
        vreg_count: g.vreg_max + 1,
    })
}

/// Result of lowering an expression: the vreg holds either a value or, for
/// designators, the address of the named storage.
#[derive(Clone, Copy)]
struct Lowered {
    reg: i64,
    is_addr: bool,
}

struct HirGen<'a> {
    tab: &'a SymbolTable,
    scope: ScopeId,
    code: InstructionSequence<Op>,
    vreg: i64,
    vreg_max: i64,
    labels: u64,
}

impl<'a> HirGen<'a> {
    fn next_vreg(&mut self) -> i64 {
        self.vreg += 1;
        if self.vreg_max < self.vreg {
            self.vreg_max = self.vreg;
        }
        self.vreg
    }

    /// Statement boundary: scratch registers are reused from vr0 by the
    /// next statement. This keeps vreg_max (and so the frame) small.
    fn reset_vreg(&mut self) {
        self.vreg = -1;
    }

    fn next_label(&mut self) -> String {
        let label = format!(".L{}", self.labels);
        self.labels += 1;
        label
    }

    fn emit(&mut self, opcode: Op, operands: Vec<Operand>) {
        self.code.add_instruction(Instruction::new(opcode, operands));
    }

    /// Define a label before the next instruction, padding with a nop when
    /// another label is already waiting (two control statements ending on
    /// the same spot).
    fn define_label(&mut self, label: String) {
        if self.code.has_pending_label() {
            self.emit(Op::Nop, vec![]);
        }
        self.code.define_label(label);
    }

    // ===== Statements =====

    fn gen_stmts(&mut self, stmts: &[Stmt]) -> Result<()> {
        for s in stmts {
            self.gen_stmt(s)?;
        }
        Ok(())
    }

    fn gen_stmt(&mut self, s: &Stmt) -> Result<()> {
        match s {
            Stmt::Assign { target, value, .. } => {
                let addr = self.gen_designator(target)?;
                let val = self.gen_value(value)?;
                self.emit(
                    Op::StoreInt,
                    vec![Operand::VRegMem(addr), Operand::VReg(val)],
                );
                self.reset_vreg();
                Ok(())
            }
            Stmt::Read { target, .. } => {
                let addr = self.gen_designator(target)?;
                let dest = self.next_vreg();
                self.emit(Op::ReadInt, vec![Operand::VReg(dest)]);
                self.emit(
                    Op::StoreInt,
                    vec![Operand::VRegMem(addr), Operand::VReg(dest)],
                );
                self.reset_vreg();
                Ok(())
            }
            Stmt::Write { value, .. } => {
                let val = self.gen_value(value)?;
                self.emit(Op::WriteInt, vec![Operand::VReg(val)]);
                self.reset_vreg();
                Ok(())
            }
            Stmt::If {
                cond,
                then_body,
                else_body: None,
                ..
            } => {
                let out = self.next_label();
                self.lower_branch(cond, &out, true)?;
                self.gen_stmts(then_body)?;
                self.define_label(out);
                Ok(())
            }
            Stmt::If {
                cond,
                then_body,
                else_body: Some(else_body),
                ..
            } => {
                let else_label = self.next_label();
                let out = self.next_label();
                self.lower_branch(cond, &else_label, true)?;
                self.gen_stmts(then_body)?;
                self.emit(Op::Jump, vec![Operand::Label(out.clone())]);
                self.define_label(else_label);
                self.gen_stmts(else_body)?;
                self.define_label(out);
                // landing instruction so the out label always precedes one
                self.emit(Op::Nop, vec![]);
                Ok(())
            }
            Stmt::While { cond, body, .. } => {
                let body_label = self.next_label();
                let cond_label = self.next_label();
                self.emit(Op::Jump, vec![Operand::Label(cond_label.clone())]);
                self.define_label(body_label.clone());
                self.gen_stmts(body)?;
                self.define_label(cond_label);
                // loop back while the condition holds
                self.lower_branch(cond, &body_label, false)
            }
            Stmt::Repeat { body, cond, .. } => {
                let body_label = self.next_label();
                let cond_label = self.next_label();
                // first iteration flows straight into the body
                self.define_label(body_label.clone());
                self.gen_stmts(body)?;
                self.define_label(cond_label);
                // loop back until the condition becomes true
                self.lower_branch(cond, &body_label, true)
            }
        }
    }

    // ===== Conditions =====

    /// Lower a comparison fused with its branch: jump to `target` when the
    /// comparison is true, or — with `invert` — when it is false (the
    /// enclosing statement falls through on the polarity it wants).
    fn lower_branch(&mut self, cond: &Condition, target: &str, invert: bool) -> Result<()> {
        let lhs = self.gen_expr(&cond.lhs)?;
        let rhs = self.gen_expr(&cond.rhs)?;
        let l = self.materialize(lhs);
        let r = self.materialize(rhs);
        self.emit(
            Op::IntCompare,
            vec![Operand::VReg(l), Operand::VReg(r)],
        );
        let opcode = jump_opcode(cond.op, invert);
        self.emit(opcode, vec![Operand::Label(target.to_string())]);
        Ok(())
    }

    // ===== Expressions =====

    /// Lower an expression and force it to a value vreg.
    fn gen_value(&mut self, e: &Expr) -> Result<i64> {
        let lowered = self.gen_expr(e)?;
        Ok(self.materialize(lowered))
    }

    /// Load an address-bearing operand; values pass through.
    fn materialize(&mut self, lowered: Lowered) -> i64 {
        if lowered.is_addr {
            let dest = self.next_vreg();
            self.emit(
                Op::LoadInt,
                vec![Operand::VReg(dest), Operand::VRegMem(lowered.reg)],
            );
            dest
        } else {
            lowered.reg
        }
    }

    fn gen_expr(&mut self, e: &Expr) -> Result<Lowered> {
        match e {
            Expr::IntLiteral { repr, .. } => {
                let value: i64 = repr
                    .parse()
                    .map_err(|_| anyhow!("unparsed integer literal '{repr}' reached lowering"))?;
                let dest = self.next_vreg();
                self.emit(
                    Op::LoadIConst,
                    vec![Operand::VReg(dest), Operand::IntLiteral(value)],
                );
                Ok(Lowered {
                    reg: dest,
                    is_addr: false,
                })
            }
            Expr::VarRef { .. } | Expr::Index { .. } | Expr::Field { .. } => {
                let reg = self.gen_designator(e)?;
                Ok(Lowered {
                    reg,
                    is_addr: true,
                })
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                let l = self.gen_expr(lhs)?;
                let r = self.gen_expr(rhs)?;
                let lv = self.materialize(l);
                let rv = self.materialize(r);
                let dest = self.next_vreg();
                let opcode = match op {
                    BinaryOp::Add => Op::IntAdd,
                    BinaryOp::Sub => Op::IntSub,
                    BinaryOp::Mul => Op::IntMul,
                    BinaryOp::Div => Op::IntDiv,
                    BinaryOp::Mod => Op::IntMod,
                };
                self.emit(
                    opcode,
                    vec![Operand::VReg(dest), Operand::VReg(lv), Operand::VReg(rv)],
                );
                Ok(Lowered {
                    reg: dest,
                    is_addr: false,
                })
            }
        }
    }

    /// Lower a designator to a vreg holding the *address* of its storage.
    fn gen_designator(&mut self, e: &Expr) -> Result<i64> {
        match e {
            Expr::VarRef { name, .. } => {
                let sym = self
                    .tab
                    .lookup(self.scope, name)
                    .ok_or_else(|| anyhow!("unresolved name '{name}' reached lowering"))?;
                let offset = sym.offset;
                let dest = self.next_vreg();
                self.emit(
                    Op::LocalAddr,
                    vec![Operand::VReg(dest), Operand::IntLiteral(offset)],
                );
                Ok(dest)
            }
            Expr::Index { base, index, .. } => {
                let base_reg = self.gen_designator(base)?;
                let elem_size = match self.designator_type(base)? {
                    Type::Array { elem, .. } => elem.size(self.tab),
                    other => bail!("subscript of non-array type {other:?} reached lowering"),
                };
                // only a var-ref index is dereferenced on the fly by the
                // multiply; any other index operand is used directly
                let idx = self.gen_expr(index)?;
                let index_op = match index.as_ref() {
                    Expr::VarRef { .. } => Operand::VRegMem(idx.reg),
                    _ => Operand::VReg(idx.reg),
                };
                let offset_reg = self.next_vreg();
                self.emit(
                    Op::IntMul,
                    vec![
                        Operand::VReg(offset_reg),
                        index_op,
                        Operand::IntLiteral(elem_size),
                    ],
                );
                let addr_reg = self.next_vreg();
                self.emit(
                    Op::IntAdd,
                    vec![
                        Operand::VReg(addr_reg),
                        Operand::VReg(base_reg),
                        Operand::VReg(offset_reg),
                    ],
                );
                Ok(addr_reg)
            }
            Expr::Field { base, field, .. } => {
                let base_reg = self.gen_designator(base)?;
                let offset = match self.designator_type(base)? {
                    Type::Record { fields } => self
                        .tab
                        .lookup_local(fields, field)
                        .map(|s| s.offset)
                        .ok_or_else(|| anyhow!("unknown field '{field}' reached lowering"))?,
                    other => bail!("field access on non-record type {other:?} reached lowering"),
                };
                let off_reg = self.next_vreg();
                self.emit(
                    Op::LoadIConst,
                    vec![Operand::VReg(off_reg), Operand::IntLiteral(offset)],
                );
                let addr_reg = self.next_vreg();
                self.emit(
                    Op::IntAdd,
                    vec![
                        Operand::VReg(addr_reg),
                        Operand::VReg(base_reg),
                        Operand::VReg(off_reg),
                    ],
                );
                Ok(addr_reg)
            }
            other => bail!("expected a designator, found {other:?}"),
        }
    }

    /// Re-derive a designator's type from the symbol table (analysis has
    /// already validated the program, so failures here are internal).
    fn designator_type(&self, e: &Expr) -> Result<Type> {
        match e {
            Expr::VarRef { name, .. } => self
                .tab
                .lookup(self.scope, name)
                .map(|s| s.ty.clone())
                .ok_or_else(|| anyhow!("unresolved name '{name}' reached lowering")),
            Expr::Index { base, .. } => match self.designator_type(base)? {
                Type::Array { elem, .. } => Ok(*elem),
                other => bail!("subscript of non-array type {other:?} reached lowering"),
            },
            Expr::Field { base, field, .. } => match self.designator_type(base)? {
                Type::Record { fields } => self
                    .tab
                    .lookup_local(fields, field)
                    .map(|s| s.ty.clone())
                    .ok_or_else(|| anyhow!("unknown field '{field}' reached lowering")),
                other => bail!("field access on non-record type {other:?} reached lowering"),
            },
            other => bail!("expected a designator, found {other:?}"),
        }
    }
}

fn jump_opcode(op: RelOp, invert: bool) -> Op {
    match (op, invert) {
        (RelOp::Eq, false) => Op::Je,
        (RelOp::Eq, true) => Op::Jne,
        (RelOp::Ne, false) => Op::Jne,
        (RelOp::Ne, true) => Op::Je,
        (RelOp::Lt, false) => Op::Jlt,
        (RelOp::Lt, true) => Op::Jgte,
        (RelOp::Le, false) => Op::Jlte,
        (RelOp::Le, true) => Op::Jgt,
        (RelOp::Gt, false) => Op::Jgt,
        (RelOp::Gt, true) => Op::Jlte,
        (RelOp::Ge, false) => Op::Jgte,
        (RelOp::Ge, true) => Op::Jlt,
    }
}

//! HIR -> x86-64 lowering.
//!
//! The frame is flat: declared storage at [0, local_size) from %rsp, then
//! one 8-byte slot per virtual register. No value stays in a machine
//! register across instructions; %r10/%r11 are the scratch pair, %rax/%rdx
//! serve idivq, and %rdi/%rsi carry the printf/scanf arguments.

use std::fmt;
use std::fmt::Write as _;

use anyhow::{bail, Result};
use hir::{
    HighLevelOpcode as Hl, HirProgram, Instruction, InstructionSequence, MachineReg as R, Operand,
};

const WORD_SIZE: i64 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineOpcode {
    Movq,
    Leaq,
    Addq,
    Subq,
    Imulq,
    Idivq,
    Cqto,
    Cmpq,
    Jmp,
    Je,
    Jne,
    Jl,
    Jle,
    Jg,
    Jge,
    Call,
    Nop,
}

impl fmt::Display for MachineOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use MachineOpcode::*;
        let name = match self {
            Movq => "movq",
            Leaq => "leaq",
            Addq => "addq",
            Subq => "subq",
            Imulq => "imulq",
            Idivq => "idivq",
            Cqto => "cqto",
            Cmpq => "cmpq",
            Jmp => "jmp",
            Je => "je",
            Jne => "jne",
            Jl => "jl",
            Jle => "jle",
            Jg => "jg",
            Jge => "jge",
            Call => "call",
            Nop => "nop",
        };
        f.write_str(name)
    }
}

/// Translate a lowered program into GNU assembler text for x86-64 Linux.
pub fn emit_assembly(prog: &HirProgram) -> Result<String> {
    let mut gen = AsmGen::new(prog.storage_size, prog.vreg_count);
    gen.translate(&prog.code)?;
    Ok(gen.finish())
}

struct AsmGen {
    asm: InstructionSequence<MachineOpcode>,
    local_size: i64,
    vreg_count: i64,
    total_size: i64,
}

impl AsmGen {
    fn new(local_size: i64, vreg_count: i64) -> Self {
        let mut total_size = local_size + vreg_count * WORD_SIZE;
        // call sites require %rsp ≡ 8 (mod 16) on entry to the callee
        if total_size % 16 == 0 {
            total_size += 8;
        }
        Self {
            asm: InstructionSequence::new(),
            local_size,
            vreg_count,
            total_size,
        }
    }

    /// Stack slot of a vreg operand: local_size + 8*N from %rsp.
    fn vreg_slot(&self, op: &Operand) -> Operand {
        match op.base_vreg() {
            Some(n) => Operand::MRegMemOff(R::Rsp, self.local_size + n * WORD_SIZE),
            None => unreachable!("expected a vreg operand, got {op:?}"),
        }
    }

    /// Immediates pass through; vreg operands address their slot.
    fn value_operand(&self, op: &Operand) -> Operand {
        match op {
            Operand::IntLiteral(_) => op.clone(),
            _ => self.vreg_slot(op),
        }
    }

    fn push(&mut self, opcode: MachineOpcode, operands: Vec<Operand>) {
        self.asm.add_instruction(Instruction::new(opcode, operands));
    }

    fn push_commented(&mut self, opcode: MachineOpcode, operands: Vec<Operand>, comment: &str) {
        self.asm
            .add_instruction(Instruction::new(opcode, operands).with_comment(comment.to_string()));
    }

    fn translate(&mut self, hins: &InstructionSequence<Hl>) -> Result<()> {
        use MachineOpcode as M;

        let r10 = Operand::MReg(R::R10);
        let r11 = Operand::MReg(R::R11);
        let rax = Operand::MReg(R::Rax);
        let rdx = Operand::MReg(R::Rdx);
        let rdi = Operand::MReg(R::Rdi);
        let rsi = Operand::MReg(R::Rsi);
        let read_fmt = Operand::ImmLabel("s_readint_fmt".to_string());
        let write_fmt = Operand::ImmLabel("s_writeint_fmt".to_string());

        for i in 0..hins.len() {
            let hin = hins.get(i);
            if let Some(label) = hins.label_at(i) {
                self.asm.define_label(label.to_string());
            }
            // the HIR text rides along as a comment on the first
            // machine instruction of each lowered op
            let comment = hin.to_string();

            match hin.opcode() {
                Hl::LocalAddr => {
                    let offset = match hin.operand(1) {
                        Operand::IntLiteral(v) => *v,
                        other => bail!("localaddr with non-literal offset {other:?}"),
                    };
                    let dest = self.vreg_slot(hin.operand(0));
                    self.push_commented(
                        M::Leaq,
                        vec![Operand::MRegMemOff(R::Rsp, offset), r10.clone()],
                        &comment,
                    );
                    self.push(M::Movq, vec![r10.clone(), dest]);
                }
                Hl::LoadIConst => {
                    let imm = self.value_operand(hin.operand(1));
                    let dest = self.vreg_slot(hin.operand(0));
                    // via a register so 64-bit immediates are legal
                    self.push_commented(M::Movq, vec![imm, r10.clone()], &comment);
                    self.push(M::Movq, vec![r10.clone(), dest]);
                }
                Hl::LoadInt => {
                    let src = hin.operand(1);
                    if !matches!(src, Operand::VRegMem(_)) {
                        bail!("ldi with non-memref source {src:?}");
                    }
                    let src_slot = self.vreg_slot(src);
                    let dest = self.vreg_slot(hin.operand(0));
                    self.push_commented(M::Movq, vec![src_slot, r11.clone()], &comment);
                    self.push(M::Movq, vec![r11.to_memref(), r11.clone()]);
                    self.push(M::Movq, vec![r11.clone(), dest]);
                }
                Hl::StoreInt => {
                    let src_slot = self.vreg_slot(hin.operand(1));
                    let dest_slot = self.vreg_slot(hin.operand(0));
                    self.push_commented(M::Movq, vec![src_slot, r11.clone()], &comment);
                    self.push(M::Movq, vec![dest_slot, r10.clone()]);
                    self.push(M::Movq, vec![r11.clone(), r10.to_memref()]);
                }
                Hl::IntAdd => {
                    let a = self.vreg_slot(hin.operand(1));
                    let b = self.vreg_slot(hin.operand(2));
                    let dest = self.vreg_slot(hin.operand(0));
                    self.push_commented(M::Movq, vec![a, r11.clone()], &comment);
                    self.push(M::Movq, vec![b, r10.clone()]);
                    self.push(M::Addq, vec![r11.clone(), r10.clone()]);
                    self.push(M::Movq, vec![r10.clone(), dest]);
                }
                Hl::IntSub => {
                    // subq %r11, %r10 leaves a - b in %r10
                    let a = self.vreg_slot(hin.operand(1));
                    let b = self.vreg_slot(hin.operand(2));
                    let dest = self.vreg_slot(hin.operand(0));
                    self.push_commented(M::Movq, vec![a, r10.clone()], &comment);
                    self.push(M::Movq, vec![b, r11.clone()]);
                    self.push(M::Subq, vec![r11.clone(), r10.clone()]);
                    self.push(M::Movq, vec![r10.clone(), dest]);
                }
                Hl::IntMul => {
                    // either argument may be an immediate (element sizes) or
                    // a memref (array indices), dereferenced on the fly
                    let a = hin.operand(1).clone();
                    let b = hin.operand(2).clone();
                    let dest = self.vreg_slot(hin.operand(0));
                    let a_src = self.value_operand(&a);
                    self.push_commented(M::Movq, vec![a_src, r11.clone()], &comment);
                    if a.is_memref() {
                        self.push(M::Movq, vec![r11.to_memref(), r11.clone()]);
                    }
                    let b_src = self.value_operand(&b);
                    self.push(M::Movq, vec![b_src, r10.clone()]);
                    if b.is_memref() {
                        self.push(M::Movq, vec![r10.to_memref(), r10.clone()]);
                    }
                    self.push(M::Imulq, vec![r11.clone(), r10.clone()]);
                    self.push(M::Movq, vec![r10.clone(), dest]);
                }
                Hl::IntDiv | Hl::IntMod => {
                    let a = self.vreg_slot(hin.operand(1));
                    let b = self.vreg_slot(hin.operand(2));
                    let dest = self.vreg_slot(hin.operand(0));
                    self.push_commented(M::Movq, vec![a, rax.clone()], &comment);
                    self.push(M::Cqto, vec![]);
                    self.push(M::Movq, vec![b, r10.clone()]);
                    self.push(M::Idivq, vec![r10.clone()]);
                    let result = if *hin.opcode() == Hl::IntDiv {
                        rax.clone()
                    } else {
                        rdx.clone()
                    };
                    self.push(M::Movq, vec![result, dest]);
                }
                Hl::IntCompare => {
                    let a = self.value_operand(hin.operand(0));
                    let b = self.value_operand(hin.operand(1));
                    self.push_commented(M::Movq, vec![a, r10.clone()], &comment);
                    self.push(M::Movq, vec![b, r11.clone()]);
                    // cmpq %r11, %r10 makes the jumps read as a-vs-b
                    self.push(M::Cmpq, vec![r11.clone(), r10.clone()]);
                }
                Hl::Jump | Hl::Je | Hl::Jne | Hl::Jlt | Hl::Jlte | Hl::Jgt | Hl::Jgte => {
                    let m = match hin.opcode() {
                        Hl::Jump => M::Jmp,
                        Hl::Je => M::Je,
                        Hl::Jne => M::Jne,
                        Hl::Jlt => M::Jl,
                        Hl::Jlte => M::Jle,
                        Hl::Jgt => M::Jg,
                        _ => M::Jge,
                    };
                    self.push_commented(m, vec![hin.operand(0).clone()], &comment);
                }
                Hl::ReadInt => {
                    let slot = self.vreg_slot(hin.operand(0));
                    self.push_commented(M::Movq, vec![read_fmt.clone(), rdi.clone()], &comment);
                    self.push(M::Leaq, vec![slot, rsi.clone()]);
                    self.push(M::Call, vec![Operand::Label("scanf".to_string())]);
                }
                Hl::WriteInt => {
                    let slot = self.vreg_slot(hin.operand(0));
                    self.push_commented(M::Movq, vec![write_fmt.clone(), rdi.clone()], &comment);
                    self.push(M::Movq, vec![slot, rsi.clone()]);
                    self.push(M::Call, vec![Operand::Label("printf".to_string())]);
                }
                Hl::Nop => {
                    self.push_commented(M::Nop, vec![], &comment);
                }
            }
        }

        if let Some(label) = hins.end_label() {
            self.asm.define_label(label.to_string());
        }
        Ok(())
    }

    fn finish(self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "/* {} vregs used */", self.vreg_count);
        let _ = writeln!(out, "\t.section .rodata");
        let _ = writeln!(out, "s_readint_fmt: .string \"%ld\"");
        let _ = writeln!(out, "s_writeint_fmt: .string \"%ld\\n\"");
        let _ = writeln!(out, "\t.section .text");
        let _ = writeln!(out, "\t.globl main");
        let _ = writeln!(out, "main:");
        let _ = writeln!(out, "\tsubq ${}, %rsp", self.total_size);
        let _ = write!(out, "{}", self.asm);
        let _ = writeln!(out, "\taddq ${}, %rsp", self.total_size);
        let _ = writeln!(out, "\tmovl $0, %eax");
        let _ = writeln!(out, "\tret");
        out
    }
}

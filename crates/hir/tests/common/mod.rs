//! Shared test harness: compile source to HIR and execute it with a small
//! reference interpreter (frame bytes + vreg file), so end-to-end behavior
//! can be checked without assembling the backend's output.

use std::collections::HashMap;

use hir::{HighLevelOpcode as Op, HirProgram, Operand};

pub fn compile(src: &str) -> HirProgram {
    let program = parse::parse_program("test", src).expect("parse ok");
    let tab = sema::analyze("test", &program).expect("analyze ok");
    hir::generate(&tab, &program).expect("hir ok")
}

fn read8(frame: &[u8], addr: i64) -> i64 {
    let a = addr as usize;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&frame[a..a + 8]);
    i64::from_le_bytes(bytes)
}

fn write8(frame: &mut [u8], addr: i64, value: i64) {
    let a = addr as usize;
    frame[a..a + 8].copy_from_slice(&value.to_le_bytes());
}

fn vreg_of(op: &Operand) -> usize {
    match op {
        Operand::VReg(n) | Operand::VRegMem(n) => *n as usize,
        other => panic!("expected vreg operand, got {other:?}"),
    }
}

/// Execute the HIR program; READ pops from `input`, WRITE pushes to the
/// returned vector.
pub fn run(prog: &HirProgram, input: &[i64]) -> Vec<i64> {
    let code = &prog.code;

    let mut targets: HashMap<String, usize> = HashMap::new();
    for i in 0..code.len() {
        if let Some(l) = code.label_at(i) {
            targets.insert(l.to_string(), i);
        }
    }
    if let Some(l) = code.end_label() {
        targets.insert(l.to_string(), code.len());
    }

    // declared storage followed by the vreg slots, like the real frame
    let frame_len = (prog.storage_size + 8 * prog.vreg_count + 8) as usize;
    let mut frame = vec![0u8; frame_len];
    let mut vregs = vec![0i64; prog.vreg_count.max(1) as usize];
    let mut input = input.iter().copied();
    let mut output = Vec::new();
    // operands of the last cmpi, consulted by conditional jumps
    let mut flags = (0i64, 0i64);

    let value = |op: &Operand, vregs: &[i64], frame: &[u8]| -> i64 {
        match op {
            Operand::VReg(n) => vregs[*n as usize],
            Operand::VRegMem(n) => read8(frame, vregs[*n as usize]),
            Operand::IntLiteral(v) => *v,
            other => panic!("expected value operand, got {other:?}"),
        }
    };
    let target = |op: &Operand| -> usize {
        match op {
            Operand::Label(l) => *targets.get(l).unwrap_or_else(|| panic!("undefined label {l}")),
            other => panic!("expected label operand, got {other:?}"),
        }
    };

    let mut pc = 0usize;
    while pc < code.len() {
        let ins = code.get(pc);
        pc += 1;
        match ins.opcode() {
            Op::LocalAddr => {
                // addresses are offsets from the frame base
                let d = vreg_of(ins.operand(0));
                vregs[d] = value(ins.operand(1), &vregs, &frame);
            }
            Op::LoadIConst => {
                let d = vreg_of(ins.operand(0));
                vregs[d] = value(ins.operand(1), &vregs, &frame);
            }
            Op::LoadInt => {
                let d = vreg_of(ins.operand(0));
                vregs[d] = value(ins.operand(1), &vregs, &frame);
            }
            Op::StoreInt => {
                let addr = vregs[vreg_of(ins.operand(0))];
                let v = value(ins.operand(1), &vregs, &frame);
                write8(&mut frame, addr, v);
            }
            Op::IntAdd | Op::IntSub | Op::IntMul | Op::IntDiv | Op::IntMod => {
                let d = vreg_of(ins.operand(0));
                let a = value(ins.operand(1), &vregs, &frame);
                let b = value(ins.operand(2), &vregs, &frame);
                vregs[d] = match ins.opcode() {
                    Op::IntAdd => a.wrapping_add(b),
                    Op::IntSub => a.wrapping_sub(b),
                    Op::IntMul => a.wrapping_mul(b),
                    Op::IntDiv => a / b,
                    _ => a % b,
                };
            }
            Op::IntCompare => {
                let a = value(ins.operand(0), &vregs, &frame);
                let b = value(ins.operand(1), &vregs, &frame);
                flags = (a, b);
            }
            Op::Jump => pc = target(ins.operand(0)),
            Op::Je => {
                if flags.0 == flags.1 {
                    pc = target(ins.operand(0));
                }
            }
            Op::Jne => {
                if flags.0 != flags.1 {
                    pc = target(ins.operand(0));
                }
            }
            Op::Jlt => {
                if flags.0 < flags.1 {
                    pc = target(ins.operand(0));
                }
            }
            Op::Jlte => {
                if flags.0 <= flags.1 {
                    pc = target(ins.operand(0));
                }
            }
            Op::Jgt => {
                if flags.0 > flags.1 {
                    pc = target(ins.operand(0));
                }
            }
            Op::Jgte => {
                if flags.0 >= flags.1 {
                    pc = target(ins.operand(0));
                }
            }
            Op::ReadInt => {
                let d = vreg_of(ins.operand(0));
                vregs[d] = input.next().expect("interpreter ran out of input");
            }
            Op::WriteInt => {
                output.push(value(ins.operand(0), &vregs, &frame));
            }
            Op::Nop => {}
        }
    }
    output
}

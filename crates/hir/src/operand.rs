use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineReg {
    Rsp,
    Rdi,
    Rsi,
    Rax,
    Rdx,
    R10,
    R11,
}

impl fmt::Display for MachineReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineReg::Rsp => "%rsp",
            MachineReg::Rdi => "%rdi",
            MachineReg::Rsi => "%rsi",
            MachineReg::Rax => "%rax",
            MachineReg::Rdx => "%rdx",
            MachineReg::R10 => "%r10",
            MachineReg::R11 => "%r11",
        };
        f.write_str(name)
    }
}

/// One operand of a high-level or machine instruction. HIR uses the first
/// four variants; the backend uses the rest (plus `IntLiteral` for
/// immediates and `ImmLabel` for format-string addresses).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Virtual register, e.g. `vr3`.
    VReg(i64),
    /// Memory at the address held in a virtual register, e.g. `(vr3)`.
    VRegMem(i64),
    /// Immediate integer, e.g. `$8`.
    IntLiteral(i64),
    /// Jump target / definition label, e.g. `.L0`.
    Label(String),
    /// Address-of-label immediate, e.g. `$s_writeint_fmt`.
    ImmLabel(String),
    MReg(MachineReg),
    /// `(%r10)`
    MRegMem(MachineReg),
    /// `16(%rsp)`
    MRegMemOff(MachineReg, i64),
}

impl Operand {
    pub fn base_vreg(&self) -> Option<i64> {
        match self {
            Operand::VReg(n) | Operand::VRegMem(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_memref(&self) -> bool {
        matches!(
            self,
            Operand::VRegMem(_) | Operand::MRegMem(_) | Operand::MRegMemOff(..)
        )
    }

    /// Turn a register operand into a memory reference through it.
    pub fn to_memref(&self) -> Operand {
        match self {
            Operand::VReg(n) => Operand::VRegMem(*n),
            Operand::MReg(r) => Operand::MRegMem(*r),
            other => unreachable!("to_memref on non-register operand {other:?}"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::VReg(n) => write!(f, "vr{n}"),
            Operand::VRegMem(n) => write!(f, "(vr{n})"),
            Operand::IntLiteral(v) => write!(f, "${v}"),
            Operand::Label(l) => f.write_str(l),
            Operand::ImmLabel(l) => write!(f, "${l}"),
            Operand::MReg(r) => write!(f, "{r}"),
            Operand::MRegMem(r) => write!(f, "({r})"),
            Operand::MRegMemOff(r, off) => write!(f, "{off}({r})"),
        }
    }
}

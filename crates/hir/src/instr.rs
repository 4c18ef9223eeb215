use std::collections::HashMap;
use std::fmt;

use crate::operand::Operand;

/// Three-address opcodes over virtual registers. Mnemonics follow the `-h`
/// print format (`ldci`, `ldi`, `sti`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighLevelOpcode {
    LocalAddr,
    LoadIConst,
    LoadInt,
    StoreInt,
    IntAdd,
    IntSub,
    IntMul,
    IntDiv,
    IntMod,
    IntCompare,
    Jump,
    Je,
    Jne,
    Jlt,
    Jlte,
    Jgt,
    Jgte,
    ReadInt,
    WriteInt,
    Nop,
}

impl fmt::Display for HighLevelOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use HighLevelOpcode::*;
        let name = match self {
            LocalAddr => "localaddr",
            LoadIConst => "ldci",
            LoadInt => "ldi",
            StoreInt => "sti",
            IntAdd => "addi",
            IntSub => "subi",
            IntMul => "muli",
            IntDiv => "divi",
            IntMod => "modi",
            IntCompare => "cmpi",
            Jump => "jmp",
            Je => "je",
            Jne => "jne",
            Jlt => "jlt",
            Jlte => "jlte",
            Jgt => "jgt",
            Jgte => "jgte",
            ReadInt => "readi",
            WriteInt => "writei",
            Nop => "nop",
        };
        f.write_str(name)
    }
}

/// An instruction: opcode, 0-3 operands, optional trailing comment. Generic
/// over the opcode enum so the backend reuses the same type for machine
/// instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction<O> {
    opcode: O,
    operands: Vec<Operand>,
    comment: Option<String>,
}

impl<O> Instruction<O> {
    pub fn new(opcode: O, operands: Vec<Operand>) -> Self {
        debug_assert!(operands.len() <= 3);
        Self {
            opcode,
            operands,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: String) -> Self {
        self.comment = Some(comment);
        self
    }

    pub fn opcode(&self) -> &O {
        &self.opcode
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn operand(&self, i: usize) -> &Operand {
        &self.operands[i]
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

impl<O: fmt::Display> fmt::Display for Instruction<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for (i, op) in self.operands.iter().enumerate() {
            if i == 0 {
                write!(f, " {op}")?;
            } else {
                write!(f, ", {op}")?;
            }
        }
        Ok(())
    }
}

/// Ordered instruction list with labels attached *before* instructions.
/// A label defined with no following instruction becomes the end label.
#[derive(Debug)]
pub struct InstructionSequence<O> {
    instructions: Vec<Instruction<O>>,
    labels: HashMap<usize, String>,
    pending_label: Option<String>,
}

impl<O> InstructionSequence<O> {
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            labels: HashMap::new(),
            pending_label: None,
        }
    }

    pub fn add_instruction(&mut self, ins: Instruction<O>) {
        if let Some(label) = self.pending_label.take() {
            self.labels.insert(self.instructions.len(), label);
        }
        self.instructions.push(ins);
    }

    /// Attach `label` to the next instruction added. At most one label may
    /// be pending; generators that can define two labels back to back must
    /// pad with a no-op first.
    pub fn define_label(&mut self, label: String) {
        assert!(
            self.pending_label.is_none(),
            "label '{label}' defined while another label is pending"
        );
        self.pending_label = Some(label);
    }

    pub fn has_pending_label(&self) -> bool {
        self.pending_label.is_some()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, i: usize) -> &Instruction<O> {
        &self.instructions[i]
    }

    pub fn label_at(&self, i: usize) -> Option<&str> {
        self.labels.get(&i).map(|s| s.as_str())
    }

    /// Label left pending after the last instruction, if any.
    pub fn end_label(&self) -> Option<&str> {
        self.pending_label.as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction<O>> {
        self.instructions.iter()
    }
}

impl<O> Default for InstructionSequence<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: fmt::Display> fmt::Display for InstructionSequence<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ins) in self.instructions.iter().enumerate() {
            if let Some(label) = self.label_at(i) {
                writeln!(f, "{label}:")?;
            }
            match ins.comment() {
                Some(c) => writeln!(f, "\t{ins} /* {c} */")?,
                None => writeln!(f, "\t{ins}")?,
            }
        }
        if let Some(label) = self.end_label() {
            writeln!(f, "{label}:")?;
        }
        Ok(())
    }
}

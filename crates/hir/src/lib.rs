mod gen;
mod instr;
mod operand;

pub use gen::{generate, HirProgram};
pub use instr::{HighLevelOpcode, Instruction, InstructionSequence};
pub use operand::{MachineReg, Operand};

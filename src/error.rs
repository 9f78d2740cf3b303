//! Execute-time errors.

use crate::alu::AluZeroDivisionError;
use crate::memory::MemoryError;
use crate::register::RegisterError;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum VmError {
    #[error(transparent)]
    Register(#[from] RegisterError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Alu(#[from] AluZeroDivisionError),
    #[error("operand is not a valid write target")]
    NotWritable,
    #[error("instruction pointer {0} is out of range")]
    BadJumpTarget(i32),
}

//! The VM half of the toolchain: word arithmetic, the ALU, the register
//! file, memory, character I/O, the instruction controller and the
//! `Computer` that drives them as a lazy stream of execution snapshots.
//!
//! The translator (`asmc`) builds a [`Program`] from source text; this
//! crate only ever consumes one.

pub mod alu;
pub mod arithmetic;
pub mod clock;
pub mod computer;
pub mod constants;
pub mod controller;
pub mod error;
pub mod io;
pub mod memory;
pub mod program;
pub mod register;

/// A machine word: a signed 32-bit integer.
pub type Word = i32;

pub use alu::{Alu, BinOp, Flags};
pub use clock::Clock;
pub use computer::{Computer, MachineConfig, Snapshot, TraceMode};
pub use error::VmError;
pub use io::IoController;
pub use memory::{Memory, MemoryError};
pub use program::{DataSection, Instruction, Mnemonic, Operand, Program, TextSection};
pub use register::{RegisterError, RegisterFile, RegisterId};

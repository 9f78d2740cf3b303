//! The register file: six general-purpose registers plus the privileged
//! instruction pointer.

use crate::Word;
use thiserror::Error;
use util::EnumFromStr;
use util_derive::EnumFromStr;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumFromStr)]
pub enum RegisterId {
    RAX,
    RBX,
    RDX,
    RSX,
    RSI,
    RDI,
    RIP,
}

impl RegisterId {
    pub const ALL: [RegisterId; crate::constants::REGISTER_COUNT] = [
        RegisterId::RAX,
        RegisterId::RBX,
        RegisterId::RDX,
        RegisterId::RSX,
        RegisterId::RSI,
        RegisterId::RDI,
        RegisterId::RIP,
    ];

    /// Parse a register name, matching on the upper-cased token.
    pub fn parse(token: &str) -> Result<Self, util::ParseEnumError> {
        <RegisterId as EnumFromStr>::from_str(&token.to_uppercase())
    }

    /// Stable index into [`RegisterId::ALL`], used by `asm-image` to
    /// encode registers as a single byte.
    pub fn index(self) -> usize {
        match self {
            RegisterId::RAX => 0,
            RegisterId::RBX => 1,
            RegisterId::RDX => 2,
            RegisterId::RSX => 3,
            RegisterId::RSI => 4,
            RegisterId::RDI => 5,
            RegisterId::RIP => 6,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        RegisterId::ALL.get(index).copied()
    }

    fn is_writable(self) -> bool {
        !matches!(self, RegisterId::RIP)
    }
}

#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum RegisterError {
    #[error("register {0:?} is not writable")]
    NotWritable(RegisterId),
}

#[derive(Clone, Debug, Default)]
pub struct RegisterFile {
    slots: [Word; crate::constants::REGISTER_COUNT],
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile::default()
    }

    /// Every register (including `RIP`) is externally readable.
    pub fn get(&self, id: RegisterId) -> Result<Word, RegisterError> {
        Ok(self.slots[id.index()])
    }

    /// `RIP` cannot be written to through the general interface; jumps go
    /// through [`RegisterFile::set_ip`].
    pub fn set(&mut self, id: RegisterId, value: Word) -> Result<(), RegisterError> {
        if !id.is_writable() {
            return Err(RegisterError::NotWritable(id));
        }
        self.slots[id.index()] = value;
        Ok(())
    }

    pub fn ip(&self) -> Word {
        self.slots[RegisterId::RIP.index()]
    }

    pub fn set_ip(&mut self, value: Word) {
        self.slots[RegisterId::RIP.index()] = value;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use matches::assert_matches;

    #[test]
    fn general_registers_round_trip() {
        let mut regs = RegisterFile::new();
        regs.set(RegisterId::RAX, 42).unwrap();
        assert_eq!(regs.get(RegisterId::RAX).unwrap(), 42);
    }

    #[test]
    fn rip_is_read_only_through_the_general_interface() {
        let mut regs = RegisterFile::new();
        assert_matches!(
            regs.set(RegisterId::RIP, 1),
            Err(RegisterError::NotWritable(RegisterId::RIP))
        );
        regs.set_ip(7);
        assert_eq!(regs.ip(), 7);
        assert_eq!(regs.get(RegisterId::RIP).unwrap(), 7);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(RegisterId::parse("rax").unwrap(), RegisterId::RAX);
        assert_eq!(RegisterId::parse("RaX").unwrap(), RegisterId::RAX);
        assert!(RegisterId::parse("nope").is_err());
    }
}

//! Dispatches a single resolved [`Instruction`] against the register file,
//! memory and ALU. One tick is spent per operand access and per ALU
//! application; the caller (the [`Computer`](crate::computer::Computer)
//! fetch/execute loop) adds the per-instruction completion tick and bumps
//! the instruction counter.

use crate::alu::{Alu, BinOp};
use crate::clock::Clock;
use crate::error::VmError;
use crate::io::IoController;
use crate::memory::Memory;
use crate::program::{Instruction, Mnemonic, Operand};
use crate::register::RegisterFile;
use crate::Word;
use std::io::{BufRead, Write};

/// What the fetch/execute loop should do once an instruction has run.
pub enum ControlFlow {
    Continue,
    Exit,
}

struct Ctx<'a, R, W, E> {
    regs: &'a mut RegisterFile,
    mem: &'a mut Memory,
    io: &'a mut IoController<R, W, E>,
    clock: &'a mut Clock,
}

impl<'a, R: BufRead, W: Write, E: Write> Ctx<'a, R, W, E> {
    fn read(&mut self, operand: &Operand) -> Result<Word, VmError> {
        self.clock.tick();
        let value = match operand {
            Operand::Constant(c) => *c,
            Operand::Register(id) => self.regs.get(*id)?,
            Operand::Direct(addr) => self.mem.get(*addr, self.io)?,
            Operand::Indirect(addr, offset) => {
                let off = self.read(offset)?;
                let index = (*addr as i64 + off as i64) as usize;
                self.mem.get(index, self.io)?
            }
            Operand::Label(idx) => *idx as Word,
        };
        Ok(value)
    }

    fn write(&mut self, operand: &Operand, value: Word) -> Result<(), VmError> {
        self.clock.tick();
        match operand {
            Operand::Register(id) => self.regs.set(*id, value)?,
            Operand::Direct(addr) => self.mem.set(*addr, value, self.io)?,
            Operand::Indirect(addr, offset) => {
                let off = self.read(offset)?;
                let index = (*addr as i64 + off as i64) as usize;
                self.mem.set(index, value, self.io)?;
            }
            Operand::Constant(_) | Operand::Label(_) => return Err(VmError::NotWritable),
        }
        Ok(())
    }
}

fn to_binop(mnemonic: Mnemonic) -> BinOp {
    match mnemonic {
        Mnemonic::ADD => BinOp::Add,
        Mnemonic::SUB => BinOp::Sub,
        Mnemonic::MUL => BinOp::Mul,
        Mnemonic::DIV => BinOp::Div,
        Mnemonic::MOD => BinOp::Mod,
        Mnemonic::AND => BinOp::And,
        Mnemonic::OR => BinOp::Or,
        Mnemonic::XOR => BinOp::Xor,
        _ => unreachable!("not a reducing mnemonic"),
    }
}

fn jump_target(operand: &Operand) -> Result<usize, VmError> {
    match operand {
        Operand::Label(idx) => Ok(*idx),
        _ => Err(VmError::BadJumpTarget(-1)),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn execute<R: BufRead, W: Write, E: Write>(
    instr: &Instruction,
    regs: &mut RegisterFile,
    mem: &mut Memory,
    alu: &mut Alu,
    io: &mut IoController<R, W, E>,
    clock: &mut Clock,
) -> Result<ControlFlow, VmError> {
    let mut ctx = Ctx {
        regs,
        mem,
        io,
        clock,
    };
    let ops = &instr.operands;

    match instr.mnemonic {
        Mnemonic::MOV | Mnemonic::LD => {
            let v = ctx.read(&ops[1])?;
            ctx.write(&ops[0], v)?;
        }
        Mnemonic::ADD
        | Mnemonic::SUB
        | Mnemonic::MUL
        | Mnemonic::DIV
        | Mnemonic::MOD
        | Mnemonic::AND
        | Mnemonic::OR
        | Mnemonic::XOR => {
            let a = ctx.read(&ops[0])?;
            let b = ctx.read(&ops[1])?;
            let r = alu.apply(to_binop(instr.mnemonic), a, b)?;
            ctx.clock.tick();
            ctx.write(&ops[0], r)?;
        }
        Mnemonic::INC => {
            let v = ctx.read(&ops[0])?;
            ctx.write(&ops[0], v.wrapping_add(1))?;
        }
        Mnemonic::DEC => {
            let v = ctx.read(&ops[0])?;
            ctx.write(&ops[0], v.wrapping_sub(1))?;
        }
        Mnemonic::CMP => {
            let a = ctx.read(&ops[0])?;
            let b = ctx.read(&ops[1])?;
            alu.apply(BinOp::Sub, a, b)?;
            ctx.clock.tick();
        }
        Mnemonic::JMP => {
            let target = jump_target(&ops[0])?;
            ctx.regs.set_ip(target as i32 - 1);
        }
        Mnemonic::JE | Mnemonic::JNE | Mnemonic::JL | Mnemonic::JG | Mnemonic::JLE | Mnemonic::JGE => {
            ctx.clock.tick();
            let take = match instr.mnemonic {
                Mnemonic::JE => alu.flags.z,
                Mnemonic::JNE => !alu.flags.z,
                Mnemonic::JL => alu.flags.n,
                Mnemonic::JG => !alu.flags.n,
                Mnemonic::JLE => alu.flags.z || alu.flags.n,
                Mnemonic::JGE => alu.flags.z || !alu.flags.n,
                _ => unreachable!(),
            };
            if take {
                let target = jump_target(&ops[0])?;
                ctx.regs.set_ip(target as i32 - 1);
            }
        }
        Mnemonic::PUTC => {
            let v = ctx.read(&ops[0])?;
            ctx.io.putc(v);
        }
        Mnemonic::PUTN => {
            let v = ctx.read(&ops[0])?;
            ctx.io.putn(v);
        }
        Mnemonic::GETC => {
            let v = ctx.io.getc();
            ctx.write(&ops[0], v)?;
        }
        Mnemonic::GETN => {
            let v = ctx.io.getn();
            ctx.write(&ops[0], v)?;
        }
        Mnemonic::HLT => return Ok(ControlFlow::Exit),
    }

    Ok(ControlFlow::Continue)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::register::RegisterId;

    fn io() -> IoController<&'static [u8], Vec<u8>, Vec<u8>> {
        IoController::new(b"", Vec::new(), Vec::new())
    }

    #[test]
    fn mov_copies_a_constant_into_a_register() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new(4);
        let mut alu = Alu::new();
        let mut io = io();
        let mut clock = Clock::new();

        let instr = Instruction {
            mnemonic: Mnemonic::MOV,
            operands: vec![
                Operand::Register(RegisterId::RAX),
                Operand::Constant(7),
            ],
        };
        execute(&instr, &mut regs, &mut mem, &mut alu, &mut io, &mut clock).unwrap();
        assert_eq!(regs.get(RegisterId::RAX).unwrap(), 7);
        assert!(clock.ticks() > 0);
    }

    #[test]
    fn inc_does_not_touch_the_alu_flags() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new(4);
        let mut alu = Alu::new();
        let mut io = io();
        let mut clock = Clock::new();

        alu.apply(BinOp::Sub, 3, 4).unwrap();
        let flags_before = alu.flags;

        let instr = Instruction {
            mnemonic: Mnemonic::INC,
            operands: vec![Operand::Register(RegisterId::RAX)],
        };
        execute(&instr, &mut regs, &mut mem, &mut alu, &mut io, &mut clock).unwrap();
        assert_eq!(regs.get(RegisterId::RAX).unwrap(), 1);
        assert_eq!(alu.flags, flags_before);
    }

    #[test]
    fn jmp_sets_ip_to_target_minus_one() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new(4);
        let mut alu = Alu::new();
        let mut io = io();
        let mut clock = Clock::new();

        let instr = Instruction {
            mnemonic: Mnemonic::JMP,
            operands: vec![Operand::Label(5)],
        };
        execute(&instr, &mut regs, &mut mem, &mut alu, &mut io, &mut clock).unwrap();
        assert_eq!(regs.ip(), 4);
    }

    #[test]
    fn hlt_signals_exit() {
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new(4);
        let mut alu = Alu::new();
        let mut io = io();
        let mut clock = Clock::new();

        let instr = Instruction {
            mnemonic: Mnemonic::HLT,
            operands: vec![],
        };
        let outcome = execute(&instr, &mut regs, &mut mem, &mut alu, &mut io, &mut clock).unwrap();
        assert!(matches!(outcome, ControlFlow::Exit));
    }
}

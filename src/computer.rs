//! Owns every component and drives the fetch/execute loop as a lazy,
//! consumer-driven stream of snapshots.

use crate::alu::{Alu, Flags};
use crate::clock::Clock;
use crate::constants::MEMORY_SIZE;
use crate::controller::{self, ControlFlow};
use crate::error::VmError;
use crate::io::IoController;
use crate::memory::Memory;
use crate::program::Program;
use crate::register::RegisterFile;
use crate::Word;
use std::io::{self, BufRead, Write};

#[derive(Clone, Copy, Debug)]
pub struct MachineConfig {
    pub memory_size: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            memory_size: MEMORY_SIZE,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TraceMode {
    /// Only the final snapshot, once the program halts.
    No,
    /// A snapshot after every completed instruction.
    Inst,
    /// A snapshot after every completed instruction, annotated with the
    /// number of ticks that instruction itself consumed.
    Tick,
}

#[derive(Clone, Copy, Debug)]
pub struct Snapshot {
    pub registers: [Word; crate::constants::REGISTER_COUNT],
    pub flags: Flags,
    pub ticks: u64,
    pub insts: u64,
    pub ticks_this_step: u64,
}

pub struct Computer<R, W, E> {
    regs: RegisterFile,
    mem: Memory,
    alu: Alu,
    io: IoController<R, W, E>,
    clock: Clock,
}

impl Computer<io::BufReader<io::Stdin>, io::Stdout, io::Stderr> {
    pub fn stdio(config: MachineConfig) -> Self {
        Computer::new(config, IoController::stdio())
    }
}

impl<R: BufRead, W: Write, E: Write> Computer<R, W, E> {
    pub fn new(config: MachineConfig, io: IoController<R, W, E>) -> Self {
        Computer {
            regs: RegisterFile::new(),
            mem: Memory::new(config.memory_size),
            alu: Alu::new(),
            io,
            clock: Clock::new(),
        }
    }

    pub fn load(&mut self, program: &Program) -> Result<(), VmError> {
        self.mem.load(&program.data.memory)?;
        Ok(())
    }

    fn snapshot(&self, ticks_this_step: u64) -> Snapshot {
        let mut registers = [0; crate::constants::REGISTER_COUNT];
        for (i, r) in crate::register::RegisterId::ALL.iter().enumerate() {
            registers[i] = self.regs.get(*r).unwrap();
        }
        Snapshot {
            registers,
            flags: self.alu.flags,
            ticks: self.clock.ticks(),
            insts: self.clock.insts(),
            ticks_this_step,
        }
    }

    /// Run one instruction to completion (or report the halt).
    fn step(&mut self, program: &Program) -> Option<Result<u64, VmError>> {
        let ip = self.regs.ip();
        if ip < 0 || ip as usize >= program.text.instructions.len() {
            return None;
        }
        let before = self.clock.ticks();
        let instr = &program.text.instructions[ip as usize];
        let outcome = controller::execute(
            instr,
            &mut self.regs,
            &mut self.mem,
            &mut self.alu,
            &mut self.io,
            &mut self.clock,
        );
        match outcome {
            Ok(ControlFlow::Exit) => {
                self.clock.tick();
                self.clock.inst();
                None
            }
            Ok(ControlFlow::Continue) => {
                self.regs.set_ip(self.regs.ip() + 1);
                self.clock.tick();
                self.clock.inst();
                Some(Ok(self.clock.ticks() - before))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Run `program` to completion, yielding snapshots at the granularity
    /// requested by `mode`. The final snapshot (halt or error) is always
    /// produced, even under [`TraceMode::No`].
    pub fn execute<'a>(&'a mut self, program: &'a Program, mode: TraceMode) -> Execution<'a, R, W, E> {
        Execution {
            computer: self,
            program,
            mode,
            done: false,
        }
    }
}

pub struct Execution<'a, R, W, E> {
    computer: &'a mut Computer<R, W, E>,
    program: &'a Program,
    mode: TraceMode,
    done: bool,
}

impl<'a, R: BufRead, W: Write, E: Write> Iterator for Execution<'a, R, W, E> {
    type Item = Result<Snapshot, VmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.computer.step(self.program) {
                None => {
                    self.done = true;
                    return Some(Ok(self.computer.snapshot(0)));
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(ticks)) => {
                    if self.mode != TraceMode::No {
                        return Some(Ok(self.computer.snapshot(ticks)));
                    }
                    // TraceMode::No: keep looping silently until halt.
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::program::{DataSection, Instruction, Mnemonic, Operand, TextSection};
    use crate::register::RegisterId;

    fn io() -> IoController<&'static [u8], Vec<u8>, Vec<u8>> {
        IoController::new(b"", Vec::new(), Vec::new())
    }

    fn program(instructions: Vec<Instruction>) -> Program {
        Program {
            data: DataSection::default(),
            text: TextSection {
                labels: Default::default(),
                instructions,
            },
        }
    }

    #[test]
    fn halts_cleanly_on_hlt() {
        let mut computer = Computer::new(MachineConfig::default(), io());
        let program = program(vec![Instruction {
            mnemonic: Mnemonic::HLT,
            operands: vec![],
        }]);
        let snapshots: Vec<_> = computer.execute(&program, TraceMode::No).collect();
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].is_ok());
    }

    #[test]
    fn runs_off_the_end_of_the_program_as_an_implicit_halt() {
        let mut computer = Computer::new(MachineConfig::default(), io());
        let program = program(vec![Instruction {
            mnemonic: Mnemonic::MOV,
            operands: vec![Operand::Register(RegisterId::RAX), Operand::Constant(1)],
        }]);
        let snapshots: Vec<_> = computer.execute(&program, TraceMode::Inst).collect();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].as_ref().unwrap().registers[0], 1);
    }

    #[test]
    fn inst_mode_emits_one_snapshot_per_instruction() {
        let mut computer = Computer::new(MachineConfig::default(), io());
        let program = program(vec![
            Instruction {
                mnemonic: Mnemonic::MOV,
                operands: vec![Operand::Register(RegisterId::RAX), Operand::Constant(1)],
            },
            Instruction {
                mnemonic: Mnemonic::INC,
                operands: vec![Operand::Register(RegisterId::RAX)],
            },
            Instruction {
                mnemonic: Mnemonic::HLT,
                operands: vec![],
            },
        ]);
        let snapshots: Vec<_> = computer.execute(&program, TraceMode::Inst).collect();
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[1].as_ref().unwrap().registers[0], 2);
    }
}

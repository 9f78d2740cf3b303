//! The on-disk object-image envelope: manual little-endian binary framing
//! of a resolved [`Program`], so a translated image can be written once
//! and executed many times without re-running the translator.

use asmvm::{DataSection, Instruction, Mnemonic, Operand, Program, RegisterId, TextSection};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;
use util::Endian;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("unknown mnemonic tag {0:?}")]
    BadMnemonic(String),
    #[error("unknown register index {0}")]
    BadRegister(u8),
    #[error("unknown operand tag {0}")]
    BadOperandTag(u8),
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

const TAG_CONSTANT: u8 = 0;
const TAG_REGISTER: u8 = 1;
const TAG_DIRECT: u8 = 2;
const TAG_INDIRECT: u8 = 3;
const TAG_LABEL: u8 = 4;

pub fn write_program<W: Write>(w: &mut W, program: &Program) -> Result<(), ImageError> {
    write_data(w, &program.data)?;
    write_text(w, &program.text)?;
    Ok(())
}

pub fn read_program<R: Read>(r: &mut R) -> Result<Program, ImageError> {
    let data = read_data(r)?;
    let text = read_text(r)?;
    Ok(Program { data, text })
}

pub fn write_file<P: AsRef<Path>>(path: P, program: &Program) -> Result<(), ImageError> {
    let mut w = BufWriter::new(File::create(path)?);
    write_program(&mut w, program)?;
    w.flush()?;
    Ok(())
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Program, ImageError> {
    let mut r = BufReader::new(File::open(path)?);
    read_program(&mut r)
}

fn write_string<W: Write>(w: &mut W, s: &str) -> Result<(), ImageError> {
    w.write_u16::<Endian>(s.len() as u16)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn read_string<R: Read>(r: &mut R) -> Result<String, ImageError> {
    let len = r.read_u16::<Endian>()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}

fn write_data<W: Write>(w: &mut W, data: &DataSection) -> Result<(), ImageError> {
    w.write_u32::<Endian>(data.memory.len() as u32)?;
    for &word in &data.memory {
        w.write_i32::<Endian>(word)?;
    }
    w.write_u32::<Endian>(data.var_to_addr.len() as u32)?;
    for (name, addr) in &data.var_to_addr {
        write_string(w, name)?;
        w.write_u32::<Endian>(*addr as u32)?;
    }
    Ok(())
}

fn read_data<R: Read>(r: &mut R) -> Result<DataSection, ImageError> {
    let len = r.read_u32::<Endian>()? as usize;
    let mut memory = Vec::with_capacity(len);
    for _ in 0..len {
        memory.push(r.read_i32::<Endian>()?);
    }
    let var_count = r.read_u32::<Endian>()?;
    let mut var_to_addr = HashMap::new();
    for _ in 0..var_count {
        let name = read_string(r)?;
        let addr = r.read_u32::<Endian>()? as usize;
        var_to_addr.insert(name, addr);
    }
    Ok(DataSection { memory, var_to_addr })
}

fn write_text<W: Write>(w: &mut W, text: &TextSection) -> Result<(), ImageError> {
    w.write_u32::<Endian>(text.labels.len() as u32)?;
    for (name, idx) in &text.labels {
        write_string(w, name)?;
        w.write_u32::<Endian>(*idx as u32)?;
    }
    w.write_u32::<Endian>(text.instructions.len() as u32)?;
    for instr in &text.instructions {
        write_instruction(w, instr)?;
    }
    Ok(())
}

fn read_text<R: Read>(r: &mut R) -> Result<TextSection, ImageError> {
    let label_count = r.read_u32::<Endian>()?;
    let mut labels = HashMap::new();
    for _ in 0..label_count {
        let name = read_string(r)?;
        let idx = r.read_u32::<Endian>()? as usize;
        labels.insert(name, idx);
    }
    let instr_count = r.read_u32::<Endian>()?;
    let mut instructions = Vec::with_capacity(instr_count as usize);
    for _ in 0..instr_count {
        instructions.push(read_instruction(r)?);
    }
    Ok(TextSection { labels, instructions })
}

fn write_instruction<W: Write>(w: &mut W, instr: &Instruction) -> Result<(), ImageError> {
    write_string(w, &format!("{:?}", instr.mnemonic))?;
    w.write_u8(instr.operands.len() as u8)?;
    for op in &instr.operands {
        write_operand(w, op)?;
    }
    Ok(())
}

fn read_instruction<R: Read>(r: &mut R) -> Result<Instruction, ImageError> {
    let tag = read_string(r)?;
    let mnemonic = Mnemonic::parse(&tag).map_err(|_| ImageError::BadMnemonic(tag))?;
    let operand_count = r.read_u8()?;
    let mut operands = Vec::with_capacity(operand_count as usize);
    for _ in 0..operand_count {
        operands.push(read_operand(r)?);
    }
    Ok(Instruction { mnemonic, operands })
}

fn write_operand<W: Write>(w: &mut W, operand: &Operand) -> Result<(), ImageError> {
    match operand {
        Operand::Constant(v) => {
            w.write_u8(TAG_CONSTANT)?;
            w.write_i32::<Endian>(*v)?;
        }
        Operand::Register(id) => {
            w.write_u8(TAG_REGISTER)?;
            w.write_u8(id.index() as u8)?;
        }
        Operand::Direct(addr) => {
            w.write_u8(TAG_DIRECT)?;
            w.write_u32::<Endian>(*addr as u32)?;
        }
        Operand::Indirect(addr, offset) => {
            w.write_u8(TAG_INDIRECT)?;
            w.write_u32::<Endian>(*addr as u32)?;
            write_operand(w, offset)?;
        }
        Operand::Label(idx) => {
            w.write_u8(TAG_LABEL)?;
            w.write_u32::<Endian>(*idx as u32)?;
        }
    }
    Ok(())
}

fn read_operand<R: Read>(r: &mut R) -> Result<Operand, ImageError> {
    let tag = r.read_u8()?;
    let operand = match tag {
        TAG_CONSTANT => Operand::Constant(r.read_i32::<Endian>()?),
        TAG_REGISTER => {
            let idx = r.read_u8()?;
            Operand::Register(RegisterId::from_index(idx as usize).ok_or(ImageError::BadRegister(idx))?)
        }
        TAG_DIRECT => Operand::Direct(r.read_u32::<Endian>()? as usize),
        TAG_INDIRECT => {
            let addr = r.read_u32::<Endian>()? as usize;
            let offset = read_operand(r)?;
            Operand::Indirect(addr, Box::new(offset))
        }
        TAG_LABEL => Operand::Label(r.read_u32::<Endian>()? as usize),
        other => return Err(ImageError::BadOperandTag(other)),
    };
    Ok(operand)
}

#[cfg(test)]
mod test {
    use super::*;
    use asmvm::{DataSection, Instruction, Mnemonic, Operand, Program, RegisterId, TextSection};
    use std::collections::HashMap;

    #[test]
    fn program_round_trips_through_the_binary_envelope() {
        let mut var_to_addr = HashMap::new();
        var_to_addr.insert("STDIN".to_string(), 0);
        var_to_addr.insert("msg".to_string(), 3);

        let mut labels = HashMap::new();
        labels.insert("loop".to_string(), 1);

        let program = Program {
            data: DataSection {
                memory: vec![0, 1, 2, 'h' as i32, 'i' as i32],
                var_to_addr,
            },
            text: TextSection {
                labels,
                instructions: vec![
                    Instruction {
                        mnemonic: Mnemonic::MOV,
                        operands: vec![Operand::Register(RegisterId::RAX), Operand::Direct(3)],
                    },
                    Instruction {
                        mnemonic: Mnemonic::JMP,
                        operands: vec![Operand::Label(0)],
                    },
                    Instruction {
                        mnemonic: Mnemonic::ADD,
                        operands: vec![
                            Operand::Register(RegisterId::RAX),
                            Operand::Indirect(3, Box::new(Operand::Constant(1))),
                        ],
                    },
                ],
            },
        };

        let mut buf = Vec::new();
        write_program(&mut buf, &program).unwrap();
        let decoded = read_program(&mut &buf[..]).unwrap();
        assert_eq!(decoded, program);
    }
}

//! Parses preprocessed source into a resolved [`Program`]: locates the
//! two sections, builds the data segment and the (possibly linearized)
//! instruction list, then resolves every address and label in a second
//! pass so forward references work.

use crate::error::{Error, Warning};
use crate::lex::*;
use crate::preprocess;
use asmvm::{DataSection, Instruction, Mnemonic, Operand, Program, RegisterId, TextSection};
use std::collections::HashMap;

#[derive(Clone, Debug)]
enum RawOperand {
    Constant(i64),
    Register(RegisterId),
    Direct(String),
    Indirect(String, Box<RawOperand>),
    Label(String),
}

struct RawInstruction {
    line: usize,
    mnemonic: Mnemonic,
    operands: Vec<RawOperand>,
}

pub struct ParseOutput {
    pub program: Program,
    pub warnings: Vec<Warning>,
}

pub fn translate(source: &str) -> Result<ParseOutput, Error> {
    let minified = preprocess::minify(source);
    let lines: Vec<&str> = minified.lines().collect();

    let is_section = |l: &str, name: &str| l.eq_ignore_ascii_case(&format!("section .{}", name));
    let data_start = lines.iter().position(|l| is_section(l, "data"));
    let text_start = lines
        .iter()
        .position(|l| is_section(l, "text"))
        .ok_or(Error::MissingTextSection)?;

    let mut bounds: Vec<(usize, &str)> = vec![(text_start, "text")];
    if let Some(ds) = data_start {
        bounds.push((ds, "data"));
    }
    bounds.sort_by_key(|(i, _)| *i);

    let mut data_lines: Vec<(usize, &str)> = Vec::new();
    let mut text_lines: Vec<(usize, &str)> = Vec::new();

    for (pos, &(start, tag)) in bounds.iter().enumerate() {
        let end = bounds.get(pos + 1).map(|(i, _)| *i).unwrap_or(lines.len());
        let body = &lines[start + 1..end];
        let numbered = body.iter().enumerate().map(|(i, l)| (start + 2 + i, *l));
        if tag == "data" {
            data_lines.extend(numbered);
        } else {
            text_lines.extend(numbered);
        }
    }

    let mut warnings = Vec::new();
    let data = parse_data(&data_lines, &mut warnings)?;
    let (raw_instructions, labels) = parse_text(&text_lines, &mut warnings)?;
    let instructions = resolve(&raw_instructions, &data.var_to_addr, &labels)?;

    Ok(ParseOutput {
        program: Program {
            data,
            text: TextSection {
                labels,
                instructions,
            },
        },
        warnings,
    })
}

fn parse_data(lines: &[(usize, &str)], warnings: &mut Vec<Warning>) -> Result<DataSection, Error> {
    let mut memory = vec![0, 0, 0];
    let mut var_to_addr = HashMap::new();
    var_to_addr.insert("STDIN".to_string(), 0usize);
    var_to_addr.insert("STDOUT".to_string(), 1usize);
    var_to_addr.insert("STDERR".to_string(), 2usize);

    for &(line_no, text) in lines {
        let mut parts = text.splitn(2, ':');
        let name = parts.next().unwrap_or("").trim().to_string();
        let rest = parts.next().unwrap_or("").trim();
        if name.is_empty() {
            return Err(Error::EmptyLine { line: line_no });
        }

        let addr = memory.len();
        if let Some(count_str) = rest.strip_prefix("buf ") {
            let count: usize = count_str.trim().parse().map_err(|_| Error::BadDataDirective {
                line: line_no,
                directive: text.to_string(),
            })?;
            memory.resize(memory.len() + count, 0);
        } else if let Some(s) = recognize_quoted(rest) {
            memory.extend(s.chars().map(|c| c as i32));
            memory.push(0);
        } else {
            for value in rest.split(',') {
                let value = value.trim();
                let n = recognize_number(value)
                    .or_else(|| recognize_char_operand(value))
                    .ok_or_else(|| Error::BadDataDirective {
                        line: line_no,
                        directive: text.to_string(),
                    })?;
                memory.push(n as i32);
            }
        }

        if var_to_addr.insert(name.clone(), addr).is_some() {
            warnings.push(Warning::VariableRedefined { line: line_no, name });
        }
    }

    Ok(DataSection { memory, var_to_addr })
}

fn parse_text(
    lines: &[(usize, &str)],
    warnings: &mut Vec<Warning>,
) -> Result<(Vec<RawInstruction>, HashMap<String, usize>), Error> {
    let mut instructions = Vec::new();
    let mut labels = HashMap::new();

    for &(line_no, text) in lines {
        let mut remainder = text;
        loop {
            let token_end = remainder.find(char::is_whitespace).unwrap_or(remainder.len());
            let (token, rest) = remainder.split_at(token_end);
            match recognize_label_definition(token) {
                Some(name) => {
                    if labels.insert(name.to_string(), instructions.len()).is_some() {
                        warnings.push(Warning::LabelRedefined {
                            line: line_no,
                            name: name.to_string(),
                        });
                    }
                    remainder = rest.trim_start();
                    if remainder.is_empty() {
                        break;
                    }
                }
                None => break,
            }
        }
        if remainder.is_empty() {
            continue;
        }
        let instr = parse_instruction_line(line_no, remainder)?;
        linearize(instr, &mut instructions);
    }

    Ok((instructions, labels))
}

fn parse_instruction_line(line_no: usize, text: &str) -> Result<RawInstruction, Error> {
    let mut it = text.splitn(2, char::is_whitespace);
    let mnemonic_tok = it.next().unwrap();
    let rest = it.next().unwrap_or("").trim();
    let mnemonic = Mnemonic::parse(mnemonic_tok).map_err(|_| Error::UnknownMnemonic {
        line: line_no,
        token: mnemonic_tok.to_string(),
    })?;
    let operands = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',')
            .map(|tok| parse_operand(line_no, tok.trim()))
            .collect::<Result<Vec<_>, _>>()?
    };

    let expected = if mnemonic.is_reducing() { 2 } else { mnemonic.arity() };
    let arity_ok = if mnemonic.is_reducing() {
        operands.len() >= expected
    } else {
        operands.len() == expected
    };
    if !arity_ok {
        return Err(Error::UnexpectedArguments {
            line: line_no,
            mnemonic: mnemonic_tok.to_string(),
            expected,
            got: operands.len(),
        });
    }

    Ok(RawInstruction {
        line: line_no,
        mnemonic,
        operands,
    })
}

fn parse_operand(line_no: usize, tok: &str) -> Result<RawOperand, Error> {
    if let Some(n) = recognize_number(tok) {
        return Ok(RawOperand::Constant(n));
    }
    if let Some(s) = recognize_quoted(tok) {
        let mut chars = s.chars();
        let c = chars.next().ok_or(Error::OperandMustBeCharNotString {
            line: line_no,
            token: tok.to_string(),
        })?;
        if chars.next().is_some() {
            return Err(Error::OperandMustBeCharNotString {
                line: line_no,
                token: tok.to_string(),
            });
        }
        return Ok(RawOperand::Constant(c as i64));
    }
    if let Some(reg) = recognize_register(tok) {
        return Ok(RawOperand::Register(reg));
    }
    if let Some((base, offset)) = recognize_indirect_address(tok) {
        let offset_operand = parse_operand(line_no, offset)?;
        return Ok(RawOperand::Indirect(base.to_string(), Box::new(offset_operand)));
    }
    if let Some(name) = recognize_direct_address(tok) {
        return Ok(RawOperand::Direct(name.to_string()));
    }
    if let Some(name) = recognize_label_name(tok) {
        return Ok(RawOperand::Label(name.to_string()));
    }
    Err(Error::UnexpectedOperand {
        line: line_no,
        token: tok.to_string(),
    })
}

/// `OP A, B` stays as-is. `OP D, X1, ..., Xk` (k >= 2) becomes `MOV D, X1`
/// followed by `OP D, X2` .. `OP D, Xk`.
fn linearize(instr: RawInstruction, out: &mut Vec<RawInstruction>) {
    if instr.mnemonic.is_reducing() && instr.operands.len() > 2 {
        let line = instr.line;
        let mnemonic = instr.mnemonic;
        let mut operands = instr.operands.into_iter();
        let dest = operands.next().unwrap();
        let first = operands.next().unwrap();
        out.push(RawInstruction {
            line,
            mnemonic: Mnemonic::MOV,
            operands: vec![dest.clone(), first],
        });
        for rest in operands {
            out.push(RawInstruction {
                line,
                mnemonic,
                operands: vec![dest.clone(), rest],
            });
        }
    } else {
        out.push(instr);
    }
}

fn resolve(
    raw: &[RawInstruction],
    vars: &HashMap<String, usize>,
    labels: &HashMap<String, usize>,
) -> Result<Vec<Instruction>, Error> {
    raw.iter()
        .map(|ri| {
            let operands = ri
                .operands
                .iter()
                .map(|op| resolve_operand(ri.line, op, vars, labels))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Instruction {
                mnemonic: ri.mnemonic,
                operands,
            })
        })
        .collect()
}

fn resolve_operand(
    line: usize,
    op: &RawOperand,
    vars: &HashMap<String, usize>,
    labels: &HashMap<String, usize>,
) -> Result<Operand, Error> {
    match op {
        RawOperand::Constant(n) => Ok(Operand::Constant(*n as i32)),
        RawOperand::Register(r) => Ok(Operand::Register(*r)),
        RawOperand::Direct(name) => {
            let addr = vars.get(name).ok_or_else(|| Error::UndefinedVariable {
                line,
                name: name.clone(),
            })?;
            Ok(Operand::Direct(*addr))
        }
        RawOperand::Indirect(name, offset) => {
            let addr = vars.get(name).ok_or_else(|| Error::UndefinedVariable {
                line,
                name: name.clone(),
            })?;
            let resolved_offset = resolve_operand(line, offset, vars, labels)?;
            Ok(Operand::Indirect(*addr, Box::new(resolved_offset)))
        }
        RawOperand::Label(name) => {
            let idx = labels.get(name).ok_or_else(|| Error::UndefinedLabel {
                line,
                name: name.clone(),
            })?;
            Ok(Operand::Label(*idx))
        }
    }
}

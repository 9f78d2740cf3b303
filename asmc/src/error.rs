//! Translate-time errors and non-fatal warnings.

use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("missing required \"section .text\"")]
    MissingTextSection,
    #[error("line {line}: unknown mnemonic \"{token}\"")]
    UnknownMnemonic { line: usize, token: String },
    #[error("line {line}: unrecognized operand \"{token}\"")]
    UnexpectedOperand { line: usize, token: String },
    #[error("line {line}: quoted operand \"{token}\" must be exactly one character")]
    OperandMustBeCharNotString { line: usize, token: String },
    #[error("line {line}: \"{mnemonic}\" expects {expected} operand(s), got {got}")]
    UnexpectedArguments {
        line: usize,
        mnemonic: String,
        expected: usize,
        got: usize,
    },
    #[error("line {line}: undefined label \"{name}\"")]
    UndefinedLabel { line: usize, name: String },
    #[error("line {line}: undefined variable \"{name}\"")]
    UndefinedVariable { line: usize, name: String },
    #[error("line {line}: \"{directive}\" is not a valid data directive")]
    BadDataDirective { line: usize, directive: String },
    #[error("line {line}: empty instruction line")]
    EmptyLine { line: usize },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Warning {
    LabelRedefined { line: usize, name: String },
    VariableRedefined { line: usize, name: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Warning::LabelRedefined { line, name } => {
                write!(f, "line {}: label \"{}\" redefined", line, name)
            }
            Warning::VariableRedefined { line, name } => {
                write!(f, "line {}: variable \"{}\" redefined", line, name)
            }
        }
    }
}

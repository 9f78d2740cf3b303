//! The arithmetic-logic unit: one `apply` entry point shared by every
//! reducing mnemonic and by `cmp`.

use crate::arithmetic::{carry, overflow, sign, truncate, zero};
use crate::Word;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Xor,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Flags {
    pub n: bool,
    pub z: bool,
    pub v: bool,
    pub c: bool,
}

#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[error("division by zero")]
pub struct AluZeroDivisionError;

#[derive(Clone, Copy, Debug, Default)]
pub struct Alu {
    pub flags: Flags,
}

impl Alu {
    pub fn new() -> Self {
        Alu::default()
    }

    /// Compute `a op b` at unbounded precision, update the flags from the
    /// raw (untruncated) result, then return the result truncated to a
    /// word. Division-by-zero is reported before the flags are touched.
    pub fn apply(&mut self, op: BinOp, a: Word, b: Word) -> Result<Word, AluZeroDivisionError> {
        let (a, b) = (a as i64, b as i64);
        let raw = match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => {
                if b == 0 {
                    return Err(AluZeroDivisionError);
                }
                floor_div(a, b)
            }
            BinOp::Mod => {
                if b == 0 {
                    return Err(AluZeroDivisionError);
                }
                floor_mod(a, b)
            }
            BinOp::And => a & b,
            BinOp::Or => a | b,
            BinOp::Xor => a ^ b,
        };

        self.flags = Flags {
            n: sign(raw),
            z: zero(raw),
            v: overflow(raw),
            c: carry(raw),
        };

        Ok(truncate(raw))
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        r + b
    } else {
        r
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn add_sets_zero_flag() {
        let mut alu = Alu::new();
        let r = alu.apply(BinOp::Add, -5, 5).unwrap();
        assert_eq!(r, 0);
        assert!(alu.flags.z);
        assert!(!alu.flags.n);
    }

    #[test]
    fn sub_sets_negative_flag() {
        let mut alu = Alu::new();
        let r = alu.apply(BinOp::Sub, 3, 4).unwrap();
        assert_eq!(r, -1);
        assert!(alu.flags.n);
        assert!(!alu.flags.z);
    }

    #[test]
    fn div_by_zero_fails_before_flags_update() {
        let mut alu = Alu::new();
        alu.apply(BinOp::Add, 1, 1).unwrap();
        let before = alu.flags;
        let err = alu.apply(BinOp::Div, 10, 0);
        assert!(err.is_err());
        assert_eq!(alu.flags, before);
    }

    #[test]
    fn div_and_mod_floor_toward_negative_infinity() {
        let mut alu = Alu::new();
        assert_eq!(alu.apply(BinOp::Div, -7, 2).unwrap(), -4);
        assert_eq!(alu.apply(BinOp::Mod, -7, 2).unwrap(), 1);
        assert_eq!(alu.apply(BinOp::Div, 7, -2).unwrap(), -4);
        assert_eq!(alu.apply(BinOp::Mod, 7, -2).unwrap(), -1);
    }

    #[test]
    fn mul_sets_overflow_on_out_of_range_result() {
        let mut alu = Alu::new();
        alu.apply(BinOp::Mul, i32::max_value(), 2).unwrap();
        assert!(alu.flags.v);
    }
}

//! Character I/O backing the `STDIN`/`STDOUT`/`STDERR` memory-mapped cells.
//!
//! `getn` is deliberately not a separate scanning routine: it drives the
//! same per-line character stream as `getc`, one call at a time, and stops
//! at the first terminator.

use crate::constants::NULL_TERM;
use crate::Word;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

pub struct IoController<R, W, E> {
    input: R,
    output: W,
    error: E,
    pending: Option<VecDeque<i32>>,
}

impl IoController<io::BufReader<io::Stdin>, io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        IoController::new(io::BufReader::new(io::stdin()), io::stdout(), io::stderr())
    }
}

impl<R: BufRead, W: Write, E: Write> IoController<R, W, E> {
    pub fn new(input: R, output: W, error: E) -> Self {
        IoController {
            input,
            output,
            error,
            pending: None,
        }
    }

    /// Write a single character (by code point) to `STDOUT`, no newline.
    pub fn putc(&mut self, code: Word) {
        let c = char::from_u32(code as u32).unwrap_or('\u{FFFD}');
        let mut buf = [0u8; 4];
        let _ = self.output.write_all(c.encode_utf8(&mut buf).as_bytes());
        let _ = self.output.flush();
    }

    /// Write the decimal representation of `value` to `STDOUT`.
    pub fn putn(&mut self, value: Word) {
        let _ = write!(self.output, "{}", value);
        let _ = self.output.flush();
    }

    /// Write a single character (by code point) to `STDERR`, no newline.
    pub fn puterr(&mut self, code: Word) {
        let c = char::from_u32(code as u32).unwrap_or('\u{FFFD}');
        let mut buf = [0u8; 4];
        let _ = self.error.write_all(c.encode_utf8(&mut buf).as_bytes());
        let _ = self.error.flush();
    }

    fn ensure_line(&mut self) {
        if self.pending.is_none() {
            let mut line = String::new();
            let _ = self.input.read_line(&mut line);
            let trimmed = line.trim_end_matches(['\n', '\r']);
            self.pending = Some(trimmed.chars().map(|c| c as i32).collect());
        }
    }

    /// Pull the next character code from the input stream. Once the
    /// current line is exhausted this returns [`NULL_TERM`] exactly once,
    /// then resumes from a fresh line on the next call.
    pub fn getc(&mut self) -> Word {
        self.ensure_line();
        let queue = self.pending.as_mut().unwrap();
        match queue.pop_front() {
            Some(code) => code,
            None => {
                self.pending = None;
                NULL_TERM
            }
        }
    }

    /// Accumulate characters until the terminator and parse them as a
    /// signed decimal integer.
    pub fn getn(&mut self) -> Word {
        let mut buf = String::new();
        loop {
            let code = self.getc();
            if code == NULL_TERM {
                break;
            }
            if let Some(c) = char::from_u32(code as u32) {
                buf.push(c);
            }
        }
        buf.trim().parse().unwrap_or(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn controller(input: &str) -> IoController<&[u8], Vec<u8>, Vec<u8>> {
        IoController::new(input.as_bytes(), Vec::new(), Vec::new())
    }

    #[test]
    fn getc_yields_one_terminator_per_line_then_resumes() {
        let mut io = controller("ab\ncd\n");
        assert_eq!(io.getc(), 'a' as i32);
        assert_eq!(io.getc(), 'b' as i32);
        assert_eq!(io.getc(), 0);
        assert_eq!(io.getc(), 'c' as i32);
        assert_eq!(io.getc(), 'd' as i32);
        assert_eq!(io.getc(), 0);
    }

    #[test]
    fn getn_parses_signed_decimal_up_to_terminator() {
        let mut io = controller("-1234\n");
        assert_eq!(io.getn(), -1234);
    }

    #[test]
    fn putc_writes_utf8_without_newline() {
        let mut io = controller("");
        io.putc('x' as i32);
        io.putc('y' as i32);
        assert_eq!(io.output, b"xy");
    }

    #[test]
    fn putn_writes_decimal_text() {
        let mut io = controller("");
        io.putn(-42);
        assert_eq!(io.output, b"-42");
    }
}

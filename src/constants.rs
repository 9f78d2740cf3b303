//! Fixed sizes and reserved addresses for the machine.

/// Width of a word in bits.
pub const N_BITS: u32 = 32;

pub const MIN_NUM: i64 = i32::min_value() as i64;
pub const MAX_NUM: i64 = i32::max_value() as i64;

/// Default cell count of main memory. Overridable via `MachineConfig`.
pub const MEMORY_SIZE: usize = 128;

/// Memory-mapped cell addresses.
pub const STDIN: usize = 0;
pub const STDOUT: usize = 1;
pub const STDERR: usize = 2;

/// Sentinel returned by `getc` once the current input line is exhausted.
pub const NULL_TERM: i32 = 0x00;

pub const REGISTER_COUNT: usize = 7;

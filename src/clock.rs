//! Tick and instruction accounting, threaded through every operand access.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Clock {
    ticks: u64,
    insts: u64,
}

impl Clock {
    pub fn new() -> Self {
        Clock::default()
    }

    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    pub fn inst(&mut self) {
        self.insts += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn insts(&self) -> u64 {
        self.insts
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tick: {}, inst: {}", self.ticks, self.insts)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_matches_the_original_format() {
        let mut clock = Clock::new();
        clock.tick();
        clock.tick();
        clock.inst();
        assert_eq!(clock.to_string(), "tick: 2, inst: 1");
    }
}

use std::fmt;
use std::str;

use super::RegisterBank;

/// Number of lines in a register bank (one bit per line in a 32-bit register)
pub const LINE_COUNT: u8 = 32;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Line(u8);

impl Line {
	pub fn new(index: u8) -> crate::AResult<Self> {
		ensure!(index < LINE_COUNT, "invalid GPIO line: {} (only {} lines available)", index, LINE_COUNT);
		Ok(Line(index))
	}

	pub fn index(&self) -> u8 {
		self.0
	}

	pub fn mask(&self) -> u32 {
		1u32 << self.0
	}
}

impl fmt::Display for Line {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "P{}", self.0)
	}
}

impl str::FromStr for Line {
	type Err = ::failure::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		// accept both "11" and "P11"
		let digits = s.trim_start_matches(|c| c == 'P' || c == 'p');
		let index = with_context!(("invalid GPIO line: {:?}", s),
			Ok(digits.parse::<u8>()?)
		)?;
		Line::new(index)
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Level {
	Low,
	High,
}

impl Level {
	pub fn is_high(self) -> bool {
		Level::High == self
	}
}

impl From<bool> for Level {
	fn from(v: bool) -> Self {
		match v {
			false => Level::Low,
			true => Level::High,
		}
	}
}

/// Open-drain emulation on top of a plain push-pull register bank.
///
/// A line is never driven high: `High` floats the line (direction = input)
/// and relies on the external pull-up, `Low` drives it (direction = output)
/// with the output latch cleared.
pub trait LineDriver: RegisterBank {
	fn drive(&mut self, line: Line, level: Level) {
		let mask = line.mask();

		// latch 0 first, so switching direction to output can only pull low
		let output = self.output();
		self.set_output(output & !mask);

		let direction = self.direction() & !mask;
		match level {
			Level::High => self.set_direction(direction),
			Level::Low => self.set_direction(direction | mask),
		}
	}

	fn sample(&mut self, line: Line) -> Level {
		Level::from(0 != self.input() & line.mask())
	}
}

impl<R: RegisterBank + ?Sized> LineDriver for R {
}

//! GPIO access for bit-banging.
//!
//! The port is modelled as a bank of 32-bit registers (direction, output,
//! input); the [`LineDriver`] emulates open-drain lines on top of it.

mod line;
mod mapped;
mod registers;

pub use self::line::{
	LINE_COUNT,
	Level,
	Line,
	LineDriver,
};

pub use self::mapped::{
	MappedRegisters,
	RegisterLayout,
	open_mapped,
};

pub use self::registers::{
	RegisterBank,
	reliable_sleep,
};

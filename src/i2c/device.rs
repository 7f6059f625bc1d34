use std::fmt;

use crate::gpio::Line;

use super::Pins;

/// One EEPROM on a bit-banged bus.
///
/// Several devices of the same family can share the lines; they are told
/// apart by `page`, which is added to the base `address`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Device {
	pub scl: Line,
	pub sda: Line,
	/// base device address in 8-bit form (e.g. 0xA0); bit 0 is the R/W slot
	pub address: u8,
	pub page: u8,
}

impl Device {
	pub fn new(scl: Line, sda: Line, address: u8, page: u8) -> Self {
		Device {
			scl,
			sda,
			address,
			page,
		}
	}

	pub fn pins(&self) -> Pins {
		Pins {
			scl: self.scl,
			sda: self.sda,
		}
	}

	// bits 7..1 go on the wire
	pub fn select(&self) -> u8 {
		self.address.wrapping_add(self.page)
	}
}

impl fmt::Display for Device {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "EEPROM 0x{:02x} (SCL {}, SDA {})", self.select(), self.scl, self.sda)
	}
}

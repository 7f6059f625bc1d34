/// I2C master bit-banged on two open-drain GPIO lines (SCL and SDA).
///
/// Only what 24Cxx EEPROMs need: single master, no clock stretching, 8-bit
/// byte addresses.
///
/// Transaction layout:
/// - START
/// - device address: 7 bits, R/W flag (0 = write, 1 = read), device ACK
/// - byte address: 8 bits, device ACK
/// - write: data bytes, each followed by device ACK; STOP
/// - read: repeated START, device address with read flag, device ACK, then
///   data bytes, each followed by a master ACK except for the last one which
///   gets a NACK; STOP
///
/// Data changes while SCL is low only; a SDA edge while SCL is high is a
/// START (falling) or STOP (rising).

mod config;
mod device;
mod error;
mod low_level;
mod master;

pub use self::config::{
	Config,
	DEFAULT_TIMEOUT,
	DEFAULT_WRITE_CYCLE,
};

pub use self::device::Device;

pub use self::error::Error;

pub use self::low_level::{
	Direction,
	LowLevel,
	Pins,
};

pub use self::master::Master;

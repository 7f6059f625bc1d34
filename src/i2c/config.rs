use std::time::Duration;

/// Default polling bound for ACK/NACK and the idle bus check
pub const DEFAULT_TIMEOUT: u32 = 100;

/// Default pause before each transaction (EEPROM write cycle)
pub const DEFAULT_WRITE_CYCLE: Duration = Duration::from_millis(10);

/// Tuning of the protocol engine.
///
/// The timeouts are loop iteration counts, not wall-clock durations: how long
/// they last depends on how fast the host executes the polling loop and reads
/// the input register.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Config {
	/// polls of SDA while waiting for ACK or NACK
	pub ack_timeout: u32,
	/// polls of SDA while waiting for an idle bus before a transaction
	pub bus_timeout: u32,
	/// pause before checking the bus, lets a previous write cycle finish
	pub write_cycle: Duration,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			ack_timeout: DEFAULT_TIMEOUT,
			bus_timeout: DEFAULT_TIMEOUT,
			write_cycle: DEFAULT_WRITE_CYCLE,
		}
	}
}

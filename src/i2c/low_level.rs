use crate::gpio::{
	Level,
	Line,
	LineDriver,
	RegisterBank,
};

use super::{
	Config,
	Error,
};

/// Clock and data line of one bus
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Pins {
	pub scl: Line,
	pub sda: Line,
}

/// R/W flag appended to the device address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Write,
	Read,
}

impl Direction {
	pub fn level(self) -> Level {
		match self {
			Direction::Write => Level::Low,
			Direction::Read => Level::High,
		}
	}
}

trait InternalLowLevel: LineDriver {
	// SDA must be stable already; the device samples on the rising edge
	fn clock_pulse(&mut self, pins: Pins) {
		self.drive(pins.scl, Level::High);
		self.drive(pins.scl, Level::Low);
	}

	// float SDA, raise SCL for the acknowledge bit and poll SDA for up to
	// `timeout` iterations. returns the remaining iterations when SDA was
	// seen low, `None` if it stayed high.
	//
	// SCL is low again when this returns.
	fn poll_acknowledge(&mut self, pins: Pins, timeout: u32) -> Option<u32> {
		self.drive(pins.sda, Level::High);
		self.drive(pins.scl, Level::High);

		let mut acked = None;
		for remaining in (1..=timeout).rev() {
			if Level::Low == self.sample(pins.sda) {
				acked = Some(remaining);
				break;
			}
		}

		self.drive(pins.scl, Level::Low);
		acked
	}
}

impl<R: LineDriver + ?Sized> InternalLowLevel for R {
}

/// Bus level building blocks of an I2C master.
///
/// None of these keep state; the only state is the register bank itself.
pub trait LowLevel: RegisterBank {
	/// release both lines (used once before the first transaction)
	fn init_gpio(&mut self, pins: Pins) {
		self.drive(pins.sda, Level::High);
		self.drive(pins.scl, Level::High);
	}

	/// SDA falls while SCL is high
	fn start_signal(&mut self, pins: Pins) {
		// both high first, so we don't generate a STOP instead
		self.drive(pins.sda, Level::High);
		self.drive(pins.scl, Level::High);

		self.drive(pins.sda, Level::Low);
		self.drive(pins.scl, Level::Low);
	}

	/// SDA rises while SCL is high
	fn stop_signal(&mut self, pins: Pins) {
		// both low first, so we don't generate a START instead
		self.drive(pins.scl, Level::Low);
		self.drive(pins.sda, Level::Low);

		self.drive(pins.scl, Level::High);
		self.drive(pins.sda, Level::High);
	}

	/// Bus recovery before a transaction.
	///
	/// Pauses for the write cycle of a previous transaction, then waits for
	/// SDA to read high and forces any half-finished transaction to end with a
	/// STOP. If SDA stays low no STOP is sent.
	fn init_i2c(&mut self, pins: Pins, config: &Config) -> Result<(), Error> {
		self.settle(config.write_cycle);

		let mut counter = config.bus_timeout;
		while Level::Low == self.sample(pins.sda) {
			if 0 == counter {
				warn!("SDA ({}) stuck low", pins.sda);
				return Err(Error::BusStuckLow);
			}
			counter -= 1;
		}

		self.stop_signal(pins);
		Ok(())
	}

	/// send 8 bits, highest bit first; doesn't wait for ACK
	fn shift_out_byte(&mut self, pins: Pins, byte: u8) {
		for bit in (0..8).rev() {
			self.drive(pins.sda, Level::from(0 != byte & (1u8 << bit)));
			self.clock_pulse(pins);
		}
	}

	/// receive 8 bits, highest bit first; SDA must be floating already.
	fn shift_in_byte(&mut self, pins: Pins) -> u8 {
		let mut result = 0u8;
		for bit in (0..8).rev() {
			self.drive(pins.scl, Level::High);
			if self.sample(pins.sda).is_high() {
				result |= 1u8 << bit;
			}
			self.drive(pins.scl, Level::Low);
		}
		result
	}

	/// Clock the acknowledge bit and expect the device to pull SDA low
	/// within `timeout` polls.
	fn wait_ack(&mut self, pins: Pins, timeout: u32) -> Result<(), Error> {
		match self.poll_acknowledge(pins, timeout) {
			Some(remaining) => {
				trace!("ACK with {} polls left", remaining);
				Ok(())
			},
			None => {
				warn!("no ACK after {} polls", timeout);
				Err(Error::NoAck)
			},
		}
	}

	/// Clock the acknowledge bit after the last byte of a read and expect SDA
	/// to stay high for all `timeout` polls.
	fn wait_nack(&mut self, pins: Pins, timeout: u32) -> Result<(), Error> {
		match self.poll_acknowledge(pins, timeout) {
			None => Ok(()),
			Some(remaining) => {
				warn!("unexpected ACK with {} polls left", remaining);
				Err(Error::UnexpectedAck)
			},
		}
	}

	/// acknowledge a received byte to request the next one
	fn master_ack(&mut self, pins: Pins) {
		self.drive(pins.sda, Level::Low);
		self.clock_pulse(pins);
		self.drive(pins.sda, Level::High);
	}

	/// Send bits 7..1 of `select` followed by the R/W flag in place of bit 0.
	///
	/// Must be followed by `wait_ack`.
	fn send_device_address(&mut self, pins: Pins, select: u8, direction: Direction) {
		for bit in (1..8).rev() {
			self.drive(pins.sda, Level::from(0 != select & (1u8 << bit)));
			self.clock_pulse(pins);
		}

		self.drive(pins.sda, direction.level());
		self.clock_pulse(pins);
	}

	/// send the memory address and wait for its ACK
	fn send_byte_address(&mut self, pins: Pins, address: u8, timeout: u32) -> Result<(), Error> {
		self.shift_out_byte(pins, address);
		self.wait_ack(pins, timeout)
	}
}

impl<R: RegisterBank + ?Sized> LowLevel for R {
}

use crate::gpio::RegisterBank;

use super::{
	Config,
	Device,
	Direction,
	Error,
	LowLevel,
};

/// Transactions against 24Cxx style EEPROMs.
///
/// Every transaction starts with bus recovery (`init_i2c`), a START and the
/// device/byte address in write mode. On a missing (or unexpected) ACK the
/// transaction is abandoned right away: no STOP is sent and the bus is left
/// as it is, with SCL low. The recovery at the start of the next transaction
/// terminates it.
///
/// There is no locking: callers must make sure no other transaction uses
/// the same lines concurrently.
pub struct Master<R: RegisterBank> {
	registers: R,
	config: Config,
}

impl<R: RegisterBank> Master<R> {
	pub fn new(registers: R) -> Self {
		Self::with_config(registers, Config::default())
	}

	pub fn with_config(registers: R, config: Config) -> Self {
		Master {
			registers,
			config,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn registers(&self) -> &R {
		&self.registers
	}

	pub fn registers_mut(&mut self) -> &mut R {
		&mut self.registers
	}

	pub fn into_inner(self) -> R {
		self.registers
	}

	// recovery, START, device address (write) and byte address
	fn address_phase(&mut self, device: Device, byte_address: u8) -> Result<(), Error> {
		let pins = device.pins();
		let timeout = self.config.ack_timeout;

		self.registers.init_i2c(pins, &self.config)?;
		self.registers.start_signal(pins);
		self.registers.send_device_address(pins, device.select(), Direction::Write);
		self.registers.wait_ack(pins, timeout)?;
		self.registers.send_byte_address(pins, byte_address, timeout)
	}

	// address phase, then repeated START and device address (read)
	fn read_phase(&mut self, device: Device, byte_address: u8) -> Result<(), Error> {
		let pins = device.pins();

		self.address_phase(device, byte_address)?;
		self.registers.start_signal(pins);
		self.registers.send_device_address(pins, device.select(), Direction::Read);
		self.registers.wait_ack(pins, self.config.ack_timeout)
	}

	pub fn write_byte(&mut self, device: Device, byte_address: u8, data: u8) -> Result<(), Error> {
		debug!("{}: write 0x{:02x} at 0x{:02x}", device, data, byte_address);
		let pins = device.pins();

		self.address_phase(device, byte_address)?;
		self.registers.shift_out_byte(pins, data);
		self.registers.wait_ack(pins, self.config.ack_timeout)?;
		self.registers.stop_signal(pins);
		Ok(())
	}

	/// Write consecutive bytes starting at `byte_address`.
	///
	/// The device only buffers one page (16 bytes for 4K-16K parts, 8 for
	/// 1K/2K); writing past the end of a page wraps around to the start of the
	/// same page. This is not checked here.
	pub fn write_page(&mut self, device: Device, byte_address: u8, data: &[u8]) -> Result<(), Error> {
		debug!("{}: write {} bytes at 0x{:02x}", device, data.len(), byte_address);
		let pins = device.pins();

		self.address_phase(device, byte_address)?;
		for &byte in data {
			self.registers.shift_out_byte(pins, byte);
			self.registers.wait_ack(pins, self.config.ack_timeout)?;
		}
		self.registers.stop_signal(pins);
		Ok(())
	}

	pub fn read_byte(&mut self, device: Device, byte_address: u8) -> Result<u8, Error> {
		debug!("{}: read at 0x{:02x}", device, byte_address);
		let pins = device.pins();

		self.read_phase(device, byte_address)?;
		let data = self.registers.shift_in_byte(pins);
		self.registers.wait_nack(pins, self.config.ack_timeout)?;
		self.registers.stop_signal(pins);
		Ok(data)
	}

	/// Sequential random read of `count` bytes starting at `byte_address`.
	///
	/// The device address counter wraps around at the end of the memory
	/// array. Reading nothing doesn't touch the bus.
	pub fn read_page(&mut self, device: Device, byte_address: u8, count: usize) -> Result<Vec<u8>, Error> {
		debug!("{}: read {} bytes at 0x{:02x}", device, count, byte_address);
		if 0 == count {
			return Ok(Vec::new());
		}
		let pins = device.pins();

		self.read_phase(device, byte_address)?;
		let mut data = Vec::with_capacity(count);
		for i in 0..count {
			data.push(self.registers.shift_in_byte(pins));
			if i == count - 1 {
				self.registers.wait_nack(pins, self.config.ack_timeout)?;
				self.registers.stop_signal(pins);
			} else {
				self.registers.master_ack(pins);
			}
		}
		Ok(data)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gpio::{
		Level,
		Line,
	};
	use crate::sim::{
		BusEvent,
		SimBus,
		SimEeprom,
	};
	use std::time::Duration;

	fn device(page: u8) -> Device {
		Device::new(Line::new(11).unwrap(), Line::new(12).unwrap(), 0xa0, page)
	}

	fn master_with(eeproms: Vec<SimEeprom>) -> Master<SimBus> {
		let d = device(0);
		let mut bus = SimBus::new(d.scl, d.sda);
		for eeprom in eeproms {
			bus.attach(eeprom);
		}
		Master::with_config(bus, Config {
			write_cycle: Duration::from_millis(0),
			..Config::default()
		})
	}

	fn master() -> Master<SimBus> {
		master_with(vec![SimEeprom::new(0xa0)])
	}

	#[test]
	fn write_then_read_every_value() {
		let mut m = master();
		for b in 0..=255u8 {
			m.write_byte(device(0), 0x33, b).unwrap();
			assert_eq!(m.read_byte(device(0), 0x33), Ok(b));
		}
		assert_eq!(m.registers().open_drain_violations(), 0);
	}

	#[test]
	fn write_page_then_read_page() {
		let mut m = master();
		let data: Vec<u8> = (0..16u8).map(|i| 0xf0 ^ (i * 7)).collect();
		m.write_page(device(0), 0x20, &data).unwrap();
		assert_eq!(m.read_page(device(0), 0x20, data.len()), Ok(data));
	}

	#[test]
	fn page_write_then_full_read() {
		let mut eeprom = SimEeprom::new(0xa0);
		for (address, byte) in eeprom.memory_mut().iter_mut().enumerate() {
			*byte = !(address as u8);
		}
		let mut m = master_with(vec![eeprom]);

		let data: Vec<u8> = (0..16u8).collect();
		m.write_page(device(0), 0x00, &data).unwrap();
		let read = m.read_page(device(0), 0x00, 256).unwrap();

		assert_eq!(&read[..16], &data[..]);
		for address in 16..256 {
			assert_eq!(read[address], !(address as u8));
		}
	}

	#[test]
	fn page_write_wraps_within_page() {
		let mut m = master();
		m.write_page(device(0), 0x1e, &[1, 2, 3, 4]).unwrap();
		assert_eq!(m.read_page(device(0), 0x10, 2), Ok(vec![3, 4]));
		assert_eq!(m.read_page(device(0), 0x1e, 2), Ok(vec![1, 2]));
		assert_eq!(m.read_byte(device(0), 0x20), Ok(0xff));
	}

	#[test]
	fn sequential_read_wraps_at_end_of_array() {
		let mut m = master();
		m.write_byte(device(0), 0xff, 0x55).unwrap();
		m.write_byte(device(0), 0x00, 0xaa).unwrap();
		assert_eq!(m.read_page(device(0), 0xff, 2), Ok(vec![0x55, 0xaa]));
	}

	#[test]
	fn read_page_of_one_matches_read_byte() {
		let mut m = master();
		m.write_byte(device(0), 0x07, 0x3c).unwrap();

		m.registers_mut().clear_events();
		let single = m.read_byte(device(0), 0x07).unwrap();
		let events_byte = m.registers().events().to_vec();

		m.registers_mut().clear_events();
		let page = m.read_page(device(0), 0x07, 1).unwrap();
		let events_page = m.registers().events().to_vec();

		assert_eq!(vec![single], page);
		assert_eq!(events_byte, events_page);
		assert_eq!(m.registers().clock_level(), Level::High);
		assert_eq!(m.registers().data_level(), Level::High);
	}

	#[test]
	fn read_uses_repeated_start() {
		let mut m = master();
		m.registers_mut().clear_events();
		m.read_page(device(0), 0x00, 8).unwrap();
		assert_eq!(m.registers().events(), &[BusEvent::Start, BusEvent::Start, BusEvent::Stop][..]);

		m.registers_mut().clear_events();
		m.read_byte(device(0), 0x00).unwrap();
		assert_eq!(m.registers().events(), &[BusEvent::Start, BusEvent::Start, BusEvent::Stop][..]);
	}

	#[test]
	fn write_is_a_single_transaction() {
		let mut m = master();
		m.registers_mut().clear_events();
		m.write_page(device(0), 0x00, &[1, 2, 3]).unwrap();
		assert_eq!(m.registers().events(), &[BusEvent::Start, BusEvent::Stop][..]);
	}

	#[test]
	fn missing_device_fails_without_stop() {
		let mut m = master_with(Vec::new());
		let d = device(0);

		assert_eq!(m.write_byte(d, 0, 1), Err(Error::NoAck));
		assert_eq!(m.registers().clock_level(), Level::Low);
		assert_eq!(m.registers().events(), &[BusEvent::Start][..]);

		assert_eq!(m.write_page(d, 0, &[1, 2]), Err(Error::NoAck));
		assert_eq!(m.registers().clock_level(), Level::Low);

		assert_eq!(m.read_byte(d, 0), Err(Error::NoAck));
		assert_eq!(m.registers().clock_level(), Level::Low);

		assert_eq!(m.read_page(d, 0, 16), Err(Error::NoAck));
		assert_eq!(m.registers().clock_level(), Level::Low);

		// each abandoned transaction was terminated by the next recovery
		let events = m.registers().events();
		assert_eq!(events.iter().filter(|e| **e == BusEvent::Start).count(), 4);
		assert_eq!(events.iter().filter(|e| **e == BusEvent::Stop).count(), 3);
	}

	#[test]
	fn stuck_bus_never_starts() {
		let mut m = master();
		m.registers_mut().set_stuck_low(true);

		assert_eq!(m.write_byte(device(0), 0, 1), Err(Error::BusStuckLow));
		assert_eq!(m.read_page(device(0), 0, 4), Err(Error::BusStuckLow));
		assert!(m.registers().events().is_empty());
	}

	#[test]
	fn pages_select_devices() {
		let mut m = master_with(vec![SimEeprom::new(0xa0), SimEeprom::new(0xa2)]);

		m.write_byte(device(0), 0x10, 0x11).unwrap();
		m.write_byte(device(2), 0x10, 0x22).unwrap();
		assert_eq!(m.read_byte(device(0), 0x10), Ok(0x11));
		assert_eq!(m.read_byte(device(2), 0x10), Ok(0x22));

		assert_eq!(m.read_byte(device(4), 0x10), Err(Error::NoAck));
		assert_eq!(m.registers().eeprom(1).memory()[0x10], 0x22);
	}

	#[test]
	fn empty_transfers() {
		let mut m = master();
		m.write_byte(device(0), 0x40, 0x99).unwrap();

		m.registers_mut().clear_events();
		assert_eq!(m.read_page(device(0), 0x40, 0), Ok(Vec::new()));
		assert!(m.registers().events().is_empty());

		// only moves the address pointer
		m.write_page(device(0), 0x41, &[]).unwrap();
		assert_eq!(m.registers().eeprom(0).memory()[0x41], 0xff);
		assert_eq!(m.read_byte(device(0), 0x40), Ok(0x99));
	}

	#[test]
	fn recovers_after_abandoned_read() {
		let mut m = master();
		m.write_byte(device(0), 0x05, 0x5a).unwrap();

		// timeout 0 can't see any ACK
		let config = *m.config();
		let mut bus = m.into_inner();
		{
			let mut impatient = Master::with_config(&mut bus, Config { ack_timeout: 0, ..config });
			assert_eq!(impatient.read_byte(device(0), 0x05), Err(Error::NoAck));
		}

		let mut m = Master::with_config(bus, config);
		assert_eq!(m.read_byte(device(0), 0x05), Ok(0x5a));
	}
}

//! Simulated bus for tests and dry runs: a register bank whose lines have
//! pull-ups, wired-AND with any number of simulated EEPROMs.

mod eeprom;

use std::time::Duration;

use crate::gpio::{
	Level,
	Line,
	RegisterBank,
};

pub use self::eeprom::{
	MEMORY_SIZE,
	PAGE_SIZE,
	SimEeprom,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BusEvent {
	Start,
	/// only logged if it terminates a started transaction
	Stop,
}

pub struct SimBus {
	direction: u32,
	output: u32,
	scl: Line,
	sda: Line,
	stuck_low: bool,
	eeproms: Vec<SimEeprom>,
	// levels after the last register write
	scl_level: Level,
	sda_level: Level,
	open: bool,
	events: Vec<BusEvent>,
	violations: usize,
}

impl SimBus {
	pub fn new(scl: Line, sda: Line) -> Self {
		SimBus {
			direction: 0,
			output: 0,
			scl,
			sda,
			stuck_low: false,
			eeproms: Vec::new(),
			scl_level: Level::High,
			sda_level: Level::High,
			open: false,
			events: Vec::new(),
			violations: 0,
		}
	}

	pub fn attach(&mut self, eeprom: SimEeprom) {
		self.eeproms.push(eeprom);
	}

	pub fn eeprom(&self, index: usize) -> &SimEeprom {
		&self.eeproms[index]
	}

	pub fn eeprom_mut(&mut self, index: usize) -> &mut SimEeprom {
		&mut self.eeproms[index]
	}

	/// hold SDA low regardless of what anyone drives
	pub fn set_stuck_low(&mut self, stuck: bool) {
		self.stuck_low = stuck;
		self.sda_level = self.wire_level(self.sda);
	}

	pub fn events(&self) -> &[BusEvent] {
		&self.events
	}

	pub fn clear_events(&mut self) {
		self.events.clear();
	}

	pub fn clock_level(&self) -> Level {
		self.scl_level
	}

	pub fn data_level(&self) -> Level {
		self.sda_level
	}

	/// number of register writes that left a line driven high
	pub fn open_drain_violations(&self) -> usize {
		self.violations
	}

	// what the master alone puts on a line: pulled up unless driven
	fn master_level(&self, line: Line) -> Level {
		let mask = line.mask();
		Level::from(0 == self.direction & mask || 0 != self.output & mask)
	}

	fn wire_level(&self, line: Line) -> Level {
		let mut level = self.master_level(line);
		if line == self.sda && (self.stuck_low || self.eeproms.iter().any(|e| e.pulls_sda_low())) {
			level = Level::Low;
		}
		level
	}

	fn update(&mut self) {
		if 0 != self.direction & self.output {
			self.violations += 1;
		}

		let scl = self.wire_level(self.scl);
		let sda = self.wire_level(self.sda);

		if scl != self.scl_level {
			for eeprom in &mut self.eeproms {
				match scl {
					Level::High => eeprom.clock_rise(sda),
					Level::Low => eeprom.clock_fall(),
				}
			}
		} else if Level::High == scl && sda != self.sda_level {
			match sda {
				Level::Low => {
					trace!("sim: START");
					self.events.push(BusEvent::Start);
					self.open = true;
					for eeprom in &mut self.eeproms {
						eeprom.start();
					}
				},
				Level::High => {
					trace!("sim: STOP");
					if self.open {
						self.events.push(BusEvent::Stop);
						self.open = false;
					}
					for eeprom in &mut self.eeproms {
						eeprom.stop();
					}
				},
			}
		}

		self.scl_level = scl;
		// devices might have changed SDA
		self.sda_level = self.wire_level(self.sda);
	}
}

impl RegisterBank for SimBus {
	fn direction(&mut self) -> u32 {
		self.direction
	}

	fn set_direction(&mut self, value: u32) {
		self.direction = value;
		self.update();
	}

	fn output(&mut self) -> u32 {
		self.output
	}

	fn set_output(&mut self, value: u32) {
		self.output = value;
		self.update();
	}

	fn input(&mut self) -> u32 {
		let mut input = !self.direction | self.output;
		if Level::Low == self.wire_level(self.sda) {
			input &= !self.sda.mask();
		}
		input
	}

	// no real time passes; write cycles complete instantly
	fn settle(&mut self, _duration: Duration) {
		for eeprom in &mut self.eeproms {
			eeprom.finish_write_cycle();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gpio::LineDriver;
	use crate::i2c::{
		Config,
		Direction,
		Error,
		LowLevel,
		Pins,
	};

	fn pins() -> Pins {
		Pins {
			scl: Line::new(28).unwrap(),
			sda: Line::new(29).unwrap(),
		}
	}

	#[test]
	fn pull_ups_and_wired_and() {
		let pins = pins();
		let mut bus = SimBus::new(pins.scl, pins.sda);
		let other = Line::new(0).unwrap();

		assert_eq!(bus.input(), !0);
		bus.drive(other, Level::Low);
		assert_eq!(bus.sample(other), Level::Low);
		assert_eq!(bus.sample(pins.sda), Level::High);

		bus.set_stuck_low(true);
		assert_eq!(bus.sample(pins.sda), Level::Low);
		bus.drive(pins.sda, Level::High);
		assert_eq!(bus.data_level(), Level::Low);
	}

	#[test]
	fn push_pull_high_is_reported() {
		let pins = pins();
		let mut bus = SimBus::new(pins.scl, pins.sda);
		bus.set_output(pins.scl.mask());
		assert_eq!(bus.open_drain_violations(), 0);
		bus.set_direction(pins.scl.mask());
		assert_eq!(bus.open_drain_violations(), 1);
	}

	#[test]
	fn busy_during_write_cycle() {
		let pins = pins();
		let mut bus = SimBus::new(pins.scl, pins.sda);
		bus.attach(SimEeprom::new(0xa0));

		bus.start_signal(pins);
		bus.send_device_address(pins, 0xa0, Direction::Write);
		bus.wait_ack(pins, 10).unwrap();
		bus.send_byte_address(pins, 0x01, 10).unwrap();
		bus.shift_out_byte(pins, 0x77);
		bus.wait_ack(pins, 10).unwrap();
		bus.stop_signal(pins);
		assert!(bus.eeprom(0).is_busy());

		// acknowledge polling: no ACK until the write cycle is over
		bus.start_signal(pins);
		bus.send_device_address(pins, 0xa0, Direction::Write);
		assert_eq!(bus.wait_ack(pins, 10), Err(Error::NoAck));

		let config = Config { write_cycle: Duration::from_millis(0), ..Config::default() };
		bus.init_i2c(pins, &config).unwrap();
		assert!(!bus.eeprom(0).is_busy());
		assert_eq!(bus.eeprom(0).memory()[0x01], 0x77);
	}

	#[test]
	fn start_aborts_page_write() {
		let pins = pins();
		let mut bus = SimBus::new(pins.scl, pins.sda);
		bus.attach(SimEeprom::new(0xa0));

		bus.start_signal(pins);
		bus.send_device_address(pins, 0xa0, Direction::Write);
		bus.wait_ack(pins, 10).unwrap();
		bus.send_byte_address(pins, 0x01, 10).unwrap();
		bus.shift_out_byte(pins, 0x77);
		bus.wait_ack(pins, 10).unwrap();
		bus.start_signal(pins);
		bus.stop_signal(pins);

		assert!(!bus.eeprom(0).is_busy());
		assert_eq!(bus.eeprom(0).memory()[0x01], 0xff);
	}
}

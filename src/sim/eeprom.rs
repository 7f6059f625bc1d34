use crate::gpio::Level;

/// Size of the memory array (24C02)
pub const MEMORY_SIZE: usize = 256;

/// Bytes buffered by a page write
pub const PAGE_SIZE: u8 = 16;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum State {
	// not addressed; waiting for START
	Idle,
	// receiving the device address
	Address,
	// pulling SDA low for the address ACK
	AddressAck { read: bool },
	// receiving the byte address
	ByteAddress,
	ByteAddressAck,
	// receiving data to write
	Data,
	DataAck,
	// sending data, SDA follows the current bit
	Transmit,
	// master drives the acknowledge bit
	MasterAck,
}

/// Device side of a 24Cxx style EEPROM, clocked by edges seen on the bus.
#[derive(Clone)]
pub struct SimEeprom {
	select: u8,
	memory: [u8; MEMORY_SIZE],
	pointer: u8,
	state: State,
	shift: u8,
	bits: u8,
	pending: Vec<(u8, u8)>,
	busy: bool,
	pull_low: bool,
	master_acked: bool,
}

impl SimEeprom {
	/// `select`: device address in 8-bit form (bit 0 ignored); memory starts
	/// out erased (0xff).
	pub fn new(select: u8) -> Self {
		SimEeprom {
			select: select & 0xfe,
			memory: [0xff; MEMORY_SIZE],
			pointer: 0,
			state: State::Idle,
			shift: 0,
			bits: 0,
			pending: Vec::new(),
			busy: false,
			pull_low: false,
			master_acked: false,
		}
	}

	pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
		&self.memory
	}

	pub fn memory_mut(&mut self) -> &mut [u8; MEMORY_SIZE] {
		&mut self.memory
	}

	/// in an internal write cycle; doesn't acknowledge its address
	pub fn is_busy(&self) -> bool {
		self.busy
	}

	pub(super) fn pulls_sda_low(&self) -> bool {
		self.pull_low
	}

	pub(super) fn finish_write_cycle(&mut self) {
		self.busy = false;
	}

	fn receive(&mut self, state: State) {
		self.state = state;
		self.shift = 0;
		self.bits = 0;
	}

	fn load_byte(&mut self) {
		self.state = State::Transmit;
		self.shift = self.memory[self.pointer as usize];
		self.bits = 0;
		self.pull_low = 0 == self.shift & 0x80;
	}

	pub(super) fn start(&mut self) {
		// an unfinished page write is dropped
		self.pending.clear();
		self.pull_low = false;
		self.receive(State::Address);
	}

	pub(super) fn stop(&mut self) {
		if !self.pending.is_empty() {
			for (address, byte) in self.pending.drain(..) {
				self.memory[address as usize] = byte;
			}
			self.busy = true;
		}
		self.pull_low = false;
		self.state = State::Idle;
	}

	pub(super) fn clock_rise(&mut self, sda: Level) {
		match self.state {
			State::Address | State::ByteAddress | State::Data => {
				if self.bits < 8 {
					self.shift = (self.shift << 1) | sda.is_high() as u8;
					self.bits += 1;
				}
			},
			State::MasterAck => {
				self.master_acked = Level::Low == sda;
			},
			_ => (),
		}
	}

	pub(super) fn clock_fall(&mut self) {
		match self.state {
			State::Address if 8 == self.bits => {
				if self.shift & 0xfe == self.select && !self.busy {
					self.pull_low = true;
					self.state = State::AddressAck { read: 0 != self.shift & 0x01 };
				} else {
					self.state = State::Idle;
				}
			},
			State::ByteAddress if 8 == self.bits => {
				self.pointer = self.shift;
				self.pull_low = true;
				self.state = State::ByteAddressAck;
			},
			State::Data if 8 == self.bits => {
				let pointer = self.pointer;
				self.pending.retain(|&(address, _)| address != pointer);
				self.pending.push((self.pointer, self.shift));
				// roll over within the page
				let page = self.pointer & !(PAGE_SIZE - 1);
				self.pointer = page | (self.pointer.wrapping_add(1) & (PAGE_SIZE - 1));
				self.pull_low = true;
				self.state = State::DataAck;
			},
			State::AddressAck { read } => {
				self.pull_low = false;
				if read {
					self.load_byte();
				} else {
					self.receive(State::ByteAddress);
				}
			},
			State::ByteAddressAck | State::DataAck => {
				self.pull_low = false;
				self.receive(State::Data);
			},
			State::Transmit => {
				self.bits += 1;
				if 8 == self.bits {
					self.pull_low = false;
					self.pointer = self.pointer.wrapping_add(1);
					self.state = State::MasterAck;
				} else {
					self.pull_low = 0 == self.shift & (0x80 >> self.bits);
				}
			},
			State::MasterAck => {
				if self.master_acked {
					self.load_byte();
				} else {
					self.state = State::Idle;
				}
			},
			_ => (),
		}
	}
}

use std::thread;
use std::time::{
	Duration,
	Instant,
};

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

/// Register model of a GPIO port: three parallel bit vectors over the same
/// line space.
///
/// - direction: bit set = line is driven, bit clear = line floats (input)
/// - output: level driven on a line; only meaningful while direction is set
/// - input: electrical level observed on the line, whoever drives it
pub trait RegisterBank {
	fn direction(&mut self) -> u32;
	fn set_direction(&mut self, value: u32);

	fn output(&mut self) -> u32;
	fn set_output(&mut self, value: u32);

	fn input(&mut self) -> u32;

	// give the remote device time to finish internal work (e.g. an EEPROM
	// write cycle)
	fn settle(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}

impl<'a, R: ?Sized + RegisterBank> RegisterBank for &'a mut R {
	fn direction(&mut self) -> u32 {
		R::direction(*self)
	}
	fn set_direction(&mut self, value: u32) {
		R::set_direction(*self, value)
	}
	fn output(&mut self) -> u32 {
		R::output(*self)
	}
	fn set_output(&mut self, value: u32) {
		R::set_output(*self, value)
	}
	fn input(&mut self) -> u32 {
		R::input(*self)
	}
	fn settle(&mut self, duration: Duration) {
		R::settle(*self, duration)
	}
}

impl<R: ?Sized + RegisterBank> RegisterBank for Box<R> {
	fn direction(&mut self) -> u32 {
		R::direction(self)
	}
	fn set_direction(&mut self, value: u32) {
		R::set_direction(self, value)
	}
	fn output(&mut self) -> u32 {
		R::output(self)
	}
	fn set_output(&mut self, value: u32) {
		R::set_output(self, value)
	}
	fn input(&mut self) -> u32 {
		R::input(self)
	}
	fn settle(&mut self, duration: Duration) {
		R::settle(self, duration)
	}
}

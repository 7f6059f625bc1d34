use crate::gpio::RegisterBank;
use crate::i2c::{
	Device,
	Master,
};

/// 24Cxx device address (8-bit form)
pub const BASE_ADDRESS: u8 = 0xA0;

// page offsets of devices sharing a bus
pub const PAGE_0: u8 = 0; // 0xA0
pub const PAGE_1: u8 = 2; // 0xA2
pub const PAGE_2: u8 = 4; // 0xA4

/// Largest page write of 4K/8K/16K parts (1K/2K parts: 8)
pub const WRITE_PAGE_SIZE: usize = 16;

/// Size of the memory array addressed by an 8-bit byte address
pub const READ_PAGE_SIZE: usize = 256;

/// Write `data` starting at `start`, one page write per page touched, and
/// verify it by reading everything back.
pub fn program<R>(master: &mut Master<R>, device: Device, start: u8, data: &[u8]) -> crate::AResult<()>
where
	R: RegisterBank,
{
	ensure!(start as usize + data.len() <= READ_PAGE_SIZE,
		"{} bytes at 0x{:02x} don't fit into {} bytes", data.len(), start, READ_PAGE_SIZE
	);

	let mut address = start as usize;
	for chunk in split_pages(start, data) {
		with_context!(("{}: page write at 0x{:02x} failed", device, address),
			Ok(master.write_page(device, address as u8, chunk)?)
		)?;
		address += chunk.len();
	}

	let flash = with_context!(("{}: reading back failed", device),
		Ok(master.read_page(device, start, data.len())?)
	)?;
	for (offset, (&expected, &actual)) in data.iter().zip(flash.iter()).enumerate() {
		ensure!(expected == actual,
			"Verify failed at {:02x}: expected {:02x}, EEPROM has {:02x}", start as usize + offset, expected, actual
		);
	}

	info!("{}: programmed {} bytes at 0x{:02x}", device, data.len(), start);
	Ok(())
}

/// Read the whole memory array.
pub fn dump<R>(master: &mut Master<R>, device: Device) -> crate::AResult<Vec<u8>>
where
	R: RegisterBank,
{
	Ok(master.read_page(device, 0, READ_PAGE_SIZE)?)
}

// chunks of `data` not crossing a page boundary
fn split_pages(start: u8, data: &[u8]) -> Vec<&[u8]> {
	let mut chunks = Vec::new();
	let mut address = start as usize;
	let mut rest = data;
	while !rest.is_empty() {
		let room = WRITE_PAGE_SIZE - address % WRITE_PAGE_SIZE;
		let (chunk, tail) = rest.split_at(room.min(rest.len()));
		chunks.push(chunk);
		address += chunk.len();
		rest = tail;
	}
	chunks
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::gpio::Line;
	use crate::i2c::Config;
	use crate::sim::{
		BusEvent,
		SimBus,
		SimEeprom,
	};
	use std::time::Duration;

	fn setup() -> (Master<SimBus>, Device) {
		let device = Device::new(Line::new(11).unwrap(), Line::new(12).unwrap(), BASE_ADDRESS, PAGE_1);
		let mut bus = SimBus::new(device.scl, device.sda);
		bus.attach(SimEeprom::new(BASE_ADDRESS + PAGE_1));
		let config = Config { write_cycle: Duration::from_millis(0), ..Config::default() };
		(Master::with_config(bus, config), device)
	}

	#[test]
	fn chunks_follow_page_boundaries() {
		let data = [0u8; 40];
		let lens: Vec<usize> = split_pages(0x0c, &data).iter().map(|c| c.len()).collect();
		assert_eq!(lens, vec![4, 16, 16, 4]);

		let lens: Vec<usize> = split_pages(0x00, &data[..16]).iter().map(|c| c.len()).collect();
		assert_eq!(lens, vec![16]);

		assert!(split_pages(0x10, &[]).is_empty());
	}

	#[test]
	fn program_across_pages() {
		let (mut master, device) = setup();
		let data: Vec<u8> = (0..50u8).map(|i| i.wrapping_mul(37)).collect();

		master.registers_mut().clear_events();
		program(&mut master, device, 0x0a, &data).unwrap();

		// 4 page writes, 1 read back
		let starts = master.registers().events().iter().filter(|e| **e == BusEvent::Start).count();
		assert_eq!(starts, 4 + 2);

		let image = dump(&mut master, device).unwrap();
		assert_eq!(&image[0x0a..0x0a + 50], &data[..]);
		assert_eq!(image[0x09], 0xff);
		assert_eq!(image[0x0a + 50], 0xff);
	}

	#[test]
	fn program_rejects_overflow() {
		let (mut master, device) = setup();
		assert!(program(&mut master, device, 0xf8, &[0u8; 9]).is_err());
		assert!(program(&mut master, device, 0xf8, &[0u8; 8]).is_ok());
	}

	#[test]
	fn program_reports_missing_device() {
		let (mut master, mut device) = setup();
		device.page = PAGE_2;
		let e = program(&mut master, device, 0, &[1, 2, 3]).unwrap_err();
		assert!(format!("{}", e).contains("page write at 0x00 failed"));
	}
}

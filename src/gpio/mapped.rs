use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::io::{
	FromRawFd,
};
use std::ptr;

use libc::{
	MAP_SHARED,
	O_CLOEXEC,
	O_RDWR,
	O_SYNC,
	PROT_READ,
	PROT_WRITE,
	_SC_PAGESIZE,
	c_void,
	mmap,
	munmap,
	off_t,
	open,
	sysconf,
};

use super::RegisterBank;

/// Byte offsets of the 32-bit registers within the mapped window
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct RegisterLayout {
	pub direction: usize,
	pub output: usize,
	pub input: usize,
}

#[derive(Debug)]
pub struct MappedRegisters {
	ptr: ptr::NonNull<u8>, // u8 instead of void for easier offset operations
	len: usize,
	layout: RegisterLayout,
}

impl Drop for MappedRegisters {
	fn drop(&mut self) {
		unsafe {
			let res = munmap(
				self.ptr.as_ptr() as *mut c_void,
				self.len,
			);
			if 0 != res {
				panic!("munmap failed: {}", io::Error::last_os_error());
			}
		}
	}
}

impl MappedRegisters {
	pub fn len(&self) -> usize {
		self.len
	}

	pub fn layout(&self) -> RegisterLayout {
		self.layout
	}

	fn read_dword(&self, offset: usize) -> u32 {
		assert!(offset & 3 == 0);
		assert!(offset + 3 < self.len);
		unsafe { ptr::read_volatile(self.ptr.as_ptr().add(offset) as *const u32) }
	}

	fn write_dword(&mut self, offset: usize, data: u32) {
		assert!(offset & 3 == 0);
		assert!(offset + 3 < self.len);
		unsafe { ptr::write_volatile(self.ptr.as_ptr().add(offset) as *mut u32, data) }
	}
}

impl RegisterBank for MappedRegisters {
	fn direction(&mut self) -> u32 {
		self.read_dword(self.layout.direction)
	}

	fn set_direction(&mut self, value: u32) {
		let offset = self.layout.direction;
		self.write_dword(offset, value)
	}

	fn output(&mut self) -> u32 {
		self.read_dword(self.layout.output)
	}

	fn set_output(&mut self, value: u32) {
		let offset = self.layout.output;
		self.write_dword(offset, value)
	}

	fn input(&mut self) -> u32 {
		self.read_dword(self.layout.input)
	}
}

fn check_register(name: &str, offset: usize, len: usize) -> crate::AResult<()> {
	ensure!(offset & 3 == 0, "{} register offset 0x{:x} not 32-bit aligned", name, offset);
	ensure!(offset + 4 <= len, "{} register offset 0x{:x} outside mapped window (0x{:x} bytes)", name, offset, len);
	Ok(())
}

// TODO: exclusive open / file locking?
/// Map `len` bytes at `offset` of a device file (`/dev/mem`, `/dev/uioN`,
/// ...) containing the GPIO port registers.
pub fn open_mapped(path: &str, offset: u64, len: usize, layout: RegisterLayout) -> crate::AResult<MappedRegisters> {
	check_register("direction", layout.direction, len)?;
	check_register("output", layout.output, len)?;
	check_register("input", layout.input, len)?;

	let page_size = unsafe { sysconf(_SC_PAGESIZE) } as u64;
	ensure!(0 == offset % page_size, "map offset 0x{:x} not aligned to page size 0x{:x}", offset, page_size);

	with_context!(("couldn't map GPIO registers from {}", path), {
		let c_path = CString::new(path)?;

		let fd = unsafe { open(c_path.as_ptr(), O_RDWR | O_CLOEXEC | O_SYNC) };
		if -1 == fd {
			return Err(failure::Error::from(io::Error::last_os_error()));
		}
		// now get fd managed to prevent resource leak; mapping stays valid after close
		let _f = unsafe { fs::File::from_raw_fd(fd) };

		let area = unsafe {
			mmap(
				ptr::null_mut(),
				len,
				PROT_READ | PROT_WRITE,
				MAP_SHARED,
				fd,
				offset as off_t,
			)
		};

		if area as usize == !0usize {
			return Err(failure::Error::from(io::Error::last_os_error()));
		}
		match ptr::NonNull::new(area as *mut u8) {
			None => bail!("mmap returned NULL"),
			Some(area) => {
				debug!("mapped {} bytes of {} at offset 0x{:x}", len, path, offset);
				Ok(MappedRegisters {
					ptr: area,
					len,
					layout,
				})
			},
		}
	})
}

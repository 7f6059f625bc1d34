#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate gpio_i2c_eeprom;
use gpio_i2c_eeprom::*;

use std::fs;
use std::process::exit;
use std::time::Duration;

use gpio_i2c_eeprom::gpio::{
	Line,
	RegisterBank,
	RegisterLayout,
};
use gpio_i2c_eeprom::i2c::{
	Config,
	Device,
	LowLevel,
	Master,
};

const DEFAULT_SCL: u8 = 11;
const DEFAULT_SDA: u8 = 12;
const DEFAULT_MAP_LENGTH: u64 = 4096;

type Registers = Box<dyn RegisterBank>;

// decimal or 0x-prefixed hex
fn parse_number(s: &str) -> AResult<u64> {
	let r = if s.starts_with("0x") || s.starts_with("0X") {
		u64::from_str_radix(&s[2..], 16)
	} else {
		s.parse::<u64>()
	};
	r.map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid number {:?}: {}", s, e);
		e.context(msg).into()
	})
}

fn get_number(matches: &clap::ArgMatches, name: &str, default: Option<u64>, max: u64) -> AResult<u64> {
	let value = match (matches.value_of(name), default) {
		(Some(p), _) => parse_number(p).map_err(|e| {
			let msg = format!("invalid parameter {}: {}", name, e);
			failure::Error::from(e.context(msg))
		})?,
		(None, Some(d)) => d,
		(None, None) => bail!("missing parameter {}", name),
	};
	ensure!(value <= max, "invalid parameter {}: {} (maximum {})", name, value, max);
	Ok(value)
}

fn get_byte(matches: &clap::ArgMatches, name: &str, default: Option<u8>) -> AResult<u8> {
	Ok(get_number(matches, name, default.map(u64::from), 0xff)? as u8)
}

fn get_line(matches: &clap::ArgMatches, name: &str, default: u8) -> AResult<Line> {
	match matches.value_of(name) {
		Some(p) => p.parse::<Line>(),
		None => Line::new(default),
	}
}

fn get_config(matches: &clap::ArgMatches) -> AResult<Config> {
	let defaults = Config::default();
	let max = u64::from(u32::max_value());
	Ok(Config {
		ack_timeout: get_number(matches, "ack_timeout", Some(u64::from(defaults.ack_timeout)), max)? as u32,
		bus_timeout: get_number(matches, "bus_timeout", Some(u64::from(defaults.bus_timeout)), max)? as u32,
		write_cycle: Duration::from_millis(
			get_number(matches, "write_cycle", Some(defaults.write_cycle.as_millis() as u64), 60_000)?
		),
	})
}

fn get_device(matches: &clap::ArgMatches) -> AResult<Device> {
	Ok(Device::new(
		get_line(matches, "scl", DEFAULT_SCL)?,
		get_line(matches, "sda", DEFAULT_SDA)?,
		get_byte(matches, "address", Some(eeprom::BASE_ADDRESS))?,
		get_byte(matches, "page", Some(eeprom::PAGE_0))?,
	))
}

fn open_registers(matches: &clap::ArgMatches, device: Device) -> AResult<Registers> {
	if matches.is_present("simulate") {
		info!("Using simulated EEPROM for {}", device);
		let mut bus = sim::SimBus::new(device.scl, device.sda);
		bus.attach(sim::SimEeprom::new(device.select()));
		return Ok(Box::new(bus));
	}

	let path = match matches.value_of("map") {
		Some(p) => p,
		None => bail!("need either --simulate or --map"),
	};
	let max = u64::from(u32::max_value());
	let offset = get_number(matches, "offset", Some(0), u64::max_value())?;
	let len = get_number(matches, "length", Some(DEFAULT_MAP_LENGTH), max)? as usize;
	let layout = RegisterLayout {
		direction: get_number(matches, "direction", None, max)? as usize,
		output: get_number(matches, "output", None, max)? as usize,
		input: get_number(matches, "input", None, max)? as usize,
	};

	Ok(Box::new(gpio::open_mapped(path, offset, len, layout)?))
}

fn print_hex(start: usize, data: &[u8]) {
	for (i, chunk) in data.chunks(16).enumerate() {
		print!("{:02x}:", start + i * 16);
		for byte in chunk {
			print!(" {:02x}", byte);
		}
		println!();
	}
}

fn dump(master: &mut Master<Registers>, device: Device) -> AResult<()> {
	let image = eeprom::dump(master, device)?;
	print_hex(0, &image);
	Ok(())
}

fn read(master: &mut Master<Registers>, device: Device, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_byte(sub_m, "ADDRESS", None)?;
	let count = get_number(sub_m, "COUNT", Some(1), eeprom::READ_PAGE_SIZE as u64)? as usize;

	let data = if 1 == count {
		vec![master.read_byte(device, address)?]
	} else {
		master.read_page(device, address, count)?
	};
	print_hex(address as usize, &data);
	Ok(())
}

fn write(master: &mut Master<Registers>, device: Device, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_byte(sub_m, "ADDRESS", None)?;
	let mut data = Vec::new();
	for value in sub_m.values_of("BYTES").into_iter().flatten() {
		let value = parse_number(value)?;
		ensure!(value <= 0xff, "not a byte: {}", value);
		data.push(value as u8);
	}
	if data.len() > eeprom::WRITE_PAGE_SIZE {
		warn!("Writing {} bytes in one page write; the device wraps around after {}", data.len(), eeprom::WRITE_PAGE_SIZE);
	}

	if 1 == data.len() {
		master.write_byte(device, address, data[0])?;
	} else {
		master.write_page(device, address, &data)?;
	}
	Ok(())
}

fn program(master: &mut Master<Registers>, device: Device, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = get_byte(sub_m, "ADDRESS", None)?;
	let file = match sub_m.value_of("FILE") {
		Some(f) => f,
		None => bail!("missing parameter FILE"),
	};
	let data = fs::read(file).map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("couldn't read {}: {}", file, e);
		failure::Error::from(e.context(msg))
	})?;

	eeprom::program(master, device, address, &data)
}

// write a page of 0..15 at 0x00, then read back the whole array
fn demo(master: &mut Master<Registers>, device: Device) -> AResult<()> {
	let page: Vec<u8> = (0..eeprom::WRITE_PAGE_SIZE as u8).collect();
	master.write_page(device, 0x00, &page)?;

	let image = master.read_page(device, 0x00, eeprom::READ_PAGE_SIZE)?;
	print_hex(0, &image);
	Ok(())
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg simulate: --simulate "use a simulated 24C02 instead of hardware")
		(@arg map: --map +takes_value "device file with the GPIO registers (e.g. /dev/mem)")
		(@arg offset: --offset +takes_value "offset of the register window in the device file (page aligned)")
		(@arg length: --length +takes_value "length of the register window")
		(@arg direction: --direction +takes_value "offset of the direction register in the window")
		(@arg output: --output +takes_value "offset of the output register in the window")
		(@arg input: --input +takes_value "offset of the input register in the window")
		(@arg scl: --scl +takes_value "SCL line (default 11)")
		(@arg sda: --sda +takes_value "SDA line (default 12)")
		(@arg address: --address +takes_value "EEPROM base address (default 0xA0)")
		(@arg page: --page +takes_value "page offset added to the base address (default 0)")
		(@arg ack_timeout: --ack_timeout +takes_value "polls while waiting for ACK (default 100)")
		(@arg bus_timeout: --bus_timeout +takes_value "polls while waiting for an idle bus (default 100)")
		(@arg write_cycle: --write_cycle +takes_value "pause in ms before each transaction (default 10)")
		(@subcommand dump =>
			(about: "hex dump the whole EEPROM")
		)
		(@subcommand read =>
			(about: "read bytes")
			(@arg ADDRESS: +required "byte address")
			(@arg COUNT: "number of bytes (default 1)")
		)
		(@subcommand write =>
			(about: "write bytes in a single page write")
			(@arg ADDRESS: +required "byte address")
			(@arg BYTES: +required +multiple "bytes to write")
		)
		(@subcommand program =>
			(about: "write a binary file page by page and verify it")
			(@arg ADDRESS: +required "byte address")
			(@arg FILE: +required "binary file")
		)
		(@subcommand demo =>
			(about: "write 0..15 at 0x00 and dump the EEPROM")
		)
	).get_matches();

	let device = get_device(&matches)?;
	let config = get_config(&matches)?;
	let registers = open_registers(&matches, device)?;
	let mut master = Master::with_config(registers, config);
	master.registers_mut().init_gpio(device.pins());

	match matches.subcommand() {
		("dump", _) => {
			dump(&mut master, device)
		}
		("read", Some(sub_m)) => {
			read(&mut master, device, sub_m)
		}
		("write", Some(sub_m)) => {
			write(&mut master, device, sub_m)
		}
		("program", Some(sub_m)) => {
			program(&mut master, device, sub_m)
		}
		("demo", _) => {
			demo(&mut master, device)
		}
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}

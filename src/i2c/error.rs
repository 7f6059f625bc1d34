use failure::Fail;

/// Failure of a single primitive; the transaction it belongs to is abandoned.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Fail)]
pub enum Error {
	/// SDA didn't read high within the bus timeout before the transaction
	#[fail(display = "SDA stuck low")]
	BusStuckLow,
	/// device didn't pull SDA low within the ACK timeout
	#[fail(display = "no ACK from device")]
	NoAck,
	/// device pulled SDA low although the transfer was expected to end
	#[fail(display = "unexpected ACK from device")]
	UnexpectedAck,
}

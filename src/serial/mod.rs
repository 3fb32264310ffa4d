//! Serial port handling: connection management and the pulse reader thread.

pub mod port;
pub mod reader;

pub use port::{PortConfig, SerialConnection};
pub use reader::PulseReader;

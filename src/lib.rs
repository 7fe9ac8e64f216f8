pub mod env;
pub mod log;
mod util;

pub use util::{Checksum, Crc32c, Error, Result};

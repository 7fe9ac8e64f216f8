mod coding;
pub(crate) mod crc32c;
#[cfg(test)]
mod random;
mod result;

pub use self::crc32c::{Checksum, Crc32c};
pub use coding::*;
#[cfg(test)]
pub use random::Random;
pub use result::{Error, Result};

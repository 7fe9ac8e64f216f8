//! Log format shared by reader and writer.
//!
//! The log is a sequence of 32KB blocks.  Each block holds physical
//! records of the form
//!
//! ```text
//! checksum: u32   // masked crc32c of type and data[], little-endian
//! length: u16     // little-endian
//! type: u8        // One of Full, First, Middle, Last
//! data: u8[length]
//! ```
//!
//! A record never starts within the last six bytes of a block; those
//! bytes form a zero-filled trailer that readers skip.

mod reader;
mod writer;

pub use reader::{Reader, Reporter};
pub use writer::Writer;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum RecordType {
    Full = 1,

    // For fragments
    First = 2,
    Middle = 3,
    Last = 4,
}

impl TryFrom<u8> for RecordType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        match value {
            1 => Ok(Self::Full),
            2 => Ok(Self::First),
            3 => Ok(Self::Middle),
            4 => Ok(Self::Last),
            _ => Err(value),
        }
    }
}

/// Type byte reserved for preallocated files.
pub const ZERO_TYPE: u8 = 0;

pub const MAX_RECORD_TYPE: RecordType = RecordType::Last;

pub const BLOCK_SIZE: usize = 32768;

/// Header is checksum (4 bytes), length (2 bytes), type (1 byte).
pub const HEADER_SIZE: usize = 4 + 2 + 1;

const MASK_DELTA: u32 = 0xa282ead8;

/// Return the crc32c of concat(A, data[0..n-1]) where init_crc is the
/// crc32c of some string A.
pub fn extend(init_crc: u32, data: &[u8]) -> u32 {
    ::crc32c::crc32c_append(init_crc, data)
}

pub fn value(data: &[u8]) -> u32 {
    ::crc32c::crc32c(data)
}

//. It is problematic to compute the CRC of a string that
//. contains embedded CRCs.  Therefore we recommend that CRCs stored
//. somewhere (e.g., in files) should be masked before being stored.
pub fn mask(crc: u32) -> u32 {
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}

pub fn unmask(masked_crc: u32) -> u32 {
    let rot = masked_crc.wrapping_sub(MASK_DELTA);
    (rot >> 17) | (rot << 15)
}

/// Checksum used to protect physical log records.
///
/// `mask` must stay injective and `unmask` must invert it, since readers
/// compare `unmask(stored)` against a freshly computed checksum.
pub trait Checksum {
    fn value(data: &[u8]) -> u32;

    fn extend(init_crc: u32, data: &[u8]) -> u32;

    fn mask(crc: u32) -> u32 {
        mask(crc)
    }

    fn unmask(masked_crc: u32) -> u32 {
        unmask(masked_crc)
    }
}

/// CRC-32C (Castagnoli), the checksum of the on-disk log format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32c;

impl Checksum for Crc32c {
    fn value(data: &[u8]) -> u32 {
        value(data)
    }

    fn extend(init_crc: u32, data: &[u8]) -> u32 {
        extend(init_crc, data)
    }
}

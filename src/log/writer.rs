use std::{cell::RefCell, marker::PhantomData, rc::Rc};

use super::{RecordType, BLOCK_SIZE, HEADER_SIZE, MAX_RECORD_TYPE};
use crate::{
    env::WritableFile,
    util::{encode_fixed16, encode_fixed32, Checksum, Crc32c, Result},
};

/// Frames logical records into the block format and appends them to `dest`.
///
/// The destination is owned by the caller.  A writer must not be shared
/// between threads without external synchronization.
pub struct Writer<C: Checksum = Crc32c> {
    dest: Rc<RefCell<dyn WritableFile>>,
    /// Current offset in block
    block_offset: usize,
    /// crc32c values for all supported record types.  These are
    /// pre-computed to reduce the overhead of computing the crc of the
    /// record type stored in the header.
    type_crc: [u32; MAX_RECORD_TYPE as usize + 1],
    _checksum: PhantomData<C>,
}

impl Writer {
    /// Create a writer that will append data to "dest".
    /// "dest" must be initially empty.
    pub fn new(dest: Rc<RefCell<dyn WritableFile>>) -> Self {
        Self::new_at(dest, 0)
    }

    /// Create a writer that will append data to "dest".
    /// "dest" must have initial length "dest_len".
    pub fn new_at(dest: Rc<RefCell<dyn WritableFile>>, dest_len: u64) -> Self {
        Self::with_checksum(dest, dest_len)
    }
}

impl<C: Checksum> Writer<C> {
    pub fn with_checksum(dest: Rc<RefCell<dyn WritableFile>>, dest_len: u64) -> Self {
        let mut type_crc = [0; MAX_RECORD_TYPE as usize + 1];
        for (index, crc) in type_crc.iter_mut().enumerate() {
            *crc = C::value(&[index as u8]);
        }
        let block_offset = (dest_len % BLOCK_SIZE as u64) as usize;
        tracing::debug!(dest_len, block_offset, "log writer created");
        Self {
            dest,
            block_offset,
            type_crc,
            _checksum: PhantomData,
        }
    }

    pub fn block_offset(&self) -> usize {
        self.block_offset
    }

    pub fn add_record(&mut self, slice: &[u8]) -> Result<()> {
        let mut slice_left = slice;
        // Fragment the record if necessary and emit it.  Note that if slice
        // is empty, we still want to iterate once to emit a single
        // zero-length record
        let mut begin = true;
        loop {
            let leftover = BLOCK_SIZE - self.block_offset;
            if leftover < HEADER_SIZE {
                // Switch to a new block
                if leftover > 0 {
                    // Fill the trailer
                    let trailer = [0; HEADER_SIZE - 1];
                    if let Err(error) = self.dest.borrow_mut().append(&trailer[..leftover]) {
                        tracing::warn!(leftover, %error, "failed to pad block trailer");
                    }
                }
                tracing::debug!(padding = leftover, "switching to a new block");
                self.block_offset = 0;
            }

            // Invariant: we never leave < HEADER_SIZE bytes in a block.
            let avail = BLOCK_SIZE - self.block_offset - HEADER_SIZE;
            let fragment_length = slice_left.len().min(avail);
            let end = fragment_length == slice_left.len();
            let type_ = match (begin, end) {
                (true, true) => RecordType::Full,
                (true, false) => RecordType::First,
                (false, true) => RecordType::Last,
                (false, false) => RecordType::Middle,
            };
            let (fragment, rest) = slice_left.split_at(fragment_length);
            self.emit_physical_record(type_, fragment)?;
            slice_left = rest;
            begin = false;
            if slice_left.is_empty() {
                break Ok(());
            }
        }
    }

    fn emit_physical_record(&mut self, type_: RecordType, data: &[u8]) -> Result<()> {
        // Must fit in two bytes
        assert!(data.len() <= 0xffff, "physical record too long");
        assert!(
            self.block_offset + HEADER_SIZE + data.len() <= BLOCK_SIZE,
            "physical record overruns block"
        );

        // Format the header
        let mut buf = [0; HEADER_SIZE];
        encode_fixed16(&mut buf[4..6], data.len() as u16);
        buf[6] = type_ as u8;

        // Compute the crc of the record type and the payload.
        let crc = C::extend(self.type_crc[type_ as usize], data);
        // Adjust for storage
        encode_fixed32(&mut buf[0..4], C::mask(crc));

        // Write the header and the payload
        let result = {
            let mut dest = self.dest.borrow_mut();
            let mut result = dest.append(&buf);
            if result.is_ok() {
                result = dest.append(data);
                if result.is_ok() {
                    result = dest.flush();
                }
            }
            result
        };
        tracing::trace!(
            record_type = ?type_,
            len = data.len(),
            block_offset = self.block_offset,
            "emitted physical record"
        );
        if let Err(error) = &result {
            tracing::warn!(
                record_type = ?type_,
                len = data.len(),
                %error,
                "physical record write failed"
            );
        }
        // Advance even on failure so block bookkeeping matches what was attempted.
        self.block_offset += HEADER_SIZE + data.len();
        result
    }
}

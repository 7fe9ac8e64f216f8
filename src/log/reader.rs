use std::{cell::RefCell, marker::PhantomData, ops::Range, rc::Rc};

use super::{RecordType, BLOCK_SIZE, HEADER_SIZE, ZERO_TYPE};
use crate::{
    env::SequentialFile,
    util::{decode_fixed16, decode_fixed32, Checksum, Crc32c, Error},
};

/// Outcome of reading one physical record.
#[derive(Debug)]
enum PhysicalRecord {
    /// A record with a valid header; the payload is `backing_store[range]`.
    Record(RecordType, Range<usize>),
    /// A record whose type byte is zero or not a known record type.
    Unknown(u8, Range<usize>),
    Eof,
    /// Returned whenever we find an invalid physical record.
    /// Currently there are three situations in which this happens:
    /// * The record has an invalid CRC (read_physical_record reports a drop)
    /// * The record is a 0-length record (No drop is reported)
    /// * The record is below constructor's initial_offset (No drop is reported)
    BadRecord,
}

/// Interface for reporting errors.
pub trait Reporter {
    /// Some corruption was detected.  "bytes" is the approximate number
    /// of bytes dropped due to the corruption.
    fn corruption(&mut self, bytes: usize, error: &Error);
}

pub struct Reader<C: Checksum = Crc32c> {
    file: Rc<RefCell<dyn SequentialFile>>,
    reporter: Option<Rc<RefCell<dyn Reporter>>>,
    checksum: bool,
    backing_store: Box<[u8]>,
    scratch: Vec<u8>,
    /// Unconsumed part of backing_store.
    buffer_range: Range<usize>,
    /// Last read() indicated EOF by returning < BLOCK_SIZE
    eof: bool,
    /// Offset of the last record returned by read_record.
    last_record_offset: usize,
    /// Offset of the first location past the end of buffer.
    end_of_buffer_offset: usize,
    /// Offset at which to start looking for the first record to return
    initial_offset: usize,
    /// True if we are resynchronizing after a seek (initial_offset > 0). In
    /// particular, a run of Middle and Last records can be silently
    /// skipped in this mode
    resyncing: bool,
    _checksum: PhantomData<C>,
}

impl Reader {
    /// Create a reader that will return log records from "file".
    ///
    /// If "reporter" is given, it is notified whenever some data is
    /// dropped due to a detected corruption.
    ///
    /// If "checksum" is true, verify checksums if available.
    ///
    /// The Reader will start reading at the first record located at physical
    /// position >= initial_offset within the file.
    pub fn new(
        file: Rc<RefCell<dyn SequentialFile>>,
        initial_offset: usize,
        checksum: bool,
        reporter: Option<Rc<RefCell<dyn Reporter>>>,
    ) -> Self {
        Self::with_checksum(file, initial_offset, checksum, reporter)
    }
}

impl<C: Checksum> Reader<C> {
    pub fn with_checksum(
        file: Rc<RefCell<dyn SequentialFile>>,
        initial_offset: usize,
        checksum: bool,
        reporter: Option<Rc<RefCell<dyn Reporter>>>,
    ) -> Self {
        Self {
            file,
            reporter,
            checksum,
            backing_store: vec![0; BLOCK_SIZE].into_boxed_slice(),
            scratch: vec![],
            buffer_range: 0..0,
            eof: false,
            last_record_offset: 0,
            end_of_buffer_offset: 0,
            initial_offset,
            resyncing: initial_offset > 0,
            _checksum: PhantomData,
        }
    }

    /// Read the next record.  Returns None at end of input.  The returned
    /// slice is valid until the next call to read_record.
    pub fn read_record(&mut self) -> Option<&[u8]> {
        if self.last_record_offset < self.initial_offset && !self.skip_to_initial_block() {
            return None;
        }

        self.scratch.clear();
        let mut in_fragmented_record = false;
        // Record offset of the logical record that we're reading
        let mut prospective_record_offset = 0;

        loop {
            let record = self.read_physical_record();
            let fragment_len = match &record {
                PhysicalRecord::Record(_, range) | PhysicalRecord::Unknown(_, range) => {
                    range.len()
                }
                _ => 0,
            };
            // read_physical_record may have only had an empty trailer remaining in its
            // internal buffer. Calculate the offset of the next physical record now
            // that it has returned, properly accounting for its header size.
            let physical_record_offset = self
                .end_of_buffer_offset
                .wrapping_sub(self.buffer_range.len() + HEADER_SIZE + fragment_len);

            if self.resyncing {
                match record {
                    PhysicalRecord::Record(RecordType::Middle, _) => continue,
                    PhysicalRecord::Record(RecordType::Last, _) => {
                        self.resyncing = false;
                        continue;
                    }
                    PhysicalRecord::Record(..) | PhysicalRecord::Unknown(..) => {
                        self.resyncing = false
                    }
                    PhysicalRecord::Eof | PhysicalRecord::BadRecord => {}
                }
            }

            match record {
                PhysicalRecord::Record(RecordType::Full, range) => {
                    if in_fragmented_record && !self.scratch.is_empty() {
                        // Handle bug in earlier versions of log::Writer where
                        // it could emit an empty First record at the tail end
                        // of a block followed by a Full or First record at the
                        // beginning of the next block.
                        self.report_corruption(self.scratch.len(), "partial record without end(1)");
                    }
                    prospective_record_offset = physical_record_offset;
                    self.scratch.clear();
                    self.last_record_offset = prospective_record_offset;
                    return Some(&self.backing_store[range]);
                }
                PhysicalRecord::Record(RecordType::First, range) => {
                    if in_fragmented_record && !self.scratch.is_empty() {
                        self.report_corruption(self.scratch.len(), "partial record without end(2)");
                    }
                    prospective_record_offset = physical_record_offset;
                    self.scratch.clear();
                    self.scratch.extend_from_slice(&self.backing_store[range]);
                    in_fragmented_record = true;
                }
                PhysicalRecord::Record(RecordType::Middle, range) => {
                    if !in_fragmented_record {
                        self.report_corruption(
                            range.len(),
                            "missing start of fragmented record(1)",
                        );
                    } else {
                        self.scratch.extend_from_slice(&self.backing_store[range]);
                    }
                }
                PhysicalRecord::Record(RecordType::Last, range) => {
                    if !in_fragmented_record {
                        self.report_corruption(
                            range.len(),
                            "missing start of fragmented record(2)",
                        );
                    } else {
                        self.scratch.extend_from_slice(&self.backing_store[range]);
                        self.last_record_offset = prospective_record_offset;
                        return Some(&self.scratch);
                    }
                }
                PhysicalRecord::Eof => {
                    if in_fragmented_record {
                        // This can be caused by the writer dying immediately after
                        // writing a physical record but before completing the next; don't
                        // treat it as a corruption, just ignore the entire logical record.
                        self.scratch.clear();
                    }
                    return None;
                }
                PhysicalRecord::BadRecord => {
                    if in_fragmented_record {
                        self.report_corruption(self.scratch.len(), "error in middle of record");
                        in_fragmented_record = false;
                        self.scratch.clear();
                    }
                }
                PhysicalRecord::Unknown(record_type, range) => {
                    let drop_size = if in_fragmented_record {
                        self.scratch.len() + range.len()
                    } else {
                        range.len()
                    };
                    self.report_corruption(
                        drop_size,
                        &format!("unknown record type {}", record_type),
                    );
                    in_fragmented_record = false;
                    self.scratch.clear();
                }
            }
        }
    }

    /// Returns the physical offset of the last record returned by
    /// read_record.
    ///
    /// Undefined before the first call to read_record.
    pub fn last_record_offset(&self) -> usize {
        self.last_record_offset
    }

    /// Skips all blocks that are completely before "initial_offset".
    /// Returns true on success. Handles reporting.
    fn skip_to_initial_block(&mut self) -> bool {
        let offset_in_block = self.initial_offset % BLOCK_SIZE;
        let mut block_start_location = self.initial_offset - offset_in_block;
        // Don't search a block if we'd be in the trailer
        if offset_in_block > BLOCK_SIZE - 6 {
            block_start_location += BLOCK_SIZE;
        }
        self.end_of_buffer_offset = block_start_location;
        // Skip to start of first block that can contain the initial record
        if block_start_location > 0 {
            let result = self.file.borrow_mut().skip(block_start_location);
            if let Err(error) = result {
                self.report_drop(block_start_location, &error);
                return false;
            }
        }
        true
    }

    fn read_physical_record(&mut self) -> PhysicalRecord {
        loop {
            if self.buffer_range.len() < HEADER_SIZE {
                if !self.eof {
                    // Last read was a full read, so this is a trailer to skip
                    self.buffer_range = 0..0;
                    let result = self.file.borrow_mut().read(&mut self.backing_store);
                    match result {
                        Ok(read_size) => {
                            self.buffer_range = 0..read_size;
                            self.end_of_buffer_offset += read_size;
                            if read_size < BLOCK_SIZE {
                                self.eof = true;
                            }
                        }
                        Err(error) => {
                            self.report_drop(BLOCK_SIZE, &error);
                            self.eof = true;
                            return PhysicalRecord::Eof;
                        }
                    }
                    continue;
                } else {
                    // Note that if buffer_range is non-empty, we have a truncated header at the
                    // end of the file, which can be caused by the writer crashing in the
                    // middle of writing the header. Instead of considering this an error,
                    // just report EOF.
                    self.buffer_range = 0..0;
                    return PhysicalRecord::Eof;
                }
            }

            // Parse the header
            let start = self.buffer_range.start;
            let header = &self.backing_store[start..start + HEADER_SIZE];
            let stored_crc = decode_fixed32(header);
            let length = decode_fixed16(&header[4..6]) as usize;
            let type_byte = header[6];
            if HEADER_SIZE + length > self.buffer_range.len() {
                let drop_size = self.buffer_range.len();
                self.buffer_range = 0..0;
                if !self.eof {
                    self.report_corruption(drop_size, "bad record length");
                    return PhysicalRecord::BadRecord;
                }
                // If the end of the file has been reached without reading |length| bytes
                // of payload, assume the writer died in the middle of writing the record.
                // Don't report a corruption.
                return PhysicalRecord::Eof;
            }

            if type_byte == ZERO_TYPE && length == 0 {
                // Skip zero length record without reporting any drops since
                // such records are produced by writers that preallocate
                // file regions.
                self.buffer_range = 0..0;
                return PhysicalRecord::BadRecord;
            }

            // Check crc
            if self.checksum {
                let expected_crc = C::unmask(stored_crc);
                // The crc covers the type byte and the payload.
                let actual_crc =
                    C::value(&self.backing_store[start + 6..start + HEADER_SIZE + length]);
                if actual_crc != expected_crc {
                    // Drop the rest of the buffer since "length" itself may have
                    // been corrupted and if we trust it, we could find some
                    // fragment of a real log record that just happens to look
                    // like a valid log record.
                    let drop_size = self.buffer_range.len();
                    self.buffer_range = 0..0;
                    self.report_corruption(drop_size, "checksum mismatch");
                    return PhysicalRecord::BadRecord;
                }
            }

            let payload = start + HEADER_SIZE..start + HEADER_SIZE + length;
            self.buffer_range = payload.end..self.buffer_range.end;

            // Skip physical record that started before initial_offset
            if self.end_of_buffer_offset - self.buffer_range.len() - HEADER_SIZE - length
                < self.initial_offset
            {
                return PhysicalRecord::BadRecord;
            }

            return match RecordType::try_from(type_byte) {
                Ok(record_type) => PhysicalRecord::Record(record_type, payload),
                Err(unknown) => PhysicalRecord::Unknown(unknown, payload),
            };
        }
    }

    fn report_corruption(&mut self, bytes: usize, msg: &str) {
        self.report_drop(bytes, &Error::corruption(msg))
    }

    fn report_drop(&mut self, bytes: usize, reason: &Error) {
        // Drops located before initial_offset are not interesting to callers.
        let drop_offset = self
            .end_of_buffer_offset
            .wrapping_sub(self.buffer_range.len() + bytes);
        if drop_offset < self.initial_offset {
            return;
        }
        tracing::warn!(bytes, %reason, "log reader dropped bytes");
        if let Some(reporter) = &self.reporter {
            reporter.borrow_mut().corruption(bytes, reason);
        }
    }
}

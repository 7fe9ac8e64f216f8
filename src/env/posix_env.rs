use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use super::{Env, SequentialFile, WritableFile};
use crate::util::{Error, Result};

const WRITABLE_FILE_BUFFER_SIZE: usize = 65536;

#[derive(Debug, Default, Clone, Copy)]
pub struct PosixEnv {}

impl PosixEnv {
    pub fn new() -> Self {
        Self {}
    }
}

impl Env for PosixEnv {
    fn new_sequential_file(&self, fname: &str) -> Result<Box<dyn SequentialFile>> {
        match File::open(fname) {
            Ok(file) => Ok(Box::new(PosixSequentialFile::new(fname, file))),
            Err(error) => Err(to_db_error(fname, error)),
        }
    }

    fn new_writable_file(&self, fname: &str) -> Result<Box<dyn WritableFile>> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(fname)
            .map_err(|error| to_db_error(fname, error))?;
        tracing::debug!(file = fname, "opened writable file");
        Ok(Box::new(PosixWritableFile::new(fname, file)))
    }

    fn new_appendable_file(&self, fname: &str) -> Result<Box<dyn WritableFile>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(fname)
            .map_err(|error| to_db_error(fname, error))?;
        tracing::debug!(file = fname, "opened appendable file");
        Ok(Box::new(PosixWritableFile::new(fname, file)))
    }

    fn file_exists(&self, fname: &str) -> bool {
        Path::new(fname).exists()
    }

    fn get_file_size(&self, fname: &str) -> Result<u64> {
        match fs::metadata(fname) {
            Ok(data) => Ok(data.len()),
            Err(error) => Err(to_db_error(fname, error)),
        }
    }

    fn remove_file(&self, fname: &str) -> Result<()> {
        match fs::remove_file(fname) {
            Ok(()) => Ok(()),
            Err(error) => Err(to_db_error(fname, error)),
        }
    }
}

fn to_db_error(target: &str, error: io::Error) -> Error {
    let msg = format!("{}: {}", target, error);
    match error.kind() {
        io::ErrorKind::NotFound => Error::not_found(&msg),
        _ => Error::io_error(&msg),
    }
}

struct PosixSequentialFile {
    fname: String,
    file: File,
}

impl PosixSequentialFile {
    fn new(fname: &str, file: File) -> Self {
        Self {
            fname: fname.to_owned(),
            file,
        }
    }
}

impl SequentialFile for PosixSequentialFile {
    fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        // Keep reading until dst is full so that a short read means EOF.
        let mut read_size = 0;
        while read_size < dst.len() {
            match self.file.read(&mut dst[read_size..]) {
                Ok(0) => break,
                Ok(n) => read_size += n,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(to_db_error(&self.fname, error)),
            }
        }
        Ok(read_size)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        self.file
            .seek(SeekFrom::Current(n as i64))
            .map(|_| ())
            .map_err(|error| to_db_error(&self.fname, error))
    }
}

struct PosixWritableFile {
    fname: String,
    file: Option<BufWriter<File>>,
}

impl PosixWritableFile {
    fn new(fname: &str, file: File) -> Self {
        Self {
            fname: fname.to_owned(),
            file: Some(BufWriter::with_capacity(WRITABLE_FILE_BUFFER_SIZE, file)),
        }
    }

    fn file(&mut self) -> Result<&mut BufWriter<File>> {
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(Error::io_error(&format!("{}: file is closed", self.fname))),
        }
    }
}

impl WritableFile for PosixWritableFile {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        let fname = self.fname.clone();
        self.file()?
            .write_all(data)
            .map_err(|error| to_db_error(&fname, error))
    }

    fn close(&mut self) -> Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush().map_err(|error| to_db_error(&self.fname, error)),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        let fname = self.fname.clone();
        self.file()?
            .flush()
            .map_err(|error| to_db_error(&fname, error))
    }

    fn sync(&mut self) -> Result<()> {
        let fname = self.fname.clone();
        let file = self.file()?;
        file.flush().map_err(|error| to_db_error(&fname, error))?;
        file.get_ref()
            .sync_data()
            .map_err(|error| to_db_error(&fname, error))
    }
}

impl Drop for PosixWritableFile {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            tracing::warn!(file = %self.fname, %error, "failed to close writable file");
        }
    }
}

use crate::util::Result;

mod posix_env;

pub use posix_env::PosixEnv;

/// An Env is an interface used to access operating system functionality
/// like the filesystem.  Log writers and readers only see the file
/// abstractions below, so tests can substitute in-memory files.
pub trait Env {
    /// The returned file will only be accessed by one thread at a time.
    fn new_sequential_file(&self, fname: &str) -> Result<Box<dyn SequentialFile>>;

    /// Create a file for writing, truncating any existing file with the
    /// same name.
    fn new_writable_file(&self, fname: &str) -> Result<Box<dyn WritableFile>>;

    /// Open a file for appending, creating it if it does not exist.  Used
    /// to resume writing a log whose length is already known.
    fn new_appendable_file(&self, fname: &str) -> Result<Box<dyn WritableFile>>;

    fn file_exists(&self, fname: &str) -> bool;
    fn get_file_size(&self, fname: &str) -> Result<u64>;
    fn remove_file(&self, fname: &str) -> Result<()>;
}

/// A file abstraction for reading sequentially through a file
pub trait SequentialFile {
    /// Read up to `dst.len()` bytes, returning how many were read.  A short
    /// read means end of file.
    fn read(&mut self, dst: &mut [u8]) -> Result<usize>;

    /// Skip `n` bytes.  Skipping past the end may either fail or leave the
    /// file positioned at its end, depending on the implementation.
    fn skip(&mut self, n: usize) -> Result<()>;
}

/// A file abstraction for sequential writing.  The implementation
/// must provide buffering since callers may append small fragments
/// at a time to the file.
///
/// A failed `append` or `flush` may have written part of the request; the
/// file contents past the last successful call are then unspecified.
pub trait WritableFile {
    fn append(&mut self, data: &[u8]) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn sync(&mut self) -> Result<()>;
}

impl<W: WritableFile + ?Sized> WritableFile for Box<W> {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        (**self).append(data)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }
}

impl<S: SequentialFile + ?Sized> SequentialFile for Box<S> {
    fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        (**self).read(dst)
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        (**self).skip(n)
    }
}

use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("NotFound: {0}")]
    NotFound(String),
    #[error("Corruption: {0}")]
    Corruption(String),
    #[error("IOError: {0}")]
    IoError(String),
}

impl Error {
    pub fn not_found(msg: &str) -> Self {
        Self::NotFound(msg.to_owned())
    }

    pub fn corruption(msg: &str) -> Self {
        Self::Corruption(msg.to_owned())
    }

    pub fn io_error(msg: &str) -> Self {
        Self::IoError(msg.to_owned())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::Corruption(_))
    }

    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::IoError(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::{Error, Result};

    #[test]
    fn test_result_move() {
        let ok: Result<()> = Ok(());
        let ok2 = ok;
        assert!(ok2.is_ok());

        let status: Result<()> = Err(Error::not_found("custom NotFound message"));
        let status2 = status;
        let error = status2.unwrap_err();
        assert!(error.is_not_found());
        assert!(!error.is_io_error());
        assert_eq!("NotFound: custom NotFound message", error.to_string());
    }

    #[test]
    fn test_error_display_codes() {
        assert_eq!("IOError: disk full", Error::io_error("disk full").to_string());
        assert_eq!(
            "Corruption: checksum mismatch",
            Error::corruption("checksum mismatch").to_string()
        );
        assert!(Error::corruption("x").is_corruption());
    }
}

//! A bunch of wrap errors.
use chordnet_core::error::Error as CoreError;

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors enum mapping global custom errors.
/// The error type can be expressed in decimal, where the high decs represent
/// the error category and the low decs represent the error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
#[repr(u32)]
pub enum Error {
    #[error("Chord node error: {0}.")]
    Core(#[from] CoreError) = 100,
    #[error("Decode error: {0}.")]
    DecodeError(String) = 300,
    #[error("Encode error: {0}.")]
    EncodeError(String) = 301,
    #[error("Invalid address: {0}.")]
    InvalidAddress(String) = 400,
    #[error("Invalid ring id: {0}.")]
    InvalidRingId(String) = 401,
    #[error("Unknown command: {0}.")]
    UnknownCommand(String) = 402,
    #[error("Invalid logging level: {0}.")]
    InvalidLoggingLevel(String) = 809,
    #[error("Create file error: {0}")]
    CreateFileError(String) = 900,
    #[error("Open file error: {0}")]
    OpenFileError(String) = 901,
    #[error("Cannot find home directory")]
    HomeDirError = 903,
    #[error("Cannot find parent directory")]
    ParentDirError = 904,
}

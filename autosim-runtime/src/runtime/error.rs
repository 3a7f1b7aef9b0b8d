use std::{error, fmt};

#[derive(Debug)]
pub enum Error {
    /// Configuration value out of range.
    InvalidConfig(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
        }
    }
}

impl error::Error for Error {}

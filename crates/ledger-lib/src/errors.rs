use thiserror::Error;

use crate::delegate::{DelegateError, StoreError};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Database error: {0}")]
    DBInternalError(String),
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Delegate error: {0}")]
    DelegateError(#[from] DelegateError),
}

pub type Result<T> = std::result::Result<T, Error>;

// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unrecognized severity token: {0:?}")]
    Severity(String),

    #[error("Unparseable timestamp: {0:?}")]
    Timestamp(String),
}

pub type Result<T> = std::result::Result<T, Error>;

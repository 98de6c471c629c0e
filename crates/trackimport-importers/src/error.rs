// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;
use trackimport_http::HttpError;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Transport error: {0}")]
    Transport(#[from] HttpError),

    #[error("Unknown importer: {0}")]
    UnknownImporter(String),
}

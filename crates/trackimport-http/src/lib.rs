// SPDX-License-Identifier: GPL-3.0-or-later

//! Transport collaborators of the import engine.
//!
//! [`HttpTransport`] carries find and track list queries, [`ImageDownloader`]
//! fetches cover art. [`HttpClient`] implements both on top of reqwest with a
//! request interval and an in-memory response cache.

pub mod client;
pub mod error;
pub mod rate_limiter;
pub mod request;

pub use client::{HttpClient, HttpClientBuilder, HttpTransport, ImageDownloader};
pub use error::{HttpError, Result};
pub use request::{DownloadedImage, HttpRequest};

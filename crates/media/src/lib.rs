//! Media helpers for outbound sends: URL fetch and content sniffing.

pub mod error;
pub mod fetch;
pub mod sniff;

pub use {
    error::{Error, Result},
    fetch::fetch_bytes,
    sniff::detect_mime,
};

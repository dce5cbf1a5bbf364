//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): every failure the crate can report
//! - [`IoResultExt`](context::IoResultExt): context helpers for IO results

pub mod context;
pub mod neterror;

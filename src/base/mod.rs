//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): error codes matching `net_error_list.h`
//! - [`classify_io_error`](context::classify_io_error): IO failures to error codes

pub mod context;
pub mod neterror;

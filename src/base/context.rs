//! Error context helpers.
//!
//! Converts IO failures raised while talking to a server into context-rich
//! `NetError` variants.

use crate::base::neterror::NetError;
use std::io;

/// Map an IO error raised while connecting to `host:port` onto a `NetError`.
///
/// Well-known kinds get their dedicated code; everything else keeps the
/// endpoint in a [`NetError::ConnectionFailedTo`].
pub fn classify_io_error(err: &io::Error, host: &str, port: u16) -> NetError {
    match err.kind() {
        io::ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
        io::ErrorKind::ConnectionReset => NetError::ConnectionReset,
        io::ErrorKind::ConnectionAborted => NetError::ConnectionAborted,
        io::ErrorKind::TimedOut => NetError::ConnectionTimedOut,
        io::ErrorKind::AddrNotAvailable => NetError::AddressUnreachable,
        io::ErrorKind::UnexpectedEof => NetError::ConnectionClosed,
        _ => NetError::connection_failed_to(host, port, err),
    }
}

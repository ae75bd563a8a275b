//! Device link ports — the line-oriented serial connection to the feeder.
//!
//! The link is split in two halves so the read loop never contends with
//! writers: [`LineSource`] is owned by the read loop, [`LineSink`] by the
//! relay controller, which serializes every write.

use std::future::Future;

use feedbridge_domain::error::FeedBridgeError;

/// Inbound half of the device link.
pub trait LineSource: Send {
    /// Whether at least one byte is waiting to be read.
    fn has_pending_data(&mut self) -> impl Future<Output = Result<bool, FeedBridgeError>> + Send;

    /// Read one newline-terminated line, without the terminator.
    ///
    /// Returns `Ok(None)` when the read timed out before a full line arrived.
    fn read_line(&mut self) -> impl Future<Output = Result<Option<String>, FeedBridgeError>> + Send;
}

/// Outbound half of the device link.
pub trait LineSink: Send {
    /// Write `line` followed by a newline, as one complete write.
    fn write_line(
        &mut self,
        line: &str,
    ) -> impl Future<Output = Result<(), FeedBridgeError>> + Send;

    /// Flush and release the link.
    fn close(&mut self) -> impl Future<Output = Result<(), FeedBridgeError>> + Send;
}

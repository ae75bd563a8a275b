//! Line-oriented reader and writer halves of a serial port.
//!
//! `serialport` is blocking, so every read and write runs on the blocking
//! thread pool. Each half owns its own handle (`try_clone`) so a pending read
//! never delays a write.

use std::io::{BufRead, BufReader, ErrorKind, Write};

use serialport::SerialPort;

use feedbridge_app::ports::{LineSink, LineSource};
use feedbridge_domain::error::FeedBridgeError;

use crate::config::SerialConfig;
use crate::error::SerialError;

/// Open the port, wait for the board to settle and split it in two halves.
///
/// # Errors
///
/// Returns [`SerialError::Open`] when the port cannot be opened, or
/// [`SerialError::Port`] when it cannot be cloned.
pub async fn open(config: &SerialConfig) -> Result<(SerialReader, SerialWriter), SerialError> {
    let port_name = config.port.clone();
    let baud_rate = config.baud_rate;
    let timeout = config.read_timeout();

    let port = tokio::task::spawn_blocking(move || {
        let opened = serialport::new(port_name.as_str(), baud_rate)
            .timeout(timeout)
            .open();
        opened.map_err(|source| SerialError::Open {
            port: port_name,
            source,
        })
    })
    .await??;
    let writer = port.try_clone()?;

    tracing::info!(port = %config.port, baud_rate, "serial port opened");
    tokio::time::sleep(config.settle()).await;

    Ok((
        SerialReader {
            state: Some(ReadState {
                reader: BufReader::new(port),
                partial: Vec::new(),
            }),
        },
        SerialWriter { port: Some(writer) },
    ))
}

/// Read one `\n`-terminated line, keeping partial data across timeouts.
fn read_line_from<R: BufRead>(
    reader: &mut R,
    partial: &mut Vec<u8>,
) -> Result<Option<String>, std::io::Error> {
    match reader.read_until(b'\n', partial) {
        Ok(_) if partial.last() == Some(&b'\n') => {
            let line = String::from_utf8_lossy(partial)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            partial.clear();
            Ok(Some(line))
        }
        Ok(_) => Ok(None),
        Err(err) if err.kind() == ErrorKind::TimedOut => Ok(None),
        Err(err) => Err(err),
    }
}

struct ReadState {
    reader: BufReader<Box<dyn SerialPort>>,
    partial: Vec<u8>,
}

/// Inbound half of the serial link.
pub struct SerialReader {
    state: Option<ReadState>,
}

impl SerialReader {
    fn pending(&mut self) -> Result<bool, SerialError> {
        let state = self.state.as_mut().ok_or(SerialError::Closed)?;
        if !state.reader.buffer().is_empty() {
            return Ok(true);
        }
        Ok(state.reader.get_ref().bytes_to_read()? > 0)
    }

    async fn next_line(&mut self) -> Result<Option<String>, SerialError> {
        let mut state = self.state.take().ok_or(SerialError::Closed)?;
        let (state, result) = tokio::task::spawn_blocking(move || {
            let result = read_line_from(&mut state.reader, &mut state.partial);
            (state, result)
        })
        .await?;
        self.state = Some(state);
        Ok(result?)
    }
}

impl LineSource for SerialReader {
    async fn has_pending_data(&mut self) -> Result<bool, FeedBridgeError> {
        Ok(self.pending()?)
    }

    async fn read_line(&mut self) -> Result<Option<String>, FeedBridgeError> {
        Ok(self.next_line().await?)
    }
}

/// Outbound half of the serial link.
pub struct SerialWriter {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialWriter {
    async fn send(&mut self, line: &str) -> Result<(), SerialError> {
        let mut port = self.port.take().ok_or(SerialError::Closed)?;
        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');

        let (port, result) = tokio::task::spawn_blocking(move || {
            let result = port.write_all(&payload).and_then(|()| port.flush());
            (port, result)
        })
        .await?;
        self.port = Some(port);
        Ok(result?)
    }

    async fn shutdown(&mut self) -> Result<(), SerialError> {
        let Some(mut port) = self.port.take() else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || port.flush()).await??;
        tracing::info!("serial link closed");
        Ok(())
    }
}

impl LineSink for SerialWriter {
    async fn write_line(&mut self, line: &str) -> Result<(), FeedBridgeError> {
        self.send(line).await?;
        tracing::trace!(%line, "line written to device");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), FeedBridgeError> {
        Ok(self.shutdown().await?)
    }
}

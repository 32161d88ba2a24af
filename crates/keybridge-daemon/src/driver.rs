//! Event loop feeding host notifications through the coalescer
//!
//! Reads one JSON host notification per line, writes one JSON key event per
//! line. Deferred work is driven off tokio's clock: the loop sleeps until the
//! coalescer's next deadline whenever no input is waiting.

use anyhow::{Context, Result};
use keybridge_config::KeyboardConfig;
use keybridge_core::{Coalescer, DecodeError, EventQueue, HostNotification};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;

/// Counters reported when the input stream ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    pub notifications: usize,
    pub rejected: usize,
    /// Notifications whose host default was left alone
    pub allowed: usize,
    pub events: usize,
}

/// Run until `reader` reaches EOF.
///
/// Malformed lines are logged and skipped. On EOF, deferred work that would
/// run within the release delay is flushed so pending ups still produce their
/// releases; auto-repeat of keys still held is abandoned.
pub async fn run<R, W>(reader: R, writer: &mut W, config: KeyboardConfig) -> Result<DriverStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let release_delay = config.release_delay;
    let mut coalescer = Coalescer::with_handler(config, EventQueue::new());
    let mut lines = LinesStream::new(reader.lines());
    let mut stats = DriverStats::default();

    loop {
        let deadline = coalescer.next_deadline().map(Instant::from_std);

        tokio::select! {
            biased;

            line = lines.next() => {
                let Some(line) = line else {
                    break;
                };
                let line = line.context("Failed to read host notification")?;
                handle_line(&mut coalescer, &line, &mut stats);
            }

            _ = sleep_until(deadline), if deadline.is_some() => {
                let ran = coalescer.run_due(Instant::now().into_std());
                tracing::trace!("Ran {} deferred task(s)", ran);
            }
        }

        stats.events += flush_events(&mut coalescer, writer).await?;
    }

    let end = Instant::now().into_std() + release_delay;
    coalescer.run_due(end);
    stats.events += flush_events(&mut coalescer, writer).await?;

    tracing::info!(
        "Input closed after {} notification(s), {} rejected, {} passed to the host, {} event(s) written",
        stats.notifications,
        stats.rejected,
        stats.allowed,
        stats.events
    );

    Ok(stats)
}

fn handle_line(coalescer: &mut Coalescer<EventQueue>, line: &str, stats: &mut DriverStats) {
    let notification = match HostNotification::from_json(line) {
        Ok(notification) => notification,
        Err(DecodeError::Empty) => return,
        Err(e) => {
            tracing::warn!("Skipping host notification: {}", e);
            stats.rejected += 1;
            return;
        }
    };

    tracing::debug!("Received {:?}", notification);
    stats.notifications += 1;

    let action = coalescer.dispatch(&notification, Instant::now().into_std());
    tracing::trace!("Host action: {:?}", action);
    if !action.is_prevented() {
        stats.allowed += 1;
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    if let Some(deadline) = deadline {
        tokio::time::sleep_until(deadline).await;
    }
}

/// Write every queued event as a JSON line. Returns how many were written.
async fn flush_events<W>(coalescer: &mut Coalescer<EventQueue>, writer: &mut W) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let events = match coalescer.handler_mut() {
        Some(queue) => queue.drain(),
        None => return Ok(0),
    };

    if events.is_empty() {
        return Ok(0);
    }

    for event in &events {
        let json = serde_json::to_string(event).context("Failed to serialize key event")?;
        tracing::trace!("Sending {}", json);
        writer
            .write_all(json.as_bytes())
            .await
            .context("Failed to write key event")?;
        writer
            .write_all(b"\n")
            .await
            .context("Failed to write newline")?;
    }

    writer.flush().await.context("Failed to flush key events")?;

    Ok(events.len())
}

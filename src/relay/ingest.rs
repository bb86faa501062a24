//! Line-delimited JSON event intake.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::relay::events::ProxyEvent;

/// Read one JSON event per line from `reader` and push it into `events`.
///
/// Blank lines are skipped and malformed lines are logged and skipped.
/// Returns the number of events forwarded once the reader is exhausted or
/// the receiving side is gone.
pub async fn read_events<R>(reader: R, events: mpsc::UnboundedSender<ProxyEvent>) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read event stream");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<ProxyEvent>(line) {
            Ok(event) => {
                if events.send(event).is_err() {
                    break;
                }
                forwarded += 1;
            }
            Err(e) => tracing::warn!(error = %e, line = %line, "Ignoring malformed event"),
        }
    }

    forwarded
}

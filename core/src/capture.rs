//! Stream capture: raw byte streams to timestamped log lines
//!
//! Two capture tasks run per started app, one per pipe. Each converts its
//! stream into discrete lines, stamps every line with the wall-clock time at
//! which it completed, and appends it to the owning record's history. A task
//! runs until end-of-data or a read error and never retries; `stop` ends
//! capture indirectly by terminating the child, which closes the pipes.
//!
//! Capture termination is deliberately decoupled from the record's state
//! transition: the exit observer may flip the record to idle before or after
//! the final lines drain, and both orders are fine because every append goes
//! through the history's own lock.

use crate::logs::LogLine;
use crate::registry::AppRecord;
use schema::LogStream;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{debug, warn};

/// Spawn a background task reading lines from `reader` into the record's
/// history, tagged with `stream`. Returns the task handle; callers are not
/// required to join it.
pub fn spawn_capture(
    reader: Box<dyn AsyncRead + Send + Unpin>,
    stream: LogStream,
    record: Arc<AppRecord>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    record.append_log(LogLine::now(stream, line)).await;
                }
                Ok(None) => {
                    debug!("{:?} stream for '{}' reached EOF", stream, record.name());
                    break;
                }
                Err(e) => {
                    warn!(
                        "Error reading {:?} stream for '{}': {}",
                        stream,
                        record.name(),
                        e
                    );
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use schema::AppSpec;
    use std::path::PathBuf;

    fn mk_record(name: &str) -> Arc<AppRecord> {
        let registry = Registry::from_specs(vec![AppSpec {
            name: name.to_string(),
            path: PathBuf::from("/tmp"),
            command: None,
            args: vec![],
            working_dir: None,
        }]);
        registry.get(name).unwrap()
    }

    #[tokio::test]
    async fn captures_lines_until_eof() {
        let record = mk_record("bot");
        let reader: Box<dyn AsyncRead + Send + Unpin> =
            Box::new(std::io::Cursor::new(b"first\nsecond\nthird\n".to_vec()));

        spawn_capture(reader, LogStream::Stdout, record.clone())
            .await
            .expect("capture task panicked");

        let snap = record.snapshot_logs(10).await;
        let contents: Vec<_> = snap.iter().map(|l| l.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert!(snap.iter().all(|l| l.stream == LogStream::Stdout));
        assert!(snap.iter().all(|l| !l.timestamp.is_empty()));
    }

    #[tokio::test]
    async fn last_line_without_newline_is_still_captured() {
        let record = mk_record("bot");
        let reader: Box<dyn AsyncRead + Send + Unpin> =
            Box::new(std::io::Cursor::new(b"partial".to_vec()));

        spawn_capture(reader, LogStream::Stderr, record.clone())
            .await
            .expect("capture task panicked");

        let snap = record.snapshot_logs(10).await;
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].content, "partial");
        assert_eq!(snap[0].stream, LogStream::Stderr);
    }

    #[tokio::test]
    async fn two_streams_append_to_one_record_without_loss() {
        let record = mk_record("bot");
        let out: Box<dyn AsyncRead + Send + Unpin> =
            Box::new(std::io::Cursor::new(b"o1\no2\no3\n".to_vec()));
        let err: Box<dyn AsyncRead + Send + Unpin> =
            Box::new(std::io::Cursor::new(b"e1\ne2\ne3\n".to_vec()));

        let h1 = spawn_capture(out, LogStream::Stdout, record.clone());
        let h2 = spawn_capture(err, LogStream::Stderr, record.clone());
        h1.await.unwrap();
        h2.await.unwrap();

        // No cross-stream ordering guarantee, but per-stream order holds and
        // nothing is lost or torn.
        let snap = record.snapshot_logs(10).await;
        assert_eq!(snap.len(), 6);
        let stdout_lines: Vec<_> = snap
            .iter()
            .filter(|l| l.stream == LogStream::Stdout)
            .map(|l| l.content.as_str())
            .collect();
        assert_eq!(stdout_lines, vec!["o1", "o2", "o3"]);
        let stderr_lines: Vec<_> = snap
            .iter()
            .filter(|l| l.stream == LogStream::Stderr)
            .map(|l| l.content.as_str())
            .collect();
        assert_eq!(stderr_lines, vec!["e1", "e2", "e3"]);
    }
}

//! Per-session outbound queue.
//!
//! Any task may append a line (the session's own dispatcher, another
//! session's broadcast, an external presence producer). Only the session's
//! writer task drains it. Appending never waits on the socket; a slow peer
//! just lets its queue grow until the writer catches up.
//!
//! ```text
//!  dispatcher ─┐
//!  broadcasts ─┼─► push_line ─► [ bytes ] ─► next_batch ─► writer task ─► socket
//!  producers  ─┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use chatgate_protocol::Line;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Append-only byte buffer of encoded, CRLF-terminated lines.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    buf: Mutex<Vec<u8>>,
    ready: Notify,
    closed: AtomicBool,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one line and wakes the writer.
    ///
    /// Returns `false` (and drops the line) once the queue is closed.
    pub fn push_line(&self, line: &Line) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.buf.lock().extend_from_slice(&line.to_wire());
        self.ready.notify_one();
        true
    }

    /// Takes everything queued so far, leaving the queue empty.
    pub fn drain(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buf.lock())
    }

    /// Bytes waiting to be written.
    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops accepting lines. Lines already queued can still be drained.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.ready.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Waits for queued bytes and drains them.
    ///
    /// Returns `None` once the queue is closed and empty. Must only be
    /// called from one task at a time (the session's writer).
    pub async fn next_batch(&self) -> Option<Vec<u8>> {
        loop {
            let batch = self.drain();
            if !batch.is_empty() {
                return Some(batch);
            }
            if self.is_closed() {
                return None;
            }
            // notify_one stores a permit when nobody is waiting, so a push
            // between drain() and here is not lost.
            self.ready.notified().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn line(text: &str) -> Line {
        Line::new("gate", "NOTICE").trailing(text)
    }

    #[test]
    fn test_drain_returns_lines_in_append_order_and_empties() {
        let queue = OutboundQueue::new();
        queue.push_line(&line("one"));
        queue.push_line(&line("two"));
        assert_eq!(
            queue.drain(),
            b":gate NOTICE :one\r\n:gate NOTICE :two\r\n".to_vec()
        );
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_push_line_after_close_is_dropped() {
        let queue = OutboundQueue::new();
        queue.close();
        assert!(!queue.push_line(&line("late")));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_next_batch_wakes_on_push() {
        let queue = Arc::new(OutboundQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.next_batch().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.push_line(&line("hi"));

        let batch = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("writer should wake")
            .unwrap();
        assert_eq!(batch, Some(b":gate NOTICE :hi\r\n".to_vec()));
    }

    #[tokio::test]
    async fn test_next_batch_flushes_then_ends_after_close() {
        let queue = OutboundQueue::new();
        queue.push_line(&line("bye"));
        queue.close();
        assert!(queue.next_batch().await.is_some());
        assert_eq!(queue.next_batch().await, None);
    }

    #[test]
    fn test_concurrent_pushes_never_split_lines() {
        let queue = Arc::new(OutboundQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        queue.push_line(&line(&format!("from-{i}")));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let text = String::from_utf8(queue.drain()).unwrap();
        let lines: Vec<_> = text.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 200);
        assert!(lines.iter().all(|l| l.starts_with(":gate NOTICE :from-")));
    }
}

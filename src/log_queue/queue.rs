//! # Bounded Log Queue
//!
//! Insertion-ordered, fixed-capacity feed of log entries. Each entry owns an
//! expiry timer scheduled at `push + TTL`. The TTL is per entry and never
//! reset by queue shifts.
//!
//! Timers never touch the queue directly: when one fires it sends the entry
//! id over a channel, and the task owning the queue calls [`LogQueue::expire`].
//! Every removal path drops the entry's timer handle, which aborts the timer
//! task if it is still pending.

use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::debug;

use super::entry::{LogEntry, LogId};

/// Default number of visible entries
pub const DEFAULT_CAPACITY: usize = 5;

/// Default entry time-to-live
pub const DEFAULT_TTL: Duration = Duration::from_millis(8000);

/// Cancellable expiry timer for one entry; aborts on drop
#[derive(Debug)]
struct ExpiryTimer(JoinHandle<()>);

impl ExpiryTimer {
    fn schedule(id: LogId, deadline: Instant, expiry_tx: mpsc::UnboundedSender<LogId>) -> Self {
        Self(tokio::spawn(async move {
            sleep_until(deadline).await;
            // Receiver gone means the console shut down
            let _ = expiry_tx.send(id);
        }))
    }
}

impl Drop for ExpiryTimer {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug)]
struct QueuedEntry {
    entry: LogEntry,
    _timer: ExpiryTimer,
}

/// Fixed-capacity, self-expiring log feed
///
/// Must be used from within a Tokio runtime: [`LogQueue::push`] spawns the
/// entry's timer task.
#[derive(Debug)]
pub struct LogQueue {
    entries: VecDeque<QueuedEntry>,
    capacity: usize,
    ttl: Duration,
    expiry_tx: mpsc::UnboundedSender<LogId>,
}

impl LogQueue {
    /// Create a queue and the receiver its expiry timers report to
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> (Self, mpsc::UnboundedReceiver<LogId>) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        let capacity = capacity.max(1);

        let queue = Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            ttl,
            expiry_tx,
        };

        (queue, expiry_rx)
    }

    /// Append an entry and schedule its expiry
    ///
    /// Returns the entries evicted from the front to stay within capacity.
    /// Evicted entries are dropped silently; their timers are cancelled and
    /// will never report.
    pub fn push(&mut self, entry: LogEntry) -> Vec<LogEntry> {
        let deadline = Instant::now() + self.ttl;
        let timer = ExpiryTimer::schedule(entry.id, deadline, self.expiry_tx.clone());

        self.entries.push_back(QueuedEntry { entry, _timer: timer });

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.entries.pop_front() {
                debug!("Log queue full, evicting {}", oldest.entry.id);
                evicted.push(oldest.entry);
            }
        }
        evicted
    }

    /// Remove an entry whose timer fired
    ///
    /// No-op returning `None` if the entry was already dismissed or evicted.
    pub fn expire(&mut self, id: LogId) -> Option<LogEntry> {
        self.remove(id)
    }

    /// Remove an entry at the operator's request, cancelling its timer
    ///
    /// No-op returning `None` if the entry is already gone.
    pub fn dismiss(&mut self, id: LogId) -> Option<LogEntry> {
        self.remove(id)
    }

    /// Remove every entry and cancel every pending timer
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn remove(&mut self, id: LogId) -> Option<LogEntry> {
        let index = self.entries.iter().position(|queued| queued.entry.id == id)?;
        // Dropping the QueuedEntry aborts its timer
        self.entries.remove(index).map(|queued| queued.entry)
    }

    /// Visible entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().map(|queued| &queued.entry)
    }

    pub fn get(&self, id: LogId) -> Option<&LogEntry> {
        self.entries().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_queue::entry::Severity;

    fn entry(message: &str) -> LogEntry {
        LogEntry::new(message, Severity::Info)
    }

    fn messages(queue: &LogQueue) -> Vec<String> {
        queue.entries().map(|e| e.message.clone()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_never_exceeded() {
        let (mut queue, _expiry_rx) = LogQueue::new(DEFAULT_CAPACITY, DEFAULT_TTL);

        for i in 0..12 {
            queue.push(entry(&format!("m{}", i)));
            assert!(queue.len() <= DEFAULT_CAPACITY);
        }

        assert_eq!(queue.len(), 5);
        assert_eq!(messages(&queue), vec!["m7", "m8", "m9", "m10", "m11"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_eviction_is_oldest_first() {
        let (mut queue, _expiry_rx) = LogQueue::new(2, DEFAULT_TTL);

        assert!(queue.push(entry("a")).is_empty());
        assert!(queue.push(entry("b")).is_empty());

        let evicted = queue.push(entry("c"));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].message, "a");
        assert_eq!(messages(&queue), vec!["b", "c"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_capacity_is_raised_to_one() {
        let (mut queue, _expiry_rx) = LogQueue::new(0, DEFAULT_TTL);
        queue.push(entry("a"));
        assert_eq!(queue.capacity(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let (mut queue, mut expiry_rx) = LogQueue::new(DEFAULT_CAPACITY, DEFAULT_TTL);
        let start = Instant::now();

        let e = entry("a");
        let id = e.id;
        queue.push(e);

        let fired = expiry_rx.recv().await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(fired, id);
        assert!(elapsed >= DEFAULT_TTL);
        assert!(elapsed < DEFAULT_TTL + Duration::from_millis(100));

        assert_eq!(queue.expire(fired).map(|e| e.message), Some("a".to_string()));
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_is_independent_of_queue_shifts() {
        let (mut queue, mut expiry_rx) = LogQueue::new(DEFAULT_CAPACITY, DEFAULT_TTL);
        let start = Instant::now();

        let first = entry("first");
        let first_id = first.id;
        queue.push(first);

        tokio::time::sleep(Duration::from_secs(3)).await;

        let second = entry("second");
        let second_id = second.id;
        queue.push(second);

        let fired = expiry_rx.recv().await.unwrap();
        assert_eq!(fired, first_id);
        assert!(start.elapsed() < Duration::from_secs(9));
        queue.expire(fired);

        // Removing the first entry must not restart the second one's clock
        let fired = expiry_rx.recv().await.unwrap();
        assert_eq!(fired, second_id);
        assert!(start.elapsed() >= Duration::from_secs(11));
        assert!(start.elapsed() < Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_cancels_timer() {
        let (mut queue, mut expiry_rx) = LogQueue::new(DEFAULT_CAPACITY, DEFAULT_TTL);

        let e = entry("a");
        let id = e.id;
        queue.push(e);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(queue.dismiss(id).is_some());
        assert!(queue.is_empty());

        tokio::time::sleep(DEFAULT_TTL * 2).await;
        assert!(expiry_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_is_idempotent() {
        let (mut queue, _expiry_rx) = LogQueue::new(DEFAULT_CAPACITY, DEFAULT_TTL);

        let e = entry("a");
        let id = e.id;
        queue.push(e);

        assert!(queue.expire(id).is_some());
        assert!(queue.expire(id).is_none());
        assert!(queue.dismiss(id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicted_entry_never_reports() {
        let (mut queue, mut expiry_rx) = LogQueue::new(1, DEFAULT_TTL);

        let old = entry("old");
        queue.push(old);
        let new = entry("new");
        let new_id = new.id;
        queue.push(new);

        let fired = expiry_rx.recv().await.unwrap();
        assert_eq!(fired, new_id);

        tokio::time::sleep(DEFAULT_TTL).await;
        assert!(expiry_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_only_removes_target() {
        let (mut queue, _expiry_rx) = LogQueue::new(DEFAULT_CAPACITY, DEFAULT_TTL);

        let a = entry("a");
        let b = entry("b");
        let c = entry("c");
        let b_id = b.id;
        queue.push(a);
        queue.push(b);
        queue.push(c);

        queue.dismiss(b_id);
        assert_eq!(messages(&queue), vec!["a", "c"]);
        assert!(queue.get(b_id).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_all_timers() {
        let (mut queue, mut expiry_rx) = LogQueue::new(DEFAULT_CAPACITY, DEFAULT_TTL);
        queue.push(entry("a"));
        queue.push(entry("b"));

        drop(queue);

        // All senders are gone once the aborted timers are torn down
        assert!(expiry_rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cancels_all_timers() {
        let (mut queue, mut expiry_rx) = LogQueue::new(DEFAULT_CAPACITY, DEFAULT_TTL);
        queue.push(entry("a"));
        queue.push(entry("b"));

        queue.clear();
        assert!(queue.is_empty());

        tokio::time::sleep(DEFAULT_TTL * 2).await;
        assert!(expiry_rx.try_recv().is_err());
    }
}

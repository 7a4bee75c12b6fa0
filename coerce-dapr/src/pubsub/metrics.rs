use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::Relaxed;

#[derive(Debug, Default)]
pub struct PublisherMetrics {
    total_messages_enqueued: AtomicU64,
    total_messages_published: AtomicU64,
    total_messages_failed: AtomicU64,
    total_flushes: AtomicU64,
}

impl PublisherMetrics {
    pub fn new() -> PublisherMetrics {
        PublisherMetrics::default()
    }

    #[inline]
    pub fn get_msgs_enqueued(&self) -> u64 {
        self.total_messages_enqueued.load(Relaxed)
    }

    #[inline]
    pub fn get_msgs_published(&self) -> u64 {
        self.total_messages_published.load(Relaxed)
    }

    #[inline]
    pub fn get_msgs_failed(&self) -> u64 {
        self.total_messages_failed.load(Relaxed)
    }

    #[inline]
    pub fn get_flushes(&self) -> u64 {
        self.total_flushes.load(Relaxed)
    }

    #[inline]
    pub(crate) fn increment_msgs_enqueued(&self) {
        self.total_messages_enqueued.fetch_add(1, Relaxed);
    }

    #[inline]
    pub(crate) fn add_msgs_published(&self, count: usize) {
        self.total_messages_published.fetch_add(count as u64, Relaxed);
    }

    #[inline]
    pub(crate) fn add_msgs_failed(&self, count: usize) {
        self.total_messages_failed.fetch_add(count as u64, Relaxed);
    }

    #[inline]
    pub(crate) fn increment_flushes(&self) {
        self.total_flushes.fetch_add(1, Relaxed);
    }
}

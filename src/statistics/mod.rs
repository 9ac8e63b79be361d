use std::sync::atomic::{AtomicU64, Ordering};

/// Per-connection RPC statistics
///
/// Shared by every handle derived from one [`crate::Connection`]. Uses
/// atomic counters for lock-free updates.
#[derive(Debug, Default)]
pub struct Statistics {
    // Calls issued, by method
    pub num_describe_calls: AtomicU64,
    pub num_get_slice_calls: AtomicU64,
    pub num_get_count_calls: AtomicU64,
    pub num_insert_calls: AtomicU64,
    pub num_remove_calls: AtomicU64,

    // Payload
    pub columns_read: AtomicU64,
    pub bytes_read: AtomicU64,
    pub bytes_written: AtomicU64,

    // Calls that returned an error, including transport failures
    pub num_errors: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    #[inline]
    pub fn record_describe(&self) {
        self.num_describe_calls.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_get_slice(&self) {
        self.num_get_slice_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Payload of a `get_slice` that succeeded.
    #[inline]
    pub fn record_columns_read(&self, columns: u64, bytes: u64) {
        self.columns_read.fetch_add(columns, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_get_count(&self) {
        self.num_get_count_calls.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_insert(&self, bytes: u64) {
        self.num_insert_calls.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_remove(&self) {
        self.num_remove_calls.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.num_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn num_calls(&self) -> u64 {
        self.num_describe_calls.load(Ordering::Relaxed)
            + self.num_get_slice_calls.load(Ordering::Relaxed)
            + self.num_get_count_calls.load(Ordering::Relaxed)
            + self.num_insert_calls.load(Ordering::Relaxed)
            + self.num_remove_calls.load(Ordering::Relaxed)
    }

    pub fn num_reads(&self) -> u64 {
        self.num_get_slice_calls.load(Ordering::Relaxed)
            + self.num_get_count_calls.load(Ordering::Relaxed)
    }

    pub fn num_writes(&self) -> u64 {
        self.num_insert_calls.load(Ordering::Relaxed) + self.num_remove_calls.load(Ordering::Relaxed)
    }

    pub fn num_errors(&self) -> u64 {
        self.num_errors.load(Ordering::Relaxed)
    }

    pub fn columns_read(&self) -> u64 {
        self.columns_read.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn error_rate(&self) -> f64 {
        let calls = self.num_calls();
        if calls == 0 {
            return 0.0;
        }
        self.num_errors() as f64 / calls as f64
    }

    pub fn reset(&self) {
        for counter in [
            &self.num_describe_calls,
            &self.num_get_slice_calls,
            &self.num_get_count_calls,
            &self.num_insert_calls,
            &self.num_remove_calls,
            &self.columns_read,
            &self.bytes_read,
            &self.bytes_written,
            &self.num_errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn report(&self) -> String {
        format!(
            "Connection Statistics:\n\
            \n\
            Calls:\n\
            - describe:      {}\n\
            - get_slice:     {}\n\
            - get_count:     {}\n\
            - insert:        {}\n\
            - remove:        {}\n\
            \n\
            Payload:\n\
            - Columns read:  {}\n\
            - Bytes read:    {} ({:.2} MB)\n\
            - Bytes written: {} ({:.2} MB)\n\
            \n\
            Errors:          {} ({:.2}%)",
            self.num_describe_calls.load(Ordering::Relaxed),
            self.num_get_slice_calls.load(Ordering::Relaxed),
            self.num_get_count_calls.load(Ordering::Relaxed),
            self.num_insert_calls.load(Ordering::Relaxed),
            self.num_remove_calls.load(Ordering::Relaxed),
            self.columns_read(),
            self.bytes_read.load(Ordering::Relaxed),
            self.bytes_read.load(Ordering::Relaxed) as f64 / 1024.0 / 1024.0,
            self.bytes_written(),
            self.bytes_written() as f64 / 1024.0 / 1024.0,
            self.num_errors(),
            self.error_rate() * 100.0,
        )
    }
}

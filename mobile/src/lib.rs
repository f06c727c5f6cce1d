// imageflow-mobile: native mobile bindings for iOS and Android
// This crate exports the batch keep-alive core via UniFFI

pub use imageflow_core::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct SilentTaskHost;

    impl BackgroundTaskHost for SilentTaskHost {
        fn begin_background_task(&self, _name: String, _expiration: Arc<ExpirationToken>) -> u64 {
            42
        }

        fn end_background_task(&self, _task_id: u64) {}
    }

    #[test]
    fn test_mobile_bindings_lifecycle() {
        let host = Arc::new(SilentTaskHost);
        let batch = BatchBackground::for_background_tasks(host, default_batch_settings())
            .expect("Failed to create batch keep-alive");
        assert!(!batch.is_active());

        batch.begin(3, 0);
        assert!(batch.is_active());

        batch.end();
        assert!(!batch.is_active());
    }

    #[test]
    fn test_mobile_status_text() {
        assert_eq!(progress_status_text(10, 3), "Processing 3 of 10");
    }
}

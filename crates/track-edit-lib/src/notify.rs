//! Change notification for views that draw a track

/// Observer told, synchronously and in-line, after every successful mutation of a track
///
/// Refused operations never notify.
pub trait ChangeListener: Send + Sync {
    fn data_changed(&self);
}

impl<F> ChangeListener for F
where
    F: Fn() + Send + Sync,
{
    #[inline]
    fn data_changed(&self) {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_listener() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let listener: Arc<dyn ChangeListener> = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        listener.data_changed();
        listener.data_changed();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

//! Progress-callback trait for per-diagram render events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! real-time events as the render loop processes each diagram.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a channel, a WebSocket, or a terminal progress bar —
//! without the library knowing anything about how the host application
//! communicates. The trait is `Send + Sync` because the pipeline runs on a
//! `spawn_blocking` thread, not on the caller's task.

use std::sync::Arc;

/// Called by the render loop as it processes each diagram.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Diagram events always arrive in extraction order —
/// the loop is sequential by design.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the page has loaded, before the first diagram.
    ///
    /// # Arguments
    /// * `total_diagrams` — number of diagrams that will be attempted
    fn on_render_start(&self, total_diagrams: usize) {
        let _ = total_diagrams;
    }

    /// Called just before a diagram's render is invoked.
    ///
    /// # Arguments
    /// * `index` — 0-indexed extraction order
    /// * `total` — total diagrams in the document
    fn on_diagram_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a diagram renders successfully.
    fn on_diagram_complete(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when a diagram fails and is replaced by an error marker.
    ///
    /// # Arguments
    /// * `error` — human-readable error from the renderer
    fn on_diagram_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after the last diagram has been attempted.
    ///
    /// # Arguments
    /// * `total_diagrams` — diagrams attempted
    /// * `rendered`       — diagrams that produced SVG
    fn on_render_complete(&self, total_diagrams: usize, rendered: usize) {
        let _ = (total_diagrams, rendered);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        rendered_total: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_diagram_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_diagram_complete(&self, _index: usize, _total: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_diagram_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_render_complete(&self, _total: usize, rendered: usize) {
            self.rendered_total.store(rendered, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_render_start(3);
        cb.on_diagram_start(0, 3);
        cb.on_diagram_complete(0, 3);
        cb.on_diagram_error(1, 3, "parse error");
        cb.on_render_complete(3, 2);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback {
            starts: AtomicUsize::new(0),
            completes: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            rendered_total: AtomicUsize::new(0),
        };

        tracker.on_render_start(3);
        tracker.on_diagram_start(0, 3);
        tracker.on_diagram_complete(0, 3);
        tracker.on_diagram_start(1, 3);
        tracker.on_diagram_error(1, 3, "Parse error on line 2");
        tracker.on_diagram_start(2, 3);
        tracker.on_diagram_complete(2, 3);
        tracker.on_render_complete(3, 2);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.rendered_total.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ConversionProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_render_start(10);
        cb.on_diagram_start(0, 10);
        cb.on_diagram_complete(0, 10);
    }
}

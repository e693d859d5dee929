//! Load-once detector handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Detection, ImageInput};
use crate::domain::ports::ObjectDetector;

/// Produces the real detector. Called again after a failed load.
pub type DetectorLoader =
    Box<dyn Fn() -> BoxFuture<'static, DomainResult<Arc<dyn ObjectDetector>>> + Send + Sync>;

/// Defers the model load to the first request.
///
/// Concurrent first requests share a single load. A failed load is not
/// cached, so the next request tries again. Once loaded, `detect` calls run
/// concurrently against the shared detector.
pub struct LazyDetector {
    cell: OnceCell<Arc<dyn ObjectDetector>>,
    loader: DetectorLoader,
    attempts: AtomicUsize,
}

impl LazyDetector {
    pub fn new(loader: DetectorLoader) -> Self {
        Self {
            cell: OnceCell::new(),
            loader,
            attempts: AtomicUsize::new(0),
        }
    }

    /// The loaded detector, loading it first if needed.
    pub async fn get(&self) -> DomainResult<Arc<dyn ObjectDetector>> {
        self.cell
            .get_or_try_init(|| async {
                let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                info!(attempt, "loading detection model");
                let loaded = (self.loader)().await;
                if let Err(ref e) = loaded {
                    warn!(attempt, error = %e, "detection model load failed");
                }
                loaded
            })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Number of load attempts so far.
    pub fn load_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectDetector for LazyDetector {
    fn name(&self) -> &'static str {
        "lazy"
    }

    async fn detect(&self, image: &ImageInput) -> DomainResult<Vec<Detection>> {
        self.get().await?.detect(image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use futures::FutureExt;
    use std::time::Duration;

    struct FixedDetector;

    #[async_trait]
    impl ObjectDetector for FixedDetector {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn detect(&self, _image: &ImageInput) -> DomainResult<Vec<Detection>> {
            Ok(vec![Detection::new("apple", 0.9)])
        }
    }

    fn counting_loader(loads: Arc<AtomicUsize>, fail_first: bool) -> DetectorLoader {
        Box::new(move || {
            let loads = Arc::clone(&loads);
            async move {
                let n = loads.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                if fail_first && n == 0 {
                    return Err(DomainError::DetectionFailed("weights missing".to_string()));
                }
                Ok(Arc::new(FixedDetector) as Arc<dyn ObjectDetector>)
            }
            .boxed()
        })
    }

    #[tokio::test]
    async fn test_concurrent_first_use_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let lazy = Arc::new(LazyDetector::new(counting_loader(Arc::clone(&loads), false)));
        let image = ImageInput::new(vec![0xFF, 0xD8], None);

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                let image = image.clone();
                tokio::spawn(async move { lazy.detect(&image).await })
            })
            .collect();
        for task in tasks {
            let detections = task.await.unwrap().unwrap();
            assert_eq!(detections[0].label, "apple");
        }

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(lazy.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let loads = Arc::new(AtomicUsize::new(0));
        let lazy = LazyDetector::new(counting_loader(Arc::clone(&loads), true));
        let image = ImageInput::new(vec![1], None);

        assert!(lazy.detect(&image).await.is_err());
        assert!(!lazy.is_loaded());
        assert!(lazy.detect(&image).await.is_ok());
        assert_eq!(lazy.load_attempts(), 2);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}

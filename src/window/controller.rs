//! Target window resolution and foreground activation.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;

use super::error::{FocusError, PlatformError};
use super::platform::{Platform, Rect, WindowHandle};
use super::retry::retry_bounded;
use super::{FOCUS_ATTEMPTS, FOCUS_RETRY_WAIT};

/// Locates a window by title pattern and brings it to the foreground.
///
/// The handle is re-resolved on every focus attempt: the target window may
/// have been closed and recreated since the last call, so cached handles
/// cannot be trusted.
#[derive(Clone)]
pub struct WindowController {
    platform: Arc<dyn Platform>,
    title_pattern: Regex,
    attempts: u32,
    retry_wait: Duration,
}

impl WindowController {
    /// Create a controller with the default retry bounds (3 attempts, 3s apart).
    #[must_use]
    pub fn new(platform: Arc<dyn Platform>, title_pattern: Regex) -> Self {
        Self {
            platform,
            title_pattern,
            attempts: FOCUS_ATTEMPTS,
            retry_wait: FOCUS_RETRY_WAIT,
        }
    }

    /// Create a controller with custom retry bounds.
    #[must_use]
    pub fn with_retry(
        platform: Arc<dyn Platform>,
        title_pattern: Regex,
        attempts: u32,
        retry_wait: Duration,
    ) -> Self {
        Self {
            platform,
            title_pattern,
            attempts,
            retry_wait,
        }
    }

    /// Get the title pattern this controller resolves against.
    #[must_use]
    pub fn title_pattern(&self) -> &Regex {
        &self.title_pattern
    }

    /// Resolve the target window and bring it to the foreground.
    ///
    /// The full resolve+activate sequence is retried up to the configured
    /// attempt bound with a fixed wait between attempts. Activation
    /// involves blocking settle waits at the OS layer, so each attempt
    /// runs on the blocking pool instead of a runtime worker.
    ///
    /// # Errors
    ///
    /// Returns [`FocusError`] once all attempts are exhausted. Callers
    /// treat this as recoverable: log it and proceed degraded.
    pub async fn focus(&self) -> Result<WindowHandle, FocusError> {
        retry_bounded(self.attempts, self.retry_wait, || {
            let platform = self.platform.clone();
            let pattern = self.title_pattern.clone();
            async move {
                tokio::task::spawn_blocking(move || -> Result<WindowHandle, FocusError> {
                    let handle = platform
                        .find_window(&pattern)?
                        .ok_or_else(|| FocusError::WindowNotFound(pattern.to_string()))?;
                    platform.activate(handle)?;
                    Ok(handle)
                })
                .await
                .map_err(|e| {
                    FocusError::Platform(PlatformError::Api(format!("focus task failed: {e}")))
                })?
            }
        })
        .await
    }

    /// The focused window's client area in screen coordinates.
    ///
    /// # Errors
    ///
    /// Fails if the window cannot be focused or its geometry queried.
    pub async fn client_area(&self) -> Result<Rect, FocusError> {
        let handle = self.focus().await?;
        Ok(self.platform.client_area(handle)?)
    }

    /// Focus the window and capture its client area to `save_path`.
    ///
    /// # Errors
    ///
    /// Fails if focus is exhausted or the capture cannot be written.
    pub async fn save_screenshot(&self, save_path: &Path) -> Result<(), FocusError> {
        let handle = self.focus().await?;
        let platform = self.platform.clone();
        let path = save_path.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<(), PlatformError> {
            let area = platform.client_area(handle)?;
            platform.capture_area(area, &path)
        })
        .await
        .map_err(|e| {
            FocusError::Platform(PlatformError::Api(format!("capture task failed: {e}")))
        })??;
        tracing::debug!(path = %save_path.display(), "Saved window screenshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::error::PlatformError;
    use crate::window::platform::{Key, Point};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    /// Mock platform whose window appears after a configurable number of
    /// resolution attempts.
    struct FlakyPlatform {
        find_calls: AtomicU32,
        appear_after: u32,
    }

    impl FlakyPlatform {
        fn new(appear_after: u32) -> Self {
            Self {
                find_calls: AtomicU32::new(0),
                appear_after,
            }
        }
    }

    impl Platform for FlakyPlatform {
        fn find_window(&self, _title: &Regex) -> Result<Option<WindowHandle>, PlatformError> {
            let call = self.find_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.appear_after {
                Ok(Some(WindowHandle(7)))
            } else {
                Ok(None)
            }
        }

        fn activate(&self, _window: WindowHandle) -> Result<(), PlatformError> {
            Ok(())
        }

        fn client_area(&self, _window: WindowHandle) -> Result<Rect, PlatformError> {
            Ok(Rect {
                left: 0,
                top: 0,
                width: 800,
                height: 600,
            })
        }

        fn capture_area(&self, _area: Rect, save_path: &std::path::Path) -> Result<(), PlatformError> {
            std::fs::write(save_path, b"BM").map_err(PlatformError::Io)
        }

        fn press_key(&self, _key: Key) -> Result<(), PlatformError> {
            Ok(())
        }

        fn type_text(&self, _text: &str) -> Result<(), PlatformError> {
            Ok(())
        }

        fn click(&self, _position: Point) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    fn pattern() -> Regex {
        Regex::new(r"Minecraft \d+(\.\d+)*").unwrap()
    }

    #[tokio::test]
    async fn test_focus_succeeds_first_attempt() {
        let platform = Arc::new(FlakyPlatform::new(1));
        let controller = WindowController::with_retry(
            platform.clone(),
            pattern(),
            3,
            Duration::from_millis(10),
        );

        let handle = controller.focus().await.unwrap();
        assert_eq!(handle, WindowHandle(7));
        assert_eq!(platform.find_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_focus_re_resolves_every_call() {
        let platform = Arc::new(FlakyPlatform::new(1));
        let controller = WindowController::with_retry(
            platform.clone(),
            pattern(),
            3,
            Duration::from_millis(10),
        );

        controller.focus().await.unwrap();
        controller.focus().await.unwrap();
        // One resolution per focus call; handles are never cached.
        assert_eq!(platform.find_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_focus_retries_until_window_appears() {
        let platform = Arc::new(FlakyPlatform::new(2));
        let controller = WindowController::with_retry(
            platform.clone(),
            pattern(),
            3,
            Duration::from_millis(5),
        );

        let handle = controller.focus().await.unwrap();
        assert_eq!(handle, WindowHandle(7));
        assert_eq!(platform.find_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_focus_fails_after_exact_attempts_with_bounded_wait() {
        let platform = Arc::new(FlakyPlatform::new(u32::MAX));
        let wait = Duration::from_millis(20);
        let controller = WindowController::with_retry(platform.clone(), pattern(), 3, wait);

        let start = Instant::now();
        let result = controller.focus().await;

        assert!(matches!(result, Err(FocusError::WindowNotFound(_))));
        assert_eq!(platform.find_calls.load(Ordering::SeqCst), 3);
        // Waits occur only between attempts: 2 waits for 3 attempts.
        assert!(start.elapsed() >= wait * 2);
        assert!(start.elapsed() < wait * 4);
    }

    #[tokio::test]
    async fn test_focus_runs_blocking_activation_off_the_runtime() {
        /// Platform whose activation blocks its thread, like the real
        /// one does for its settle wait.
        struct SlowActivate;

        impl Platform for SlowActivate {
            fn find_window(&self, _title: &Regex) -> Result<Option<WindowHandle>, PlatformError> {
                Ok(Some(WindowHandle(7)))
            }

            fn activate(&self, _window: WindowHandle) -> Result<(), PlatformError> {
                std::thread::sleep(Duration::from_millis(300));
                Ok(())
            }

            fn client_area(&self, _window: WindowHandle) -> Result<Rect, PlatformError> {
                Ok(Rect {
                    left: 0,
                    top: 0,
                    width: 800,
                    height: 600,
                })
            }

            fn capture_area(
                &self,
                _area: Rect,
                _save_path: &std::path::Path,
            ) -> Result<(), PlatformError> {
                Ok(())
            }

            fn press_key(&self, _key: Key) -> Result<(), PlatformError> {
                Ok(())
            }

            fn type_text(&self, _text: &str) -> Result<(), PlatformError> {
                Ok(())
            }

            fn click(&self, _position: Point) -> Result<(), PlatformError> {
                Ok(())
            }
        }

        let controller = WindowController::with_retry(
            Arc::new(SlowActivate),
            pattern(),
            1,
            Duration::from_millis(5),
        );

        let start = Instant::now();
        let (focus, timer_elapsed) = tokio::join!(controller.focus(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            start.elapsed()
        });

        assert!(focus.is_ok());
        // The timer must fire while activation is still blocking; a
        // stalled runtime would delay it past the 300ms block.
        assert!(timer_elapsed < Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_save_screenshot_writes_capture() {
        let platform = Arc::new(FlakyPlatform::new(1));
        let controller = WindowController::with_retry(
            platform,
            pattern(),
            3,
            Duration::from_millis(5),
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.bmp");
        controller.save_screenshot(&path).await.unwrap();
        assert!(path.exists());
    }
}

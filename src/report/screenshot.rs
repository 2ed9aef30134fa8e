use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::driver::Driver;

/// Writes failure screenshots under `<reports>/screenshots`.
#[derive(Debug, Clone)]
pub struct ScreenshotSink {
    dir: PathBuf,
}

impl ScreenshotSink {
    pub fn new(reports_dir: impl AsRef<Path>) -> Self {
        ScreenshotSink {
            dir: reports_dir.as_ref().join("screenshots"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Capture the current screen as `<tag>_<timestamp_ms>.png`.
    ///
    /// Failures are logged and reported as `None`; a missing screenshot never
    /// masks the error that triggered it.
    pub fn capture(&self, driver: &dyn Driver, tag: &str) -> Option<PathBuf> {
        let bytes = match driver.screenshot() {
            Ok(b) => b,
            Err(e) => {
                error!(tag, error = %e, "screenshot capture failed");
                return None;
            }
        };

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            error!(dir = %self.dir.display(), error = %e, "could not create screenshot directory");
            return None;
        }

        let file_name = format!(
            "{}_{}.png",
            sanitize_tag(tag),
            chrono::Local::now().timestamp_millis()
        );
        let path = self.dir.join(file_name);

        match std::fs::write(&path, &bytes) {
            Ok(()) => {
                info!(path = %path.display(), "screenshot saved");
                Some(path)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "could not write screenshot");
                None
            }
        }
    }
}

/// Sanitize a label or scenario name into a safe file name fragment.
pub fn sanitize_tag(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .to_lowercase()
}

//! Preview SDK handle
//!
//! The preview service handle is process-wide state with an explicit owner:
//! `SdkLoader` lives on the app state, initializes the handle lazily on
//! first use, memoizes it for every later call, and tears it down when the
//! loader is dropped.

use std::sync::Arc;

use tokio::sync::OnceCell;
use url::Url;

use crate::errors::ConsoleError;

/// Handle to the platform's preview service
pub struct PreviewSdk {
    base_url: String,
}

impl PreviewSdk {
    fn connect(base_url: &str) -> Result<Self, ConsoleError> {
        Url::parse(base_url)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Public URL of a project revision's preview
    pub fn preview_url(&self, project_id: &str, rev: &str) -> String {
        format!("{}/p/{}/{}", self.base_url, project_id, rev)
    }
}

/// Lazily-initialized, memoized loader for the preview SDK
pub struct SdkLoader {
    base_url: String,
    cell: OnceCell<Arc<PreviewSdk>>,
}

impl SdkLoader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cell: OnceCell::new(),
        }
    }

    /// Get the handle, initializing it on first call
    pub async fn get(&self) -> Result<Arc<PreviewSdk>, ConsoleError> {
        let sdk = self
            .cell
            .get_or_try_init(|| async { PreviewSdk::connect(&self.base_url).map(Arc::new) })
            .await?;
        Ok(sdk.clone())
    }
}

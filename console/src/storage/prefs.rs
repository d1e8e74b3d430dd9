//! Persisted user preferences
//!
//! Dismissals carry an explicit TTL: a dismissed key becomes visible again
//! once its dismissal timestamp ages past the TTL.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ConsoleError;
use crate::filesys::file::File;

/// Default dismissal lifetime: two weeks
pub const DEFAULT_DISMISSAL_TTL: Duration = Duration::from_secs(14 * 24 * 3600);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PrefsData {
    #[serde(default)]
    dismissals: HashMap<String, DateTime<Utc>>,
}

/// Preference accessor backed by a JSON file
pub struct Preferences {
    file: File,
    ttl: Duration,
}

impl Preferences {
    /// Create a new preference accessor
    pub fn new(file: File, ttl: Duration) -> Self {
        Self { file, ttl }
    }

    /// Check whether a key is currently dismissed.
    ///
    /// A missing or unreadable preferences file counts as not dismissed.
    pub async fn is_dismissed(&self, key: &str) -> bool {
        let data = self.load().await;
        match data.dismissals.get(key) {
            Some(dismissed_at) => Self::within_ttl(*dismissed_at, Utc::now(), self.ttl),
            None => false,
        }
    }

    /// Dismiss a key from now until the TTL elapses
    pub async fn dismiss(&self, key: &str) -> Result<(), ConsoleError> {
        let mut data = self.load().await;
        data.dismissals.insert(key.to_string(), Utc::now());
        self.file.write_json(&data).await
    }

    /// Clear a dismissal
    pub async fn clear(&self, key: &str) -> Result<(), ConsoleError> {
        let mut data = self.load().await;
        if data.dismissals.remove(key).is_some() {
            self.file.write_json(&data).await?;
        }
        Ok(())
    }

    async fn load(&self) -> PrefsData {
        if !self.file.exists().await {
            return PrefsData::default();
        }
        self.file.read_json().await.unwrap_or_default()
    }

    fn within_ttl(dismissed_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
        match now.signed_duration_since(dismissed_at).to_std() {
            Ok(age) => age < ttl,
            // dismissed_at in the future: clock moved backwards, keep dismissed
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_within_ttl_fresh_dismissal() {
        let now = Utc::now();
        assert!(Preferences::within_ttl(now, now, DEFAULT_DISMISSAL_TTL));
    }

    #[test]
    fn test_within_ttl_expired_dismissal() {
        let now = Utc::now();
        let dismissed_at = now - ChronoDuration::days(15);
        assert!(!Preferences::within_ttl(
            dismissed_at,
            now,
            DEFAULT_DISMISSAL_TTL
        ));
    }

    #[tokio::test]
    async fn test_dismiss_roundtrip() {
        let path = std::env::temp_dir().join(format!(
            "mdpress-prefs-{}.json",
            crate::utils::generate_request_id()
        ));
        let prefs = Preferences::new(File::new(&path), DEFAULT_DISMISSAL_TTL);

        assert!(!prefs.is_dismissed("startup-hint").await);
        prefs.dismiss("startup-hint").await.unwrap();
        assert!(prefs.is_dismissed("startup-hint").await);

        prefs.clear("startup-hint").await.unwrap();
        assert!(!prefs.is_dismissed("startup-hint").await);

        File::new(&path).delete().await.unwrap();
    }
}

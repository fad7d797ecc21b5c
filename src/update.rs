use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::{bool_to_setting, commit, keys, setting_to_bool, KeyValueStore, StoreError};

/// Version baked into this build, compared against the latest release name.
pub const APP_VERSION: &str = "v1.05";

pub const LATEST_RELEASE_API: &str =
    "https://api.github.com/repos/unquenchedservant/DHV-Session-Timer/releases/latest";
pub const RELEASES_PAGE: &str =
    "https://github.com/unquenchedservant/DHV-Session-Timer/releases/latest";

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("release check failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("release response had no name")]
    MissingName,
}

#[derive(Debug, Deserialize)]
struct LatestRelease {
    name: Option<String>,
}

/// Where the latest release name comes from.
pub trait ReleaseSource {
    fn latest_version(&self) -> Result<String, UpdateError>;
}

/// Asks the GitHub releases API.
pub struct GithubReleases {
    url: String,
}

impl GithubReleases {
    pub fn new() -> Self {
        Self {
            url: LATEST_RELEASE_API.to_string(),
        }
    }
}

impl Default for GithubReleases {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseSource for GithubReleases {
    fn latest_version(&self) -> Result<String, UpdateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent(concat!("dhv-session-timer/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let release: LatestRelease = client.get(&self.url).send()?.error_for_status()?.json()?;
        release.name.ok_or(UpdateError::MissingName)
    }
}

/// Outcome of the startup release check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    Skipped(String),
    Available(String),
}

fn flag(store: &dyn KeyValueStore, key: &str) -> bool {
    store
        .get(key)
        .and_then(|v| setting_to_bool(&v))
        .unwrap_or(false)
}

/// Decide whether the update prompt should be shown for `latest`.
pub fn evaluate(latest: &str, current: &str, store: &dyn KeyValueStore) -> UpdateStatus {
    if latest == current {
        UpdateStatus::UpToDate
    } else if flag(store, keys::SKIP_ALL_UPDATES) || flag(store, &keys::skip_version(latest)) {
        UpdateStatus::Skipped(latest.to_string())
    } else {
        UpdateStatus::Available(latest.to_string())
    }
}

/// Run the check; any failure counts as up to date so startup is never blocked.
pub fn check(source: &dyn ReleaseSource, store: &dyn KeyValueStore) -> UpdateStatus {
    match source.latest_version() {
        Ok(latest) => {
            let status = evaluate(&latest, APP_VERSION, store);
            log::info!("latest release {latest}, running {APP_VERSION}: {status:?}");
            status
        }
        Err(e) => {
            log::warn!("{e}");
            UpdateStatus::UpToDate
        }
    }
}

/// Remember that the user declined `version`.
pub fn skip_version(store: &dyn KeyValueStore, version: &str) -> Result<(), StoreError> {
    commit(
        store,
        &[(keys::skip_version(version), bool_to_setting(true).to_string())],
    )
}

/// Stop asking about updates altogether.
pub fn skip_all(store: &dyn KeyValueStore) -> Result<(), StoreError> {
    commit(
        store,
        &[(keys::SKIP_ALL_UPDATES, bool_to_setting(true).to_string())],
    )
}

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::config::{APPLICATION, ORGANIZATION};

const LOG_FILE: &str = "dhv-session-timer.log";
const SOUND_ASSET: &str = "ding.mp3";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", ORGANIZATION, APPLICATION)
    }

    pub fn settings_path() -> PathBuf {
        crate::config::default_settings_path()
    }

    pub fn log_path() -> PathBuf {
        Self::project()
            .map(|dirs| dirs.data_local_dir().join(LOG_FILE))
            .unwrap_or_else(|| std::env::temp_dir().join(LOG_FILE))
    }

    /// First `asset/ding.mp3` found next to the executable or under the
    /// working directory.
    pub fn sound_asset() -> Option<PathBuf> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf));
        let cwd = std::env::current_dir().ok();
        find_asset([exe_dir, cwd].into_iter().flatten())
    }
}

fn find_asset(roots: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    roots
        .into_iter()
        .map(|root| root.join("asset").join(SOUND_ASSET))
        .find(|candidate| candidate.is_file())
}

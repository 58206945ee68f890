use std::path::Path;

use tracing::debug;

use crate::constants::APP_OFFLINE_FILE_NAME;

/// Checks whether an application has been taken offline.
pub trait AppOfflineProbe: Send + Sync {
    /// Returns `true` if the application rooted at `script_path` is offline.
    fn is_app_offline(&self, script_path: &Path) -> bool;
}

/// Detects the offline state from a marker file in the application's script directory.
///
/// The application is offline while a file named `app_offline.htm` exists directly under the script path. An empty
/// script path is never offline.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileMarkerProbe;

impl AppOfflineProbe for FileMarkerProbe {
    fn is_app_offline(&self, script_path: &Path) -> bool {
        if script_path.as_os_str().is_empty() {
            return false;
        }

        let marker_path = script_path.join(APP_OFFLINE_FILE_NAME);
        let offline = marker_path.is_file();
        if offline {
            debug!(marker_path = %marker_path.display(), "Found app offline marker.");
        }

        offline
    }
}

//! Ingestion defaults persisted as `config.toml` in the application root.
//!
//! Settings only feed the command-line driver; library operations take
//! explicit arguments.

use crate::app_dirs;

mod load;
mod save;
mod types;


/// Default filename used to store the settings.
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub use load::{config_path, load_from, load_or_default};
pub use save::{save, save_to_path};
pub use types::{ConfigError, DiscoverySettings, IngestSettings};

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => ConfigError::CreateDir { path, source },
    }
}

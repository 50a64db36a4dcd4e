pub mod api_key;
pub mod config;
pub mod fd_limit;
pub mod logger;
pub mod settings_toml;
pub mod tempfiles;

pub use api_key::{api_key_from_env, get_api_key};
pub use config::*;
pub use fd_limit::{FDS_PER_REQUEST, cap_concurrency, max_open_fds, max_requests_by_fd_limit};
pub use logger::{Colors, setup_logging};
pub use settings_toml::{
    SettingsToml, apply_file_to_config, load_settings_toml, parse_settings_toml,
};
pub use tempfiles::{rename_temp_to_final, temp_path_for, write_atomic};

pub mod app_config;
pub mod compose;
pub mod config;
pub mod platform;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use compose::TemplateSet;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use platform::{classify, Platform};
pub use types::{truncate_chars, PostData, MAX_CONTENT_CHARS, MAX_TITLE_CHARS};

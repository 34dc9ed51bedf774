//! Built-in defaults, the lowest-precedence layer.

use crate::catalog::DEFAULT_ROOT_LABEL;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("store.backend", "sled")?
        .set_default("root_label", DEFAULT_ROOT_LABEL)?
        .set_default("logging.level", "info")
}

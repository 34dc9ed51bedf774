//! Global config file: `$XDG_CONFIG_HOME/lesson-catalog/config.toml`

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg::config_home() {
        Ok(home) => {
            let path = home.join(xdg::APP_DIR).join("config.toml");
            Ok(builder.add_source(File::from(path).required(false)))
        }
        // No HOME: nothing global to read
        Err(_) => Ok(builder),
    }
}

//! Default configuration locations

use std::path::PathBuf;

/// Config file looked up under the working directory
pub const PROJECT_CONFIG_FILE: &str = "secrets/aso-config.json";

/// Directory name under the user config and data directories
pub const APP_DIR_NAME: &str = "pabal-mcp";

/// Config file name inside the user config directory
pub const USER_CONFIG_FILE: &str = "config.json";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "PABAL_MCP_CONFIG";

/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "PABAL_MCP_DATA_DIR";

/// `<user config dir>/pabal-mcp/config.json`, when the platform has one
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(USER_CONFIG_FILE))
}

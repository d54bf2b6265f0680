use std::path::PathBuf;

const VERSION_MESSAGE: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")",
);

pub fn version() -> &'static str {
    VERSION_MESSAGE
}

pub fn user_agent() -> String {
    format!("jwatch/{}", env!("CARGO_PKG_VERSION"))
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Failed to get config directory"))
        .map(|p| p.join("jwatch"))
}

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// What `register` saves and every other command reads back
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub name: String,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// `~/.config/molt-chess/credentials.json`, if there is a home directory
pub fn default_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").filter(|h| !h.is_empty())?;
    Some(PathBuf::from(home).join(".config").join("molt-chess").join("credentials.json"))
}

/// Reads the credentials file. A missing file is not an error.
pub fn load(path: &Path) -> Result<Option<Credentials>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let credentials = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid credentials file", path.display()))?;
    Ok(Some(credentials))
}

/// Writes the credentials file, readable by the owner only
pub fn save(path: &Path, credentials: &Credentials) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(credentials)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// An explicit key wins over the saved one
pub fn api_key(explicit: Option<&str>, saved: Option<&Credentials>, path: &Path) -> Result<String> {
    explicit
        .map(str::to_string)
        .or_else(|| saved.map(|c| c.api_key.clone()))
        .filter(|key| !key.is_empty())
        .ok_or_else(|| anyhow!("Need --api-key or {}", path.display()))
}

/// An explicit URL wins over the saved one, which wins over the default
pub fn api_url(explicit: Option<&str>, saved: Option<&Credentials>, default: &str) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| saved.and_then(|c| c.api_url.clone()))
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::MentionConfig;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "mention.toml";

/// Error type for reading mention.toml
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Parse config text.
pub fn parse_config(text: &str) -> Result<MentionConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Read the config at `path`. A relative `staff_file` is resolved against the
/// config file's directory.
pub fn read_config(path: &Path) -> Result<MentionConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut config = parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    if let Some(base) = path.parent()
        && let Some(staff) = config.directory.staff_file.as_mut()
        && staff.is_relative()
    {
        *staff = base.join(&*staff);
    }
    Ok(config)
}

/// Load `explicit` if given (it must exist), else `mention.toml` in `cwd` if
/// present, else defaults.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<MentionConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let default_path = cwd.join(CONFIG_FILE);
    if default_path.is_file() {
        read_config(&default_path)
    } else {
        Ok(MentionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r##"[directory]
current_user = "u-1"
staff_file = "staff.json"
fallback_role = "MEMBER"

[ui]
max_visible = 5

[ui.colors]
field_border = "#FF0000"
"##
    }

    #[test]
    fn parse_full_config() {
        let config = parse_config(sample_config()).unwrap();
        assert_eq!(config.directory.current_user.as_deref(), Some("u-1"));
        assert_eq!(config.directory.fallback_role, "MEMBER");
        assert_eq!(config.ui.max_visible, 5);
        assert_eq!(config.ui.colors.get("field_border").map(String::as_str), Some("#FF0000"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.directory.current_user, None);
        assert_eq!(config.directory.fallback_role, "STAFF");
        assert_eq!(config.ui.max_visible, 8);
    }

    #[test]
    fn staff_file_resolves_next_to_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, sample_config()).unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.directory.staff_file, Some(tmp.path().join("staff.json")));
    }

    #[test]
    fn missing_default_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config.ui.max_visible, 8);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(Some(&tmp.path().join("x.toml")), tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn bad_toml_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE);
        fs::write(&path, "[ui]\nmax_visible = \"many\"\n").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains(CONFIG_FILE));
    }
}

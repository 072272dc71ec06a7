//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::IndexConfig;
use std::io;
use std::path::Path;

/// Name of the configuration file within a project directory.
pub const CONFIG_FILE: &str = "tuindex.toml";

/// Highest meaningful `index.verbosity` value.
const MAX_VERBOSITY: u8 = 3;

/// Loads and validates a `tuindex.toml` configuration from a project directory.
///
/// Reads `<project_dir>/tuindex.toml`, parses it, and validates its values.
pub fn load_config(project_dir: &Path) -> Result<IndexConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Like [`load_config`], but a missing configuration file yields the defaults.
///
/// Any other read error, and every parse or validation error, is still reported.
pub fn load_config_or_default(project_dir: &Path) -> Result<IndexConfig, ConfigError> {
    match load_config(project_dir) {
        Err(ConfigError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
            Ok(IndexConfig::default())
        }
        other => other,
    }
}

/// Parses and validates a `tuindex.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<IndexConfig, ConfigError> {
    let config: IndexConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are in range and argument lists are well formed.
fn validate_config(config: &IndexConfig) -> Result<(), ConfigError> {
    if config.index.verbosity > MAX_VERBOSITY {
        return Err(ConfigError::ValidationError(format!(
            "index.verbosity must be at most {MAX_VERBOSITY}, got {}",
            config.index.verbosity
        )));
    }

    let args = &config.arguments;
    if args.default.iter().any(|a| a.is_empty()) {
        return Err(ConfigError::ValidationError(
            "arguments.default contains an empty argument".to_string(),
        ));
    }
    for (ext, list) in &args.extensions {
        if ext.is_empty() || ext.starts_with('.') {
            return Err(ConfigError::ValidationError(format!(
                "arguments.extensions key '{ext}' must be an extension without the leading dot"
            )));
        }
        // File extensions are matched case-insensitively against these keys.
        if ext.chars().any(|c| c.is_uppercase()) {
            return Err(ConfigError::ValidationError(format!(
                "arguments.extensions key '{ext}' must be lowercase"
            )));
        }
        if list.iter().any(|a| a.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "arguments.extensions.{ext} contains an empty argument"
            )));
        }
    }
    for (file, list) in &args.files {
        if file.is_empty() {
            return Err(ConfigError::ValidationError(
                "arguments.files contains an empty path".to_string(),
            ));
        }
        if list.iter().any(|a| a.is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "arguments.files.\"{file}\" contains an empty argument"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GlobalOption, ShutdownPolicy};

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.index.verbosity, 0);
        assert!(!config.index.exclude_declarations_from_pch);
        assert!(config.index.global_options.is_empty());
        assert_eq!(config.index.shutdown, ShutdownPolicy::Leak);
        assert!(config.arguments.default.is_empty());
        assert!(config.arguments.files.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[index]
verbosity = 2
exclude_declarations_from_pch = true
display_diagnostics = false
global_options = ["background-indexing"]
shutdown = "dispose"

[arguments]
default = ["-std=c++17", "-Iinclude"]
exclude = ["third_party/huge.cpp"]

[arguments.extensions]
c = ["-std=c11"]

[arguments.files]
"src/special.cpp" = ["-DSPECIAL"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.index.verbosity, 2);
        assert!(config.index.exclude_declarations_from_pch);
        assert!(!config.index.display_diagnostics());
        assert_eq!(config.index.global_options, vec![GlobalOption::BackgroundIndexing]);
        assert_eq!(config.index.shutdown, ShutdownPolicy::Dispose);
        assert_eq!(config.arguments.default, vec!["-std=c++17", "-Iinclude"]);
        assert_eq!(config.arguments.exclude, vec!["third_party/huge.cpp"]);
        assert_eq!(config.arguments.extensions["c"], vec!["-std=c11"]);
        assert_eq!(config.arguments.files["src/special.cpp"], vec!["-DSPECIAL"]);
    }

    #[test]
    fn verbosity_out_of_range() {
        let err = load_config_from_str("[index]\nverbosity = 7\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_global_option_rejected() {
        let err =
            load_config_from_str("[index]\nglobal_options = [\"turbo\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn dotted_extension_key_rejected() {
        let toml = r#"
[arguments.extensions]
".cpp" = ["-std=c++20"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn uppercase_extension_key_rejected() {
        let toml = r#"
[arguments]
default = ["-I."]

[arguments.extensions]
C = ["-std=c11"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        match err {
            ConfigError::ValidationError(msg) => assert!(msg.contains("'C'")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn lowercase_extension_key_applies_to_uppercase_file() {
        let toml = r#"
[arguments]
default = ["-I."]

[arguments.extensions]
c = ["-std=c11"]
"#;
        let config = load_config_from_str(toml).unwrap();
        let args = crate::resolve_compile_args(
            &config.arguments,
            Path::new("/p"),
            Path::new("/p/a.C"),
        );
        assert_eq!(args, vec!["-I.", "-std=c11"]);
    }

    #[test]
    fn empty_argument_rejected() {
        let err = load_config_from_str("[arguments]\ndefault = [\"\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[index]\nverbosity = 1\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.index.verbosity, 1);
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path()).unwrap();
        assert_eq!(config.index.verbosity, 0);
    }

    #[test]
    fn missing_file_default_still_validates_present_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[index]\nverbosity = 9\n").unwrap();
        assert!(load_config_or_default(dir.path()).is_err());
    }
}

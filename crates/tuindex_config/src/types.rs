//! Configuration types deserialized from `tuindex.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level configuration parsed from `tuindex.toml`.
///
/// Every section is optional; an empty file yields a silent index that
/// indexes nothing until compile arguments are configured.
#[derive(Debug, Default, Deserialize)]
pub struct IndexConfig {
    /// Analyzer context and cache behavior.
    #[serde(default)]
    pub index: IndexSettings,
    /// Compile arguments handed to the analyzer per file.
    #[serde(default)]
    pub arguments: ArgumentsConfig,
}

/// Settings of the `[index]` section.
#[derive(Debug, Default, Deserialize)]
pub struct IndexSettings {
    /// Trace level: 0 is silent, 1 traces every cache decision, 2 and above
    /// also ask the compiler for verbose output on full parses.
    #[serde(default)]
    pub verbosity: u8,
    /// Whether the analyzer may skip declarations that come from a
    /// precompiled header when indexing.
    #[serde(default)]
    pub exclude_declarations_from_pch: bool,
    /// Whether the analyzer prints its own diagnostics. Defaults to
    /// `verbosity > 0` when unset.
    #[serde(default)]
    pub display_diagnostics: Option<bool>,
    /// Thread priority options applied to the analyzer context.
    #[serde(default)]
    pub global_options: Vec<GlobalOption>,
    /// What happens to the process-wide index when the process shuts down.
    #[serde(default)]
    pub shutdown: ShutdownPolicy,
}

impl IndexSettings {
    /// Resolves `display_diagnostics` against the verbosity default.
    pub fn display_diagnostics(&self) -> bool {
        self.display_diagnostics.unwrap_or(self.verbosity > 0)
    }
}

/// A named analyzer global option.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GlobalOption {
    /// Run indexing threads at background priority.
    BackgroundIndexing,
    /// Run editing threads (parse, reparse, completion) at background priority.
    BackgroundEditing,
}

/// Lifetime policy of the process-wide index at shutdown.
#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownPolicy {
    /// Never dispose the index. Some analyzers crash when their context is
    /// torn down while the process exits, so this is the default.
    #[default]
    Leak,
    /// Dispose every unit and the context on explicit shutdown.
    Dispose,
}

/// Settings of the `[arguments]` section.
///
/// The arguments for a file are `default`, then the entry of `extensions`
/// matching its extension, then its entry in `files`, in that order.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ArgumentsConfig {
    /// Arguments applied to every indexable file.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub default: Vec<String>,
    /// Files (relative to the project root) that must never be indexed.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Extra arguments keyed by lowercase file extension without the dot.
    #[serde(default)]
    pub extensions: BTreeMap<String, Vec<String>>,
    /// Extra arguments keyed by file path relative to the project root.
    #[serde(default)]
    pub files: BTreeMap<String, Vec<String>>,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `default = "-std=c++17"` as shorthand for `default = ["-std=c++17"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_diagnostics_follows_verbosity() {
        let mut settings = IndexSettings::default();
        assert!(!settings.display_diagnostics());
        settings.verbosity = 1;
        assert!(settings.display_diagnostics());
        settings.display_diagnostics = Some(false);
        assert!(!settings.display_diagnostics());
    }

    #[test]
    fn default_args_accept_single_string() {
        let args: ArgumentsConfig = toml::from_str(r#"default = "-std=c++17""#).unwrap();
        assert_eq!(args.default, vec!["-std=c++17"]);
    }

    #[test]
    fn default_args_accept_list() {
        let args: ArgumentsConfig = toml::from_str(r#"default = ["-Iinclude", "-DNDEBUG"]"#).unwrap();
        assert_eq!(args.default, vec!["-Iinclude", "-DNDEBUG"]);
    }

    #[test]
    fn shutdown_defaults_to_leak() {
        let settings: IndexSettings = toml::from_str("").unwrap();
        assert_eq!(settings.shutdown, ShutdownPolicy::Leak);
    }

    #[test]
    fn global_option_names() {
        let settings: IndexSettings =
            toml::from_str(r#"global_options = ["background-indexing", "background-editing"]"#)
                .unwrap();
        assert_eq!(
            settings.global_options,
            vec![GlobalOption::BackgroundIndexing, GlobalOption::BackgroundEditing]
        );
    }
}

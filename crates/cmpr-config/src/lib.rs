//! Config file parsing/serialization and the bootstrap-prompt data holder
//! (§4.9, §6 "Configuration file").
//!
//! Grounded on `core-config`'s `Result`-returning loader and colocated test
//! module, but the line syntax itself is the tool's own `key: value`
//! format rather than TOML (§6 is explicit about the wire format; `toml`
//! and `dirs` are accordingly not pulled in — see DESIGN.md).

use cmpr_block::Language;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// One `file:` entry, tagged with whichever `language:` preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigProjectFile {
    pub path: PathBuf,
    pub language: Language,
}

macro_rules! config_fields {
    ($($field:ident),* $(,)?) => {
        /// The required configuration values (§4.9), enumerated once so the
        /// parser, serializer, and the missing-value prompt all derive their
        /// behavior from the same table.
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct Config {
            $(pub $field: String,)*
            pub project_files: Vec<ConfigProjectFile>,
        }

        impl Config {
            pub const REQUIRED_KEYS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn get_field(&self, key: &str) -> Option<&str> {
                match key {
                    $(stringify!($field) => Some(self.$field.as_str()),)*
                    _ => None,
                }
            }

            fn set_field(&mut self, key: &str, value: String) -> bool {
                match key {
                    $(stringify!($field) => { self.$field = value; true })*
                    _ => false,
                }
            }
        }
    };
}

config_fields!(cmprdir, buildcmd, bootstrap, cbcopy, cbpaste, curlbin, model);

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: io::Error },
    FileBeforeLanguage { line: usize },
    MissingColon { line: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "{}: {source}", path.display()),
            ConfigError::FileBeforeLanguage { line } => {
                write!(f, "line {line}: `file:` entry with no preceding `language:`")
            }
            ConfigError::MissingColon { line } => write!(f, "line {line}: missing `:`"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a config file's text per §6: `key: value\n`, whitespace after the
/// colon skipped, trailing whitespace significant, blank lines permitted
/// before `language:` groupings, unknown keys ignored.
pub fn parse(text: &str) -> Result<Config, ConfigError> {
    let mut config = Config::default();
    let mut current_language: Option<Language> = None;

    for (idx, raw_line) in text.split('\n').enumerate() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.trim().is_empty() {
            continue;
        }
        let colon = line
            .find(':')
            .ok_or(ConfigError::MissingColon { line: idx + 1 })?;
        let key = line[..colon].trim();
        let mut value = &line[colon + 1..];
        value = value.trim_start_matches([' ', '\t']);

        match key {
            "language" => current_language = Language::from_str_name(value.trim()),
            "file" => {
                let language = current_language
                    .ok_or(ConfigError::FileBeforeLanguage { line: idx + 1 })?;
                config.project_files.push(ConfigProjectFile {
                    path: PathBuf::from(value),
                    language,
                });
            }
            other => {
                // Unknown keys are ignored (§6); recognized required keys are stored.
                config.set_field(other, value.to_string());
            }
        }
    }
    Ok(config)
}

pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(&text)
}

/// Serialize back to the `key: value` line format, required keys first in
/// table order, then the `language:`/`file:` groupings.
pub fn serialize(config: &Config) -> String {
    let mut out = String::new();
    for key in Config::REQUIRED_KEYS {
        let value = config.get_field(key).unwrap_or("");
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    let mut last_language: Option<Language> = None;
    for f in &config.project_files {
        if last_language != Some(f.language) {
            out.push_str("language: ");
            out.push_str(&f.language.to_string());
            out.push('\n');
            last_language = Some(f.language);
        }
        out.push_str("file: ");
        out.push_str(&f.path.to_string_lossy());
        out.push('\n');
    }
    out
}

pub fn save_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, serialize(config)).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    info!(target: "config", path = %path.display(), "config_saved");
    Ok(())
}

/// Supplies interactive single-line input for missing required values. The
/// terminal-facing implementation lives in `cmpr-term`/`cmpr-cli`; this
/// crate stays free of raw-mode concerns.
pub trait Prompter {
    fn prompt_line(&mut self, key: &str) -> io::Result<String>;
}

/// Ensure every required key has a non-empty value, prompting and saving
/// immediately for each one that's missing (§4.9). Returns `true` if the
/// config was modified (and therefore re-saved).
pub fn ensure_required(
    config: &mut Config,
    path: &Path,
    prompter: &mut dyn Prompter,
) -> Result<bool, ConfigError> {
    let mut changed = false;
    for key in Config::REQUIRED_KEYS {
        if config.get_field(key).unwrap_or("").is_empty() {
            let value = prompter
                .prompt_line(key)
                .map_err(|e| ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            config.set_field(key, value);
            changed = true;
        }
    }
    if changed {
        save_to(path, config)?;
    }
    Ok(changed)
}

/// Default config path: `.cmpr/conf` under the working directory (§6).
pub fn default_config_path() -> PathBuf {
    PathBuf::from(".cmpr").join("conf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_required_keys_and_skips_whitespace_after_colon() {
        let text = "cmprdir: .cmpr\nbuildcmd:   make\nmodel: gpt-4-turbo\n";
        let cfg = parse(text).unwrap();
        assert_eq!(cfg.cmprdir, ".cmpr");
        assert_eq!(cfg.buildcmd, "make");
        assert_eq!(cfg.model, "gpt-4-turbo");
    }

    #[test]
    fn trailing_whitespace_in_value_is_significant() {
        let cfg = parse("buildcmd: make  \n").unwrap();
        assert_eq!(cfg.buildcmd, "make  ");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let cfg = parse("mystery: value\ncmprdir: .cmpr\n").unwrap();
        assert_eq!(cfg.cmprdir, ".cmpr");
    }

    #[test]
    fn language_applies_to_subsequent_files_until_changed() {
        let text = "\nlanguage: c\nfile: a.c\nfile: b.c\nlanguage: markdown\nfile: README.md\n";
        let cfg = parse(text).unwrap();
        assert_eq!(cfg.project_files.len(), 3);
        assert_eq!(cfg.project_files[0].language, Language::C);
        assert_eq!(cfg.project_files[1].language, Language::C);
        assert_eq!(cfg.project_files[2].language, Language::Markdown);
    }

    #[test]
    fn file_before_language_is_an_error() {
        let err = parse("file: a.c\n").unwrap_err();
        matches!(err, ConfigError::FileBeforeLanguage { .. });
    }

    #[test]
    fn round_trip_through_serialize_and_parse() {
        let mut cfg = Config::default();
        cfg.cmprdir = ".cmpr".into();
        cfg.model = "clipboard".into();
        cfg.project_files.push(ConfigProjectFile {
            path: "a.py".into(),
            language: Language::Python,
        });
        let text = serialize(&cfg);
        let reparsed = parse(&text).unwrap();
        assert_eq!(reparsed.cmprdir, cfg.cmprdir);
        assert_eq!(reparsed.model, cfg.model);
        assert_eq!(reparsed.project_files, cfg.project_files);
    }

    struct FixedPrompter(Vec<String>);
    impl Prompter for FixedPrompter {
        fn prompt_line(&mut self, _key: &str) -> io::Result<String> {
            Ok(self.0.remove(0))
        }
    }

    #[test]
    fn ensure_required_prompts_and_saves_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf");
        let mut cfg = Config::default();
        let answers: Vec<String> = Config::REQUIRED_KEYS
            .iter()
            .map(|k| format!("answer-{k}"))
            .collect();
        let mut prompter = FixedPrompter(answers);
        let changed = ensure_required(&mut cfg, &path, &mut prompter).unwrap();
        assert!(changed);
        assert!(path.exists());
        for key in Config::REQUIRED_KEYS {
            assert_eq!(cfg.get_field(key).unwrap(), format!("answer-{key}"));
        }
    }

    #[test]
    fn ensure_required_is_noop_when_all_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf");
        let mut cfg = Config::default();
        for key in Config::REQUIRED_KEYS {
            cfg.set_field(key, "x".into());
        }
        let mut prompter = FixedPrompter(vec![]);
        let changed = ensure_required(&mut cfg, &path, &mut prompter).unwrap();
        assert!(!changed);
        assert!(!path.exists());
    }
}

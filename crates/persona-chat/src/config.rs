//! Loading the persona file and checking user-supplied settings.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use persona_chat_core::Personas;

/// The error type for loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The persona file could not be read.
    Io {
        /// Path of the persona file.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// The persona file is not valid TOML, or has unexpected keys.
    Parse {
        /// Path of the persona file.
        path: PathBuf,
        /// The underlying parse error.
        source: toml::de::Error,
    },
    /// A sampling parameter is out of range.
    InvalidSampling(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "cannot parse {}: {source}", path.display())
            }
            ConfigError::InvalidSampling(reason) => {
                write!(f, "invalid sampling parameters: {reason}")
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::InvalidSampling(_) => None,
        }
    }
}

/// Parses personas from TOML. Keys left out keep their default values.
///
/// ```toml
/// opening = "start by asking how they are doing"
///
/// [a]
/// system_prompt = "You are a human texting your coworker..."
///
/// [b]
/// system_prompt = "You are a human. Reply to your coworker..."
/// ```
#[inline]
pub fn parse_personas(source: &str) -> Result<Personas, toml::de::Error> {
    toml::from_str(source)
}

/// Reads and parses a persona file.
pub fn load_personas(path: &Path) -> Result<Personas, ConfigError> {
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })?;
    let personas =
        parse_personas(&source).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
    debug!("loaded personas from {}", path.display());
    Ok(personas)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial() {
        let personas = parse_personas(
            r#"
            opening = "say hi"

            [b]
            system_prompt = "You are suspicious of gadgets."
            "#,
        )
        .unwrap();
        assert_eq!(personas.opening, "say hi");
        assert_eq!(personas.b.system_prompt, "You are suspicious of gadgets.");
        assert_eq!(personas.a, Personas::default().a);
    }

    #[test]
    fn test_parse_example_file() {
        let personas =
            parse_personas(include_str!("../personas.example.toml")).unwrap();
        let defaults = Personas::default();
        assert_eq!(personas.a, defaults.a);
        assert_eq!(personas.opening, defaults.opening);
        assert!(personas.b.system_prompt.contains("careful with money"));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(parse_personas("").unwrap(), Personas::default());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_personas("[a]\nsystem_prompt = 42\n").is_err());
        assert!(parse_personas("[a]\n").is_err());
        assert!(parse_personas("openning = \"typo\"\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_personas(Path::new("/nonexistent/personas.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/personas.toml"));
    }
}

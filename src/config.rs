use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while validating or compiling a [`CleanupConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid regex in {field}: {pattern:?}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("{field} contains an empty entry")]
    EmptyEntry { field: &'static str },
    #[error("scrub_length_threshold must be > 0")]
    InvalidThreshold,
    #[error("section_headers must not be empty")]
    NoHeaders,
}

/// Which retained lines go through the pattern scrubber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrubMode {
    /// Only long lines carrying a noise marker.
    #[default]
    MixedOnly,
    /// Every retained content line.
    AllLines,
}

/// Vocabulary and heuristics for deed cleanup.
///
/// The default vocabulary was tuned on Spanish notarial paper (timbre del
/// Estado, clase 8ª stock). It is a starting point; callers processing other
/// paper stock should ship their own list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub version: u32,

    /// Literal substrings, matched case-insensitively.
    pub noise_markers: BTreeSet<String>,

    /// Ordered section titles. Matched case-sensitively on word boundaries.
    pub section_headers: Vec<String>,

    /// Regexes for lines that must never be scrubbed or dropped.
    pub sacred_line_patterns: Vec<String>,

    /// Words whose trailing period never ends a paragraph (without the dot).
    pub abbreviations: Vec<String>,

    /// Lines at or above this many chars are scrubbed in place rather than
    /// dropped when they carry a noise marker.
    pub scrub_length_threshold: usize,

    pub scrub_mode: ScrubMode,

    /// Drop short paper-serial lines (`AB1234567`) and bare `MM/YYYY` lines.
    pub drop_code_lines: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        let noise_markers = [
            "TIMBRE DEL ESTADO",
            "PAPEL EXCLUSIVO",
            "DOCUMENTOS NOTARIALES",
            "CLASE 8",
            "CLASE 6",
            "CLASE 4",
            "0,15 €",
            "0,03 €",
            "0,15 EUROS",
            "0,03 EUROS",
            "R.C.M.FN",
            "TU19",
            "TU20",
            "TU21",
            "TU22",
            "TU23",
            "TU24",
            "TU25",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let section_headers = [
            "ESCRITURA",
            "COMPARECEN",
            "COMPARECE",
            "INTERVIENEN",
            "INTERVIENE",
            "EXPONEN",
            "EXPONE",
            "OTORGAN",
            "OTORGA",
            "ESTIPULACIONES",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let sacred_line_patterns = vec![
            r"^\s*En\s+\p{Lu}[\p{L} ]*,".to_string(),
            r"(?i)\bante\s+m[ií]\b".to_string(),
            r"(?i)\bnotari[oa]\s+del\s+ilustre\s+colegio\b".to_string(),
        ];

        let abbreviations = [
            "Sr", "Sra", "Sres", "Srta", "Dña", "Dª", "Ilmo", "Ilma", "Excmo", "Excma", "núm",
            "art", "Avda", "Cía",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            version: 1,
            noise_markers,
            section_headers,
            sacred_line_patterns,
            abbreviations,
            scrub_length_threshold: 60,
            scrub_mode: ScrubMode::default(),
            drop_code_lines: true,
        }
    }
}

impl CleanupConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scrub_length_threshold == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        if self.section_headers.is_empty() {
            return Err(ConfigError::NoHeaders);
        }
        let lists: [(&'static str, Vec<&String>); 4] = [
            ("noise_markers", self.noise_markers.iter().collect()),
            ("section_headers", self.section_headers.iter().collect()),
            ("sacred_line_patterns", self.sacred_line_patterns.iter().collect()),
            ("abbreviations", self.abbreviations.iter().collect()),
        ];
        for (field, entries) in lists {
            if entries.iter().any(|e| e.trim().is_empty()) {
                return Err(ConfigError::EmptyEntry { field });
            }
        }
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read cleanup config from {:?}", path))?;

        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse cleanup config {:?}", path))?;

        config
            .validate()
            .with_context(|| format!("Invalid cleanup config {:?}", path))?;

        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).with_context(|| "Failed to serialize cleanup config")
    }
}

impl fmt::Display for CleanupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} ({} markers, {} headers, {} sacred patterns, threshold={}, mode={:?})",
            self.version,
            self.noise_markers.len(),
            self.section_headers.len(),
            self.sacred_line_patterns.len(),
            self.scrub_length_threshold,
            self.scrub_mode,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        assert!(CleanupConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = CleanupConfig {
            scrub_length_threshold: 0,
            ..CleanupConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThreshold)));
    }

    #[test]
    fn test_blank_marker_rejected() {
        let mut config = CleanupConfig::default();
        config.noise_markers.insert("   ".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyEntry { field: "noise_markers" })
        ));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"scrub_length_threshold": 120, "scrub_mode": "all_lines"}}"#).unwrap();

        let config = CleanupConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.scrub_length_threshold, 120);
        assert_eq!(config.scrub_mode, ScrubMode::AllLines);
        assert_eq!(config.section_headers, CleanupConfig::default().section_headers);
    }

    #[test]
    fn test_json_roundtrip_keeps_vocabulary() {
        let config = CleanupConfig::default();
        let json = config.to_json_pretty().unwrap();
        let parsed: CleanupConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}

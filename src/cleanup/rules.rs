use regex::Regex;
use std::collections::HashSet;

use crate::config::{CleanupConfig, ConfigError, ScrubMode};

/// A [`CleanupConfig`] with every pattern compiled once.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    /// Alternation of all noise markers, case-insensitive. `None` when the list is empty.
    pub markers: Option<Regex>,
    pub sacred: Vec<Regex>,
    /// A line holding nothing but a section header.
    pub header_line: Regex,
    /// Whole-word, case-sensitive header occurrence anywhere in the text.
    pub header_word: Regex,
    /// Lowercased abbreviations whose period never ends a sentence.
    pub abbreviations: HashSet<String>,
    pub scrub_length_threshold: usize,
    pub scrub_mode: ScrubMode,
    pub drop_code_lines: bool,
}

impl CompiledRules {
    pub fn compile(config: &CleanupConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let markers = if config.noise_markers.is_empty() {
            None
        } else {
            let pattern = format!("(?i){}", alternation(config.noise_markers.iter()));
            Some(build("noise_markers", &pattern)?)
        };

        let sacred = config
            .sacred_line_patterns
            .iter()
            .map(|p| build("sacred_line_patterns", p))
            .collect::<Result<Vec<_>, _>>()?;

        let headers = alternation(config.section_headers.iter());
        let header_line = build("section_headers", &format!(r"^\s*(?:{headers})\s*[:.]?\s*$"))?;
        let header_word = build("section_headers", &format!(r"\b(?:{headers})\b"))?;

        let abbreviations = config
            .abbreviations
            .iter()
            .map(|a| a.trim().trim_end_matches('.').to_lowercase())
            .collect();

        Ok(Self {
            markers,
            sacred,
            header_line,
            header_word,
            abbreviations,
            scrub_length_threshold: config.scrub_length_threshold,
            scrub_mode: config.scrub_mode,
            drop_code_lines: config.drop_code_lines,
        })
    }

    pub fn is_sacred(&self, line: &str) -> bool {
        self.sacred.iter().any(|re| re.is_match(line))
    }

    pub fn is_header_line(&self, line: &str) -> bool {
        self.header_line.is_match(line)
    }

    pub fn has_marker(&self, line: &str) -> bool {
        self.markers.as_ref().is_some_and(|re| re.is_match(line))
    }
}

/// Escaped `a|b|c`, longest entries first so overlapping terms prefer the longer one.
fn alternation<'a>(terms: impl Iterator<Item = &'a String>) -> String {
    let mut terms: Vec<&str> = terms.map(|t| t.trim()).collect();
    terms.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    terms.dedup();
    terms
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|")
}

fn build(field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        field,
        pattern: pattern.to_string(),
        source,
    })
}

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::rules::CompiledRules;

/// Stray OCR serials: the whole line is 5-25 uppercase letters or digits.
static BARE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]{5,25}$").unwrap());

/// Paper stock serial printed in the margin, e.g. `TU1234567` or `AB 0012345`.
static PAPER_SERIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}\s?\d{6,}$").unwrap());

/// Bare `MM/YYYY` fragment from the stamp.
static DATE_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:0?[1-9]|1[0-2])/\d{4}$").unwrap());

/// Why a line was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseReason {
    Marker,
    BareCode,
    PaperSerial,
    DateFragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Blank,
    Content,
    /// Protected from scrubbing and rejection.
    Sacred,
    /// Long line carrying a noise marker; scrubbed in place.
    Mixed,
    Noise(NoiseReason),
}

impl LineClass {
    pub fn is_noise(self) -> bool {
        matches!(self, LineClass::Noise(_))
    }
}

/// Decides, line by line, what is stamp residue and what is deed text.
pub struct LineClassifier<'a> {
    rules: &'a CompiledRules,
}

impl<'a> LineClassifier<'a> {
    pub fn new(rules: &'a CompiledRules) -> Self {
        Self { rules }
    }

    pub fn classify(&self, line: &str) -> LineClass {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return LineClass::Blank;
        }

        // A standalone OTORGAN would otherwise look like a bare code.
        if self.rules.is_header_line(trimmed) {
            return LineClass::Content;
        }
        if self.rules.is_sacred(trimmed) {
            return LineClass::Sacred;
        }

        if self.rules.has_marker(trimmed) {
            return if trimmed.chars().count() >= self.rules.scrub_length_threshold {
                LineClass::Mixed
            } else {
                LineClass::Noise(NoiseReason::Marker)
            };
        }

        if BARE_CODE.is_match(trimmed) {
            return LineClass::Noise(NoiseReason::BareCode);
        }

        if self.rules.drop_code_lines {
            if PAPER_SERIAL.is_match(trimmed) {
                return LineClass::Noise(NoiseReason::PaperSerial);
            }
            if DATE_FRAGMENT.is_match(trimmed) {
                return LineClass::Noise(NoiseReason::DateFragment);
            }
        }

        LineClass::Content
    }

    pub fn is_noise(&self, line: &str) -> bool {
        self.classify(line).is_noise()
    }

    /// Drop noise lines, keeping everything else in order.
    pub fn filter<'t>(&self, lines: impl IntoIterator<Item = &'t str>) -> Vec<&'t str> {
        lines.into_iter().filter(|line| !self.is_noise(line)).collect()
    }
}

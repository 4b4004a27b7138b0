use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::debug;

use super::classifier::{LineClass, LineClassifier, NoiseReason};
use super::reconstructor::ParagraphReconstructor;
use super::rules::CompiledRules;
use super::scrubber::PatternScrubber;
use crate::config::{CleanupConfig, ConfigError, ScrubMode};
use crate::utils::text_processor::normalize_input;

static DEFAULT_CLEANER: LazyLock<DeedCleaner> = LazyLock::new(DeedCleaner::default);

/// Per-document counts of what the cleaner did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub lines_in: usize,
    pub blank_lines: usize,
    pub content_lines: usize,
    pub sacred_lines: usize,
    pub scrubbed_lines: usize,
    pub noise_lines: usize,
    pub noise_by_reason: BTreeMap<NoiseReason, usize>,
    pub chars_in: usize,
    pub chars_out: usize,
}

impl CleanupReport {
    fn record_noise(&mut self, reason: NoiseReason) {
        self.noise_lines += 1;
        *self.noise_by_reason.entry(reason).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone)]
pub struct CleanupOutcome {
    pub text: String,
    pub report: CleanupReport,
}

/// Classifier, scrubber and reconstructor bound to one compiled configuration.
///
/// Immutable after construction, so one instance can serve any number of
/// threads.
#[derive(Debug, Clone)]
pub struct DeedCleaner {
    rules: CompiledRules,
    reconstructor: ParagraphReconstructor,
}

impl Default for DeedCleaner {
    fn default() -> Self {
        // The built-in vocabulary always compiles.
        Self::new(&CleanupConfig::default()).expect("default cleanup config compiles")
    }
}

impl DeedCleaner {
    pub fn new(config: &CleanupConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            rules: CompiledRules::compile(config)?,
            reconstructor: ParagraphReconstructor::default(),
        })
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    /// Clean a raw transcription. Never fails; empty input gives an empty string.
    pub fn clean(&self, raw: &str) -> String {
        self.clean_with_report(raw).text
    }

    pub fn clean_with_report(&self, raw: &str) -> CleanupOutcome {
        let mut report = CleanupReport {
            chars_in: raw.chars().count(),
            ..CleanupReport::default()
        };

        let normalized = normalize_input(raw);
        let kept = self.filter_lines(&normalized, &mut report);
        let text = self.reconstructor.run(&kept.join("\n"), &self.rules);

        report.chars_out = text.chars().count();
        debug!(
            lines = report.lines_in,
            noise = report.noise_lines,
            scrubbed = report.scrubbed_lines,
            chars_out = report.chars_out,
            "deed text cleaned"
        );

        CleanupOutcome { text, report }
    }

    /// Classify and scrub each line, returning the survivors in order.
    fn filter_lines(&self, text: &str, report: &mut CleanupReport) -> Vec<String> {
        let classifier = LineClassifier::new(&self.rules);
        let scrubber = PatternScrubber::new(&self.rules);
        let mut kept = Vec::new();

        for line in text.split('\n') {
            report.lines_in += 1;
            match classifier.classify(line) {
                LineClass::Blank => {
                    report.blank_lines += 1;
                    kept.push(String::new());
                }
                LineClass::Noise(reason) => report.record_noise(reason),
                LineClass::Sacred => {
                    report.sacred_lines += 1;
                    kept.push(line.to_string());
                }
                LineClass::Mixed => {
                    let scrubbed = scrubber.scrub(line);
                    if scrubber.is_residue(&scrubbed) || classifier.is_noise(&scrubbed) {
                        report.record_noise(NoiseReason::Marker);
                    } else {
                        report.scrubbed_lines += 1;
                        kept.push(scrubbed);
                    }
                }
                LineClass::Content => {
                    report.content_lines += 1;
                    if self.rules.scrub_mode == ScrubMode::AllLines
                        && !self.rules.is_header_line(line)
                    {
                        let scrubbed = scrubber.scrub(line);
                        if scrubbed.trim() != line.trim() {
                            report.scrubbed_lines += 1;
                        }
                        if !scrubbed.is_empty() {
                            kept.push(scrubbed);
                        }
                    } else {
                        kept.push(line.to_string());
                    }
                }
            }
        }

        kept
    }
}

/// Clean with the built-in vocabulary. `None` and empty input give `""`.
pub fn clean_deed_text(raw: Option<&str>) -> String {
    match raw {
        Some(text) => DEFAULT_CLEANER.clean(text),
        None => String::new(),
    }
}

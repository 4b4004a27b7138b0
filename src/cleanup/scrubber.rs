use regex::Regex;
use std::sync::LazyLock;

use super::rules::CompiledRules;

/// Paper serial embedded in a line (`TU1234567`).
static INLINE_SERIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2}\d{6,}\b").unwrap());

/// Stamp date fragment embedded in a line (`03/2024`), not part of a longer date.
static INLINE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(?:0?[1-9]|1[0-2])/\d{4}(?:\s|$)").unwrap());

/// A 3-digit page number standing alone between spaces.
static PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)\d{3}(?:\s|$)").unwrap());

static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

static PROSE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}{3,}").unwrap());

/// A scrubbed line needs at least this many 3+ letter words to count as deed text.
pub const MIN_PROSE_WORDS: usize = 2;

/// Removes stamp fragments from inside lines that carry real content.
pub struct PatternScrubber<'a> {
    rules: &'a CompiledRules,
}

impl<'a> PatternScrubber<'a> {
    pub fn new(rules: &'a CompiledRules) -> Self {
        Self { rules }
    }

    /// Scrub one line. Sacred lines are returned untouched.
    pub fn scrub(&self, line: &str) -> String {
        if self.rules.is_sacred(line) {
            return line.to_string();
        }

        let mut text = match &self.rules.markers {
            Some(re) => re.replace_all(line, "").into_owned(),
            None => line.to_string(),
        };

        text = INLINE_SERIAL.replace_all(&text, "").into_owned();
        text = replace_until_stable(&INLINE_DATE, &text);
        text = replace_until_stable(&PAGE_NUMBER, &text);
        text = SPACES.replace_all(&text, " ").into_owned();

        text.trim().to_string()
    }

    /// True when a scrubbed line holds only leftovers of the stamp
    /// (`PARA - - ª` from a full-width stamp line).
    pub fn is_residue(&self, scrubbed: &str) -> bool {
        PROSE_WORD.find_iter(scrubbed).take(MIN_PROSE_WORDS).count() < MIN_PROSE_WORDS
    }
}

/// Space-delimited patterns share their delimiters, so adjacent hits need a second pass.
fn replace_until_stable(re: &Regex, input: &str) -> String {
    let mut text = input.to_string();
    while re.is_match(&text) {
        text = re.replace_all(&text, " ").into_owned();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleanupConfig;

    fn rules() -> CompiledRules {
        CompiledRules::compile(&CleanupConfig::default()).unwrap()
    }

    #[test]
    fn test_removes_embedded_marker() {
        let rules = rules();
        let scrubber = PatternScrubber::new(&rules);
        let line = "vende la finca timbre del estado libre de cargas";
        assert_eq!(scrubber.scrub(line), "vende la finca libre de cargas");
    }

    #[test]
    fn test_removes_residual_codes() {
        let rules = rules();
        let scrubber = PatternScrubber::new(&rules);
        let line = "con todos sus derechos TU7654321 03/2024 y servidumbres 117 que le son propias";
        assert_eq!(
            scrubber.scrub(line),
            "con todos sus derechos y servidumbres que le son propias"
        );
    }

    #[test]
    fn test_keeps_numbers_that_are_not_page_numbers() {
        let rules = rules();
        let scrubber = PatternScrubber::new(&rules);
        let line = "inscrita al tomo 1234, folio 12, finca 4567/2001";
        assert_eq!(scrubber.scrub(line), line);
    }

    #[test]
    fn test_adjacent_page_numbers_removed() {
        let rules = rules();
        let scrubber = PatternScrubber::new(&rules);
        assert_eq!(scrubber.scrub("uno 123 456 dos"), "uno dos");
    }

    #[test]
    fn test_sacred_line_untouched() {
        let rules = rules();
        let scrubber = PatternScrubber::new(&rules);
        let line = "ANTE MÍ, notario de Clase 8 del Ilustre Colegio";
        assert_eq!(scrubber.scrub(line), line);
    }

    #[test]
    fn test_stamp_leftovers_are_residue() {
        let rules = rules();
        let scrubber = PatternScrubber::new(&rules);
        let line = "PAPEL EXCLUSIVO PARA DOCUMENTOS NOTARIALES - TIMBRE DEL ESTADO - CLASE 8ª";
        let scrubbed = scrubber.scrub(line);
        assert!(scrubber.is_residue(&scrubbed), "kept {scrubbed:?}");
        assert!(scrubber.is_residue(""));
        assert!(!scrubber.is_residue("libre de cargas"));
    }
}

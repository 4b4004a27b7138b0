//! Turns the surviving lines back into prose.
//!
//! Reconstruction is an ordered list of named steps over the whole text.
//! Intermediate structure is carried by private-use sentinels, which
//! [`finalize_breaks`] turns into real line breaks:
//!
//! * [`PARA_BREAK`] - a blank line must precede what follows.
//! * [`LINE_BREAK`] - a single newline must follow a heading.
//! * [`PROTECTED_DOT`] - an abbreviation period that never ends a paragraph.
//!
//! Input is expected to be free of these characters; see
//! [`crate::utils::text_processor::normalize_input`].

use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::trace;

use super::rules::CompiledRules;

pub const PARA_BREAK: char = '\u{E000}';
pub const LINE_BREAK: char = '\u{E001}';
pub const PROTECTED_DOT: char = '\u{E002}';

static HYPHENATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\p{L})-(?:[ \t]*\n[ \t]*|[ \t]+)(\p{Ll})").unwrap()
});
static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n(?:[ \t]*\n)*[ \t]*").unwrap());
static HORIZONTAL_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());
static BREAK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\n\s*").unwrap());
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.:;)])").unwrap());
static SPACE_AFTER_PAREN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s+").unwrap());
static SPACED_SLASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+/\s+").unwrap());
static SPACED_INITIALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\p{Lu})\.[ \t]+(\p{Lu})\.").unwrap());
static WORD_DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([\p{L}\p{N}]+)\.").unwrap());
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\s+(\p{Lu})").unwrap());
static HONORIFIC_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(D|Dª|Dña|Sr|Sra|Sres|Srta)\.\s*\n\n\s*").unwrap()
});
static SENTINEL_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\s\x{E000}\x{E001}]*[\x{E000}\x{E001}][\s\x{E000}\x{E001}]*").unwrap()
});

/// One named text transform.
#[derive(Clone, Copy)]
pub struct Step {
    pub name: &'static str,
    apply: fn(&str, &CompiledRules) -> String,
}

impl Step {
    pub fn new(name: &'static str, apply: fn(&str, &CompiledRules) -> String) -> Self {
        Self { name, apply }
    }

    pub fn apply(&self, text: &str, rules: &CompiledRules) -> String {
        (self.apply)(text, rules)
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Step").field(&self.name).finish()
    }
}

/// Fixed step order. `protect_abbreviations` must run before
/// `promote_paragraphs`, and `restore_abbreviations` right after it.
pub fn standard_steps() -> Vec<Step> {
    vec![
        Step::new("mark_header_lines", mark_header_lines),
        Step::new("join_hyphenated", |t, _| join_hyphenated(t)),
        Step::new("unwrap_lines", |t, _| unwrap_lines(t)),
        Step::new("collapse_whitespace", |t, _| collapse_whitespace(t)),
        Step::new("tighten_punctuation", |t, _| tighten_punctuation(t)),
        Step::new("compact_initialisms", |t, _| compact_initialisms(t)),
        Step::new("protect_abbreviations", protect_abbreviations),
        Step::new("promote_paragraphs", |t, _| promote_paragraphs(t)),
        Step::new("restore_abbreviations", |t, _| restore_abbreviations(t)),
        Step::new("repair_honorific_breaks", |t, _| repair_honorific_breaks(t)),
        Step::new("promote_headers", promote_headers),
        Step::new("finalize_breaks", |t, _| finalize_breaks(t)),
    ]
}

#[derive(Debug, Clone)]
pub struct ParagraphReconstructor {
    steps: Vec<Step>,
}

impl Default for ParagraphReconstructor {
    fn default() -> Self {
        Self {
            steps: standard_steps(),
        }
    }
}

impl ParagraphReconstructor {
    pub fn steps(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|s| s.name)
    }

    pub fn run(&self, text: &str, rules: &CompiledRules) -> String {
        let mut current = text.to_string();
        for step in &self.steps {
            current = step.apply(&current, rules);
            trace!(step = step.name, len = current.len(), "reconstruction step");
        }
        current.trim().to_string()
    }
}

/// A line that is only a section header becomes `PARA_BREAK header LINE_BREAK`.
pub fn mark_header_lines(text: &str, rules: &CompiledRules) -> String {
    text.split('\n')
        .map(|line| {
            if rules.is_header_line(line) {
                format!("{PARA_BREAK}{}{LINE_BREAK}", line.trim())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `compra-\nventa` and `compra- venta` become `compraventa`.
pub fn join_hyphenated(text: &str) -> String {
    HYPHENATION.replace_all(text, "${1}${2}").into_owned()
}

/// Single newlines are OCR wrap; blank lines are kept as one paragraph break.
pub fn unwrap_lines(text: &str) -> String {
    LINE_BREAKS
        .replace_all(text, |caps: &Captures| {
            if caps[0].matches('\n').count() > 1 {
                "\n\n"
            } else {
                " "
            }
        })
        .into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    let text = HORIZONTAL_SPACE.replace_all(text, " ");
    BREAK_RUNS
        .replace_all(&text, |caps: &Captures| {
            if caps[0].matches('\n').count() > 1 {
                "\n\n"
            } else {
                " "
            }
        })
        .into_owned()
}

pub fn tighten_punctuation(text: &str) -> String {
    let text = SPACE_BEFORE_PUNCT.replace_all(text, "$1");
    let text = SPACE_AFTER_PAREN.replace_all(&text, "(");
    SPACED_SLASH.replace_all(&text, "/").into_owned()
}

/// `D. N. I.` becomes `D.N.I.`.
pub fn compact_initialisms(text: &str) -> String {
    let mut current = text.to_string();
    // Matches overlap on the shared letter, so each pass joins every other pair.
    while SPACED_INITIALS.is_match(&current) {
        current = SPACED_INITIALS
            .replace_all(&current, "${1}.${2}.")
            .into_owned();
    }
    current
}

/// Swap the period after initials and known abbreviations for [`PROTECTED_DOT`].
pub fn protect_abbreviations(text: &str, rules: &CompiledRules) -> String {
    WORD_DOT
        .replace_all(text, |caps: &Captures| {
            let word = &caps[1];
            let mut chars = word.chars();
            let single_initial = matches!(
                (chars.next(), chars.next()),
                (Some(c), None) if c.is_uppercase()
            );
            if single_initial || rules.abbreviations.contains(&word.to_lowercase()) {
                format!("{word}{PROTECTED_DOT}")
            } else {
                format!("{word}.")
            }
        })
        .into_owned()
}

/// A period followed by whitespace and a capital starts a new paragraph.
pub fn promote_paragraphs(text: &str) -> String {
    SENTENCE_END.replace_all(text, ".\n\n$1").into_owned()
}

pub fn restore_abbreviations(text: &str) -> String {
    text.replace(PROTECTED_DOT, ".")
}

/// `D.\n\nJuan` back to `D. Juan` when a blank line split a title from its name.
pub fn repair_honorific_breaks(text: &str) -> String {
    HONORIFIC_BREAK.replace_all(text, "${1}. ").into_owned()
}

/// Put a [`PARA_BREAK`] before every header occurrence, absorbing the whitespace before it.
pub fn promote_headers(text: &str, rules: &CompiledRules) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut last = 0;
    for found in rules.header_word.find_iter(text) {
        out.push_str(&text[last..found.start()]);
        let kept = out.trim_end().len();
        out.truncate(kept);
        if !out.ends_with(PARA_BREAK) {
            out.push(PARA_BREAK);
        }
        out.push_str(found.as_str());
        last = found.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Resolve sentinels and surrounding whitespace into `\n\n` or `\n`.
pub fn finalize_breaks(text: &str) -> String {
    SENTINEL_RUN
        .replace_all(text, |caps: &Captures| {
            let run = &caps[0];
            if run.contains(PARA_BREAK) || run.matches('\n').count() > 1 {
                "\n\n"
            } else {
                "\n"
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CleanupConfig;

    fn rules() -> CompiledRules {
        CompiledRules::compile(&CleanupConfig::default()).unwrap()
    }

    fn reconstruct(text: &str) -> String {
        ParagraphReconstructor::default().run(text, &rules())
    }

    #[test]
    fn test_step_order_protects_before_promoting() {
        let reconstructor = ParagraphReconstructor::default();
        let names: Vec<_> = reconstructor.steps().collect();
        let protect = names.iter().position(|n| *n == "protect_abbreviations").unwrap();
        let promote = names.iter().position(|n| *n == "promote_paragraphs").unwrap();
        let restore = names.iter().position(|n| *n == "restore_abbreviations").unwrap();
        assert!(protect < promote && promote < restore);
    }

    #[test]
    fn test_join_hyphenated() {
        assert_eq!(join_hyphenated("compra-\nventa"), "compraventa");
        assert_eq!(join_hyphenated("compra-  \n  venta"), "compraventa");
        assert_eq!(join_hyphenated("compra- venta"), "compraventa");
        assert_eq!(join_hyphenated("Madrid - Barcelona"), "Madrid - Barcelona");
        assert_eq!(join_hyphenated("hispano-\nAmericana"), "hispano-\nAmericana");
    }

    #[test]
    fn test_unwrap_lines_keeps_blank_line_breaks() {
        assert_eq!(unwrap_lines("uno\ndos\n\ntres"), "uno dos\n\ntres");
        assert_eq!(unwrap_lines("uno \n \n\n dos"), "uno\n\ndos");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a  \t b"), "a b");
        assert_eq!(collapse_whitespace("a \n\n  b"), "a\n\nb");
        assert_eq!(collapse_whitespace("a\u{a0}\u{a0}b"), "a b");
    }

    #[test]
    fn test_tighten_punctuation() {
        assert_eq!(
            tighten_punctuation("finca , sita en ( Madrid ) ; calle 3 / 2 ."),
            "finca, sita en (Madrid); calle 3/2."
        );
    }

    #[test]
    fn test_compact_initialisms() {
        assert_eq!(compact_initialisms("con D. N. I. número"), "con D.N.I. número");
        assert_eq!(compact_initialisms("D. Juan"), "D. Juan");
    }

    #[test]
    fn test_promote_paragraphs_accented_capitals() {
        assert_eq!(promote_paragraphs("fin. Él dijo"), "fin.\n\nÉl dijo");
        assert_eq!(promote_paragraphs("fin. Ñandú"), "fin.\n\nÑandú");
        assert_eq!(promote_paragraphs("fin. y sigue"), "fin. y sigue");
        assert_eq!(promote_paragraphs("texto.Siguiente"), "texto.Siguiente");
    }

    #[test]
    fn test_abbreviation_periods_do_not_break() {
        assert_eq!(
            reconstruct("comparece D. Juan Pérez, con D. N. I. Número 123"),
            "comparece D. Juan Pérez, con D.N.I. Número 123"
        );
        assert_eq!(
            reconstruct("la Sra. Martínez y el Sr. López"),
            "la Sra. Martínez y el Sr. López"
        );
    }

    #[test]
    fn test_repair_honorific_breaks() {
        assert_eq!(repair_honorific_breaks("a D.\n\nJuan"), "a D. Juan");
        assert_eq!(repair_honorific_breaks("finca.\n\nJuan"), "finca.\n\nJuan");
        assert_eq!(reconstruct("comparece D.\n\nJuan Pérez"), "comparece D. Juan Pérez");
    }

    #[test]
    fn test_sentence_becomes_paragraph() {
        assert_eq!(
            reconstruct("el notario. El compareciente"),
            "el notario.\n\nEl compareciente"
        );
    }

    #[test]
    fn test_header_mid_paragraph_gets_blank_line() {
        assert_eq!(
            reconstruct("ante mí, el notario, COMPARECEN los señores"),
            "ante mí, el notario,\n\nCOMPARECEN los señores"
        );
    }

    #[test]
    fn test_header_after_sentence_not_doubled() {
        assert_eq!(
            reconstruct("dijo la verdad. OTORGAN las partes"),
            "dijo la verdad.\n\nOTORGAN las partes"
        );
    }

    #[test]
    fn test_header_line_is_a_heading() {
        assert_eq!(
            reconstruct("vendía la finca.\nOTORGAN\nQue procede"),
            "vendía la finca.\n\nOTORGAN\nQue procede"
        );
        assert_eq!(
            reconstruct("COMPARECEN:\nDon Juan\nINTERVIENEN\nen su propio nombre"),
            "COMPARECEN:\nDon Juan\n\nINTERVIENEN\nen su propio nombre"
        );
    }

    #[test]
    fn test_lowercase_header_word_left_alone() {
        assert_eq!(
            reconstruct("autoriza la presente escritura de compraventa"),
            "autoriza la presente escritura de compraventa"
        );
    }

    #[test]
    fn test_header_inside_longer_word_not_promoted() {
        assert_eq!(
            reconstruct("hoy COMPARECENCIA de los señores"),
            "hoy COMPARECENCIA de los señores"
        );
        assert_eq!(
            reconstruct("copia de las ESCRITURAS públicas"),
            "copia de las ESCRITURAS públicas"
        );
        assert_eq!(
            reconstruct("hoy COMPARECEN los señores"),
            "hoy\n\nCOMPARECEN los señores"
        );
    }

    #[test]
    fn test_reconstruct_is_idempotent() {
        let inputs = [
            "vendía la finca.\nOTORGAN\nQue procede. Y el notario. El compareciente",
            "ante mí COMPARECEN D. N. I. 5. Sr. López.\n\nFin",
            "COMPARECEN:\nDon Juan\nINTERVIENEN\nen su propio nombre",
            "uno ,  dos ( tres ) .   Cuatro\n\n\n cinco",
            "que lo firman conmigo. NOTARIO",
        ];
        for input in inputs {
            let once = reconstruct(input);
            let twice = reconstruct(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(reconstruct(""), "");
        assert_eq!(reconstruct(" \n\n \t"), "");
    }
}

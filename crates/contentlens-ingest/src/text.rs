//! Text cleanup, brief heuristics and language detection.

use tracing::{info, warn};

/// Strip control characters and collapse every whitespace run to one space.
pub fn sanitize_text(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keyword-density check for "does this look like a media brief".
///
/// Only ever used for a warning; it never gates processing.
#[derive(Debug, Clone)]
pub struct BriefValidator {
    keywords: Vec<String>,
    min_matches: usize,
}

impl Default for BriefValidator {
    fn default() -> Self {
        Self {
            keywords: ["target", "audience", "budget", "objective", "kpi", "campaign"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_matches: 2,
        }
    }
}

impl BriefValidator {
    /// Keywords present in `text`, case-insensitively.
    pub fn matched_keywords(&self, text: &str) -> Vec<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn is_valid_brief(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let matches = self.matched_keywords(text).len();
        info!(matches, "Brief validator found keywords");
        if matches < self.min_matches {
            warn!("Document does not look like a professional brief");
            return false;
        }
        true
    }
}

/// Returned for text too short to classify.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const MIN_DETECTABLE_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Script {
    Arabic,
    Hebrew,
    Cyrillic,
    Greek,
    Han,
    Latin,
}

impl Script {
    fn of(c: char) -> Option<Self> {
        match c as u32 {
            0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB50..=0xFDFF
            | 0xFE70..=0xFEFF => Some(Script::Arabic),
            0x0590..=0x05FF => Some(Script::Hebrew),
            0x0400..=0x04FF => Some(Script::Cyrillic),
            0x0370..=0x03FF => Some(Script::Greek),
            0x4E00..=0x9FFF | 0x3400..=0x4DBF => Some(Script::Han),
            _ if c.is_alphabetic() && (c.is_ascii() || ('\u{00C0}'..='\u{024F}').contains(&c)) => {
                Some(Script::Latin)
            }
            _ => None,
        }
    }

    fn code(self) -> &'static str {
        match self {
            Script::Arabic => "ar",
            Script::Hebrew => "he",
            Script::Cyrillic => "ru",
            Script::Greek => "el",
            Script::Han => "zh",
            Script::Latin => "en",
        }
    }
}

/// Best-effort ISO 639-1 code from the dominant script of `text`.
///
/// Never fails: short or letterless input yields [`UNKNOWN_LANGUAGE`].
/// Latin-script text is reported as `"en"`.
pub fn detect_language(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_DETECTABLE_CHARS {
        return UNKNOWN_LANGUAGE.to_string();
    }

    let mut counts = [0usize; 6];
    let scripts = [
        Script::Arabic,
        Script::Hebrew,
        Script::Cyrillic,
        Script::Greek,
        Script::Han,
        Script::Latin,
    ];
    for script in trimmed.chars().filter_map(Script::of) {
        if let Some(i) = scripts.iter().position(|s| *s == script) {
            counts[i] += 1;
        }
    }

    let best = counts
        .iter()
        .enumerate()
        .filter(|(_, n)| **n > 0)
        .max_by_key(|(_, n)| **n)
        .map(|(i, _)| scripts[i].code())
        .unwrap_or(UNKNOWN_LANGUAGE);

    info!(language = best, "Language detected");
    best.to_string()
}

//! Job description distiller — keeps the lines of a posting that carry
//! requirement or experience signals.

use std::sync::OnceLock;

use regex::Regex;

use crate::scoring::normalize::normalize;

/// Stems matched against normalized (accent-free, lowercase) lines.
const KEYWORD_STEMS: &[&str] = &[
    "responsab",
    "requisito",
    "experienc",
    "conocimiento",
    "educaci",
    "rol",
    "labor",
    "nivel educativo",
    "puesto",
    "habilidad",
    "actividades",
    "funciones",
    "años",
    "minimo",
];

/// Lines kept from the end of the posting when no line matches.
const FALLBACK_TAIL_LINES: usize = 5;

static YEARS_RE: OnceLock<Regex> = OnceLock::new();

/// Normalizes `raw` and returns the signal-bearing lines joined with `". "`.
///
/// Splits on newlines when present, otherwise on periods. When no line matches a
/// keyword stem or a "<n> años/years" pattern, the last five lines are kept instead
/// so the result is non-empty whenever the input is.
pub fn distill(raw: &str) -> String {
    let text = normalize(raw);
    let separator = if text.contains('\n') { '\n' } else { '.' };

    let lines: Vec<&str> = text
        .split(separator)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let key_lines: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| is_signal_line(l))
        .collect();

    if key_lines.is_empty() {
        let tail_start = lines.len().saturating_sub(FALLBACK_TAIL_LINES);
        return lines[tail_start..].join(". ");
    }

    key_lines.join(". ")
}

fn is_signal_line(line: &str) -> bool {
    let years = YEARS_RE.get_or_init(|| Regex::new(r"[0-9]+\s*(?:años|year)").expect("years regex"));
    let lower = line.to_lowercase();
    KEYWORD_STEMS.iter().any(|kw| lower.contains(kw)) || years.is_match(&lower)
}

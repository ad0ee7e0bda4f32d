//! Text normalization shared by every text block fed to the embedder.

use std::sync::OnceLock;

use regex::Regex;

/// Accented vowels folded to their plain lowercase letter. `ñ` is deliberately absent.
const ACCENT_FOLDS: &[(char, char)] = &[
    ('á', 'a'),
    ('é', 'e'),
    ('í', 'i'),
    ('ó', 'o'),
    ('ú', 'u'),
    ('Á', 'a'),
    ('É', 'e'),
    ('Í', 'i'),
    ('Ó', 'o'),
    ('Ú', 'u'),
];

static UNWANTED_RE: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

/// Folds accents, drops punctuation other than `, . : -`, collapses whitespace,
/// trims and lowercases. Never fails.
pub fn normalize(text: &str) -> String {
    let unwanted = UNWANTED_RE
        .get_or_init(|| Regex::new(r"[^\w\s,.:\-ñÑ]").expect("unwanted chars regex"));
    let whitespace = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));

    let folded: String = text.chars().map(fold_accent).collect();
    let stripped = unwanted.replace_all(&folded, "");
    let collapsed = whitespace.replace_all(&stripped, " ");

    collapsed.trim().to_lowercase()
}

fn fold_accent(c: char) -> char {
    ACCENT_FOLDS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
        .unwrap_or(c)
}

//! Years-of-experience extraction, from posting text and from the candidate's
//! self-reported range.

use std::sync::OnceLock;

use regex::Regex;

/// Values above this are assumed to be calendar years or other numbers, not durations.
const MAX_PLAUSIBLE_YEARS: u64 = 10;

static JOB_YEARS_RE: OnceLock<Regex> = OnceLock::new();
static PLUS_RE: OnceLock<Regex> = OnceLock::new();
static RANGE_RE: OnceLock<Regex> = OnceLock::new();
static NUMBER_RE: OnceLock<Regex> = OnceLock::new();

/// Years of experience a posting asks for.
///
/// Only ASCII digits count. Collects every "<n> years" / "years <n>" mention (Spanish or English) in order.
/// If the first one is implausibly large, the first later value that is plausible
/// wins; with none, the result is 0.
pub fn extract_job_years(text: Option<&str>) -> f64 {
    let Some(text) = text else {
        return 0.0;
    };
    let re = JOB_YEARS_RE.get_or_init(|| {
        Regex::new(r"(?i)(?:([0-9]+)\s*(?:año|años|year|years))|(?:(?:año|años|year|years)\s*([0-9]+))")
            .expect("job years regex")
    });

    let years: Vec<u64> = re
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        // digit runs that overflow are as implausible as any other huge number
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .collect();

    match years.split_first() {
        None => 0.0,
        Some((&first, _)) if first <= MAX_PLAUSIBLE_YEARS => first as f64,
        Some((_, rest)) => rest
            .iter()
            .find(|&&y| y <= MAX_PLAUSIBLE_YEARS)
            .map(|&y| y as f64)
            .unwrap_or(0.0),
    }
}

/// Parses a candidate range such as "5+ years", "1-3 years" or "10 years".
///
/// Open bounds return the bound, ranges return the upper end, bare numbers
/// return themselves. Anything else is 0.
#[allow(dead_code)]
pub fn parse_years_string(value: Option<&str>) -> f64 {
    parse_years(value).unwrap_or(0.0)
}

/// Like `parse_years_string`, but `None` when no number was found, so callers can
/// tell "no figure given" from an explicit zero. Only ASCII digits count.
pub fn parse_years(value: Option<&str>) -> Option<f64> {
    let label = value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())?;

    if label.contains('+') {
        let re = PLUS_RE.get_or_init(|| Regex::new(r"([0-9]+)\+").expect("plus regex"));
        return first_group(re, &label);
    }

    let range =
        RANGE_RE.get_or_init(|| Regex::new(r"([0-9]+)\s*-\s*([0-9]+)").expect("range regex"));
    if let Some(caps) = range.captures(&label) {
        return caps[2].parse::<f64>().ok();
    }

    let number = NUMBER_RE.get_or_init(|| Regex::new(r"([0-9]+)").expect("number regex"));
    first_group(number, &label)
}

fn first_group(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

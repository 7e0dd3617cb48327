// Best-effort degradation for content that passes the gate. Ambiguous
// manipulation phrasings are masked rather than rejected, so borderline
// text still cannot override downstream instructions.

use std::sync::LazyLock;

use regex::Regex;

/// Replacement marker for masked phrasings.
const MASK: &str = "[filtered]";

/// Occurrences of a suspicious term beyond this count are masked.
const MAX_SUSPICIOUS_REPEATS: usize = 3;

/// Weaker or ambiguous manipulation phrasings. Too noisy for the hard gate,
/// but nothing legitimate needs them verbatim inside scored content.
static SOFT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)pretend\s+(?:you\s+are|to\s+be)\s+").unwrap(),
        Regex::new(r"(?i)act\s+as\s+(?:a|an|my|the)\s+").unwrap(),
        Regex::new(r"(?i)you\s+must\s+(?:give|award|rate|grade)").unwrap(),
        Regex::new(r"(?i)rate\s+this\s+(?:highly|generously)").unwrap(),
        Regex::new(r"(?i)as\s+an\s+ai(?:\s+(?:model|assistant|language\s+model))?").unwrap(),
        // Chat-role framing has no business inside submitted content
        Regex::new(r"(?im)^\s*(?:system|assistant|user)\s*:").unwrap(),
        Regex::new(r"(?i)<<SYS>>|\[INST\]|<\|im_start\|>|<\|im_end\|>").unwrap(),
    ]
});

/// Terms capped at MAX_SUSPICIOUS_REPEATS occurrences.
static SUSPICIOUS_TERMS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["ignore", "override", "bypass", "jailbreak"]
        .iter()
        .map(|term| Regex::new(&format!(r"(?i)\b{term}\b")).unwrap())
        .collect()
});

/// The always-applied soft pass. Strips invisible Unicode and control
/// characters, masks ambiguous manipulation phrasings, and caps repeated
/// suspicious terms.
pub fn sanitize(content: &str) -> String {
    let visible = strip_invisible_chars(content);

    let mut masked = visible;
    let mut mask_count = 0usize;
    for pattern in SOFT_PATTERNS.iter() {
        let hits = pattern.find_iter(&masked).count();
        if hits > 0 {
            mask_count += hits;
            masked = pattern.replace_all(&masked, MASK).into_owned();
        }
    }

    for pattern in SUSPICIOUS_TERMS.iter() {
        masked = cap_repeats(&masked, pattern, MAX_SUSPICIOUS_REPEATS);
    }

    if mask_count > 0 {
        tracing::warn!(mask_count, "Suspicious phrasings masked before prompt build");
    }

    masked
}

/// Remove zero-width and directional Unicode plus control characters
/// (newline and tab survive).
fn strip_invisible_chars(text: &str) -> String {
    text.chars()
        .filter(|c| {
            if *c == '\n' || *c == '\t' {
                return true;
            }
            if c.is_control() {
                return false;
            }
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}'  // Zero-width chars
                | '\u{202A}'..='\u{202E}' // Directional formatting
                | '\u{2060}'..='\u{2064}' // Invisible operators
                | '\u{2066}'..='\u{2069}' // Directional isolates
                | '\u{FEFF}'              // BOM
                | '\u{00AD}'              // Soft hyphen
            )
        })
        .collect()
}

/// Mask every occurrence of `pattern` beyond the first `limit`.
fn cap_repeats(text: &str, pattern: &Regex, limit: usize) -> String {
    let ranges: Vec<_> = pattern
        .find_iter(text)
        .skip(limit)
        .map(|m| (m.start(), m.end()))
        .collect();
    if ranges.is_empty() {
        return text.to_string();
    }

    let mut result = text.to_string();
    for (start, end) in ranges.into_iter().rev() {
        result.replace_range(start..end, MASK);
    }
    result
}

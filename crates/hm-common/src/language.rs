//! Language proficiency normalization.
//!
//! Free-form level strings ("IELTS 7.5", "JLPT N2", "business level") are
//! folded onto a single ordered ladder so requirement checks reduce to an
//! index comparison. Certificate rules run before the generic alias table:
//! "TOEIC 450" must band on the score, not fall through to a word match.

use std::sync::LazyLock;

use regex::Regex;

/// Proficiency ladder, weakest first. Index into this is the ordinal level.
pub const LANGUAGE_LEVELS: [&str; 11] = [
    "beginner",
    "elementary",
    "basic",
    "pre-intermediate",
    "lower-intermediate",
    "intermediate",
    "upper-intermediate",
    "advanced",
    "fluent",
    "native",
    "bilingual",
];

const DEFAULT_LEVEL: &str = "intermediate";

/// Alias → canonical level, matched by substring in order. Compound names
/// (`upper-intermediate`) and multi-word phrases (`limited working`) come
/// before the shorter strings they contain, so every canonical ladder name
/// maps to itself.
const LEVEL_ALIASES: &[(&str, &str)] = &[
    // JLPT spelled out in full
    ("japanese language proficiency test level 1", "fluent"),
    ("japanese language proficiency test level 2", "advanced"),
    ("japanese language proficiency test level 3", "intermediate"),
    (
        "japanese language proficiency test level 4",
        "pre-intermediate",
    ),
    ("japanese language proficiency test level 5", "elementary"),
    // Compound ladder names before their substrings
    ("upper-intermediate", "upper-intermediate"),
    ("lower-intermediate", "lower-intermediate"),
    ("pre-intermediate", "pre-intermediate"),
    // Multi-word phrases before single words
    ("working proficiency", "advanced"),
    ("limited working", "pre-intermediate"),
    ("daily conversation", "intermediate"),
    ("mother tongue", "native"),
    // Canonical names and single-word aliases
    ("bilingual", "bilingual"),
    ("native", "native"),
    ("fluent", "fluent"),
    ("proficient", "fluent"),
    ("advanced", "advanced"),
    ("business", "advanced"),
    ("professional", "advanced"),
    ("intermediate", "intermediate"),
    ("conversational", "intermediate"),
    ("elementary", "elementary"),
    ("survival", "elementary"),
    ("beginner", "beginner"),
    ("basic", "basic"),
    // CEFR codes and JLPT short forms
    ("a1", "beginner"),
    ("a2", "elementary"),
    ("b1", "pre-intermediate"),
    ("b2", "intermediate"),
    ("c1", "advanced"),
    ("c2", "fluent"),
    ("n1", "fluent"),
    ("n2", "advanced"),
    ("n3", "intermediate"),
    ("n4", "pre-intermediate"),
    ("n5", "elementary"),
];

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").unwrap());
static INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").unwrap());
static HSK_LEVEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:level\s*)?(\d+)").unwrap());

/// Fold a free-form proficiency string onto the ladder.
///
/// Empty or unrecognized input resolves to `intermediate`. Every name in
/// [`LANGUAGE_LEVELS`] is a fixed point of this function.
pub fn normalize_language_level(level: &str) -> &'static str {
    let lower = level.to_lowercase();
    let lower = lower.trim();
    if lower.is_empty() {
        return DEFAULT_LEVEL;
    }

    if let Some(banded) = english_certificate_level(lower) {
        return banded;
    }
    if let Some(banded) = japanese_certificate_level(lower) {
        return banded;
    }
    if let Some(banded) = chinese_certificate_level(lower) {
        return banded;
    }
    if let Some(banded) = european_certificate_level(lower) {
        return banded;
    }

    for (alias, canonical) in LEVEL_ALIASES {
        if lower.contains(alias) {
            return canonical;
        }
    }

    DEFAULT_LEVEL
}

/// Ordinal position on the ladder (0 = beginner, 10 = bilingual).
pub fn level_index(level: &str) -> usize {
    let normalized = normalize_language_level(level);
    LANGUAGE_LEVELS
        .iter()
        .position(|candidate| *candidate == normalized)
        .unwrap_or(5)
}

fn extracted_score(text: &str) -> Option<f64> {
    SCORE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn english_certificate_level(lower: &str) -> Option<&'static str> {
    if !["ielts", "toefl", "toeic"].iter().any(|x| lower.contains(x)) {
        return None;
    }
    let score = extracted_score(lower)?;

    if lower.contains("ielts") {
        Some(if score >= 8.0 {
            "native"
        } else if score >= 7.0 {
            "fluent"
        } else if score >= 6.0 {
            "advanced"
        } else if score >= 5.0 {
            "intermediate"
        } else {
            "elementary"
        })
    } else if lower.contains("toefl") {
        Some(if score >= 110.0 {
            "native"
        } else if score >= 95.0 {
            "fluent"
        } else if score >= 80.0 {
            "advanced"
        } else if score >= 60.0 {
            "intermediate"
        } else {
            "elementary"
        })
    } else {
        // TOEIC
        Some(if score >= 900.0 {
            "fluent"
        } else if score >= 785.0 {
            "advanced"
        } else if score >= 600.0 {
            "intermediate"
        } else if score >= 400.0 {
            "pre-intermediate"
        } else {
            "elementary"
        })
    }
}

fn japanese_certificate_level(lower: &str) -> Option<&'static str> {
    let mentions_jlpt = ["jlpt", "japanese proficiency", "nihongo"]
        .iter()
        .any(|x| lower.contains(x));

    if mentions_jlpt {
        let grades: [(&[&str], &str); 5] = [
            (&["n1", "level 1", "test 1"], "fluent"),
            (&["n2", "level 2", "test 2"], "advanced"),
            (&["n3", "level 3", "test 3"], "intermediate"),
            (&["n4", "level 4", "test 4"], "pre-intermediate"),
            (&["n5", "level 5", "test 5"], "elementary"),
        ];
        for (markers, canonical) in grades {
            if markers.iter().any(|m| lower.contains(m)) {
                return Some(canonical);
            }
        }
        return None;
    }

    if lower.contains("eju") {
        let score: i64 = INT_RE
            .captures(lower)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())?;
        return Some(if score >= 320 {
            "fluent"
        } else if score >= 280 {
            "advanced"
        } else if score >= 240 {
            "intermediate"
        } else if score >= 200 {
            "pre-intermediate"
        } else {
            "elementary"
        });
    }

    if lower.contains("kanji kentei") {
        return Some(if ["1", "pre-1", "2"].iter().any(|x| lower.contains(x)) {
            "advanced"
        } else if ["3", "4", "5"].iter().any(|x| lower.contains(x)) {
            "intermediate"
        } else {
            "elementary"
        });
    }

    None
}

fn chinese_certificate_level(lower: &str) -> Option<&'static str> {
    if !lower.contains("hsk") && !lower.contains("hanyu") {
        return None;
    }
    let hsk_level: i64 = HSK_LEVEL_RE
        .captures(lower)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())?;

    Some(if hsk_level >= 6 {
        "fluent"
    } else if hsk_level >= 5 {
        "advanced"
    } else if hsk_level >= 4 {
        "intermediate"
    } else if hsk_level >= 3 {
        "pre-intermediate"
    } else if hsk_level >= 2 {
        "elementary"
    } else {
        "beginner"
    })
}

fn european_certificate_level(lower: &str) -> Option<&'static str> {
    let frameworks = ["delf", "dalf", "dele", "telc", "goethe", "testdaf"];
    if !frameworks.iter().any(|x| lower.contains(x)) {
        return None;
    }

    if lower.contains("c2") || lower.contains("proficiency") {
        Some("native")
    } else if lower.contains("c1") {
        Some("fluent")
    } else if lower.contains("b2") {
        Some("advanced")
    } else if lower.contains("b1") {
        Some("intermediate")
    } else if lower.contains("a2") {
        Some("elementary")
    } else if lower.contains("a1") {
        Some("beginner")
    } else {
        None
    }
}

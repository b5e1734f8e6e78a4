use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Built-in languages offered by `tl languages`: (label, flag).
/// Labels outside this list are still passed to the model verbatim.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("Vietnamese", "🇻🇳"),
    ("English", "🇺🇸"),
    ("Chinese", "🇨🇳"),
    ("Japanese", "🇯🇵"),
    ("Korean", "🇰🇷"),
    ("French", "🇫🇷"),
    ("German", "🇩🇪"),
    ("Spanish", "🇪🇸"),
];

const UNKNOWN_FLAG: &str = "🌐";

/// Flag for a language label, matched case-insensitively against the catalog.
pub fn flag_for(label: &str) -> &'static str {
    let label = label.trim().to_lowercase();
    LANGUAGES
        .iter()
        .find(|(name, _)| name.to_lowercase() == label)
        .map(|(_, flag)| *flag)
        .unwrap_or(UNKNOWN_FLAG)
}

/// Source or target selection: resolve automatically or use a fixed label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LanguageChoice {
    #[default]
    Auto,
    Explicit(String),
}

impl FromStr for LanguageChoice {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            Ok(LanguageChoice::Auto)
        } else {
            Ok(LanguageChoice::Explicit(s.to_string()))
        }
    }
}

impl From<Option<String>> for LanguageChoice {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => s.parse().unwrap_or_default(),
            None => LanguageChoice::Auto,
        }
    }
}

impl fmt::Display for LanguageChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageChoice::Auto => write!(f, "auto"),
            LanguageChoice::Explicit(label) => write!(f, "{}", label),
        }
    }
}

/// The user's two working languages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub primary: String,
    pub secondary: String,
}

impl LanguagePair {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    pub fn target_for(&self, detected: &str) -> String {
        determine_target_language(detected, &self.primary, &self.secondary)
    }
}

fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

/// Picks the translation target for text detected as `detected`:
/// primary-language input goes to `secondary`, everything else to `primary`.
///
/// Labels are compared lowercased by mutual substring, so a detector answer
/// like "Vietnamese (Latin script)" still matches "Vietnamese".
pub fn determine_target_language(detected: &str, primary: &str, secondary: &str) -> String {
    let detected = detected.to_lowercase();

    if overlaps(&detected, &primary.to_lowercase()) {
        return secondary.to_string();
    }

    if overlaps(&detected, &secondary.to_lowercase()) {
        return primary.to_string();
    }

    primary.to_string()
}

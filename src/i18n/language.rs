//! Language tags: text direction and preference negotiation.
//!
//! Codes are kept as the plain strings used in configuration (`"en"`,
//! `"fr-CA"`). Negotiation matches a host's ordered preference list against
//! the registry, first verbatim and then by base subtag.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text direction surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    /// The attribute value (`"ltr"` or `"rtl"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ltr" => Ok(Direction::Ltr),
            "rtl" => Ok(Direction::Rtl),
            other => Err(format!("unknown text direction '{}'", other)),
        }
    }
}

/// The primary subtag of a language tag (`"fr-CA"` → `"fr"`).
pub fn base_tag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Pick the first preferred language the registry supports.
///
/// For each preferred tag, in order: accept it if supported verbatim, else
/// accept its base subtag if that is supported.
///
/// # Arguments
/// * `supported` - Codes present in the registry
/// * `preferences` - The host's ordered preference list, if it has one
/// * `fallback` - Returned when there is no list or nothing matches
pub fn negotiate_language<S: AsRef<str>>(
    supported: &[S],
    preferences: Option<&[String]>,
    fallback: &str,
) -> String {
    let Some(preferences) = preferences else {
        return fallback.to_string();
    };
    let is_supported = |code: &str| supported.iter().any(|s| s.as_ref() == code);

    for preferred in preferences {
        if is_supported(preferred.as_str()) {
            return preferred.clone();
        }
        let base = base_tag(preferred);
        if is_supported(base) {
            return base.to_string();
        }
    }

    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    // ==================== Direction Tests ====================

    #[test]
    fn test_direction_default_is_ltr() {
        assert_eq!(Direction::default(), Direction::Ltr);
    }

    #[test]
    fn test_direction_display_and_parse() {
        assert_eq!(Direction::Rtl.to_string(), "rtl");
        assert_eq!("RTL".parse::<Direction>(), Ok(Direction::Rtl));
        assert!("up".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_serde() {
        let json = serde_json::to_string(&Direction::Rtl).expect("Should serialize");
        assert_eq!(json, "\"rtl\"");
        let parsed: Direction = serde_json::from_str("\"ltr\"").expect("Should deserialize");
        assert_eq!(parsed, Direction::Ltr);
    }

    // ==================== base_tag Tests ====================

    #[test]
    fn test_base_tag() {
        assert_eq!(base_tag("fr-CA"), "fr");
        assert_eq!(base_tag("zh-Hant-TW"), "zh");
        assert_eq!(base_tag("en"), "en");
        assert_eq!(base_tag(""), "");
    }

    // ==================== negotiate_language Tests ====================

    #[test]
    fn test_negotiate_exact_match_second_preference() {
        // "fr-FR" is not supported and neither is its base "fr"
        let supported = ["en", "fr-CA"];
        let preferences = prefs(&["fr-FR", "en"]);
        assert_eq!(negotiate_language(&supported, Some(preferences.as_slice()), "xx"), "en");
    }

    #[test]
    fn test_negotiate_base_subtag_match() {
        let supported = ["en", "fr"];
        let preferences = prefs(&["fr-FR", "en"]);
        assert_eq!(negotiate_language(&supported, Some(preferences.as_slice()), "en"), "fr");
    }

    #[test]
    fn test_negotiate_exact_region_match() {
        let supported = ["en", "fr-CA"];
        let preferences = prefs(&["fr-CA"]);
        assert_eq!(negotiate_language(&supported, Some(preferences.as_slice()), "en"), "fr-CA");
    }

    #[test]
    fn test_negotiate_falls_back_when_nothing_matches() {
        let supported = ["en", "fr-CA"];
        let preferences = prefs(&["de-DE", "ja"]);
        assert_eq!(negotiate_language(&supported, Some(preferences.as_slice()), "en"), "en");
    }

    #[test]
    fn test_negotiate_without_host_list() {
        let supported = ["en", "fr"];
        assert_eq!(negotiate_language(&supported, None, "en"), "en");
    }

    #[test]
    fn test_negotiate_empty_list() {
        let supported = ["en", "fr"];
        assert_eq!(negotiate_language(&supported, Some(&[][..]), "fr"), "fr");
    }

    #[test]
    fn test_negotiate_first_match_wins() {
        let supported = vec!["de".to_string(), "es".to_string()];
        let preferences = prefs(&["es-MX", "de"]);
        assert_eq!(negotiate_language(&supported, Some(preferences.as_slice()), "en"), "es");
    }
}

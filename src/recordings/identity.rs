//! Participant identifiers derived from export filenames.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::RecordingError;

/// Default pattern: any run of ASCII letters or digits.
pub const DEFAULT_ID_PATTERN: &str = r"(?P<participant>[A-Za-z0-9]+)";
/// Identifier returned when a filename carries no usable token.
pub const UNKNOWN_PARTICIPANT: &str = "unknown";

const PARTICIPANT_GROUP: &str = "participant";

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"[A-Za-z0-9]+").expect("token regex must compile"))
}

/// Compiled identity pattern with a `participant` named group.
#[derive(Debug, Clone)]
pub struct IdentityPattern {
    regex: Regex,
}

impl IdentityPattern {
    /// Compile `pattern`; the `participant` group is looked up at match time.
    pub fn new(pattern: &str) -> Result<Self, RecordingError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|source| RecordingError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Pattern text as compiled.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Resolve the participant id for `file_name`.
    ///
    /// The last non-empty `participant` capture in the filename stem wins.
    /// Without one, the last alphanumeric token is used, and failing that
    /// [`UNKNOWN_PARTICIPANT`].
    pub fn resolve(&self, file_name: &str) -> String {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let captured = self
            .regex
            .captures_iter(&stem)
            .filter_map(|caps| caps.name(PARTICIPANT_GROUP))
            .map(|found| found.as_str())
            .filter(|found| !found.is_empty())
            .last();
        if let Some(participant) = captured {
            return participant.to_string();
        }
        token_regex()
            .find_iter(&stem)
            .last()
            .map(|token| token.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_PARTICIPANT.to_string())
    }
}

impl Default for IdentityPattern {
    fn default() -> Self {
        Self::new(DEFAULT_ID_PATTERN).expect("default participant pattern must compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_match_wins_for_date_prefixed_names() {
        let pattern = IdentityPattern::default();
        assert_eq!(pattern.resolve("2024-01-01_RR_P07.csv"), "P07");
    }

    #[test]
    fn uses_custom_group_when_it_matches() {
        let pattern = IdentityPattern::new(r"(?P<participant>VP\d+)").unwrap();
        assert_eq!(pattern.resolve("VP03_2024_RR.csv"), "VP03");
        assert_eq!(pattern.resolve("VP03_VP04_RR.csv"), "VP04");
    }

    #[test]
    fn falls_back_to_last_token_without_captures() {
        let pattern = IdentityPattern::new(r"(?P<participant>SUBJ\d+)").unwrap();
        assert_eq!(pattern.resolve("session 4 - final.csv"), "final");
        let no_group = IdentityPattern::new(r"\d+").unwrap();
        assert_eq!(no_group.resolve("P09_RR.csv"), "RR");
    }

    #[test]
    fn returns_unknown_for_symbol_only_names() {
        let pattern = IdentityPattern::default();
        assert_eq!(pattern.resolve("__--__.csv"), UNKNOWN_PARTICIPANT);
        assert_eq!(pattern.resolve(""), UNKNOWN_PARTICIPANT);
    }

    #[test]
    fn optional_group_that_does_not_participate_is_skipped() {
        let pattern = IdentityPattern::new(r"(?P<participant>P\d+)?_").unwrap();
        assert_eq!(pattern.resolve("P01_x_.csv"), "P01");
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = IdentityPattern::new("(?P<participant>[").unwrap_err();
        assert!(matches!(err, RecordingError::InvalidPattern { .. }));
    }
}

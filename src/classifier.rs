use crate::error::ConfigError;
use crate::types::{Category, MemberProfile};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Thresholds for the member heuristic. Every signal weighs 1.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HeuristicConfig {
    /// A username containing this many consecutive digits is suspicious.
    pub username_digit_run: u32,
    /// A username longer than this many characters is suspicious.
    pub username_max_len: usize,
    /// A first name with letters followed by this many digits is suspicious.
    pub name_digit_run: u32,
    /// Minimum score for `Suspicious`.
    pub suspicious_score: u32,
    /// Minimum score for `Fake`.
    pub fake_score: u32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            username_digit_run: 7,
            username_max_len: 25,
            name_digit_run: 4,
            suspicious_score: 2,
            fake_score: 3,
        }
    }
}

impl HeuristicConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.username_digit_run == 0 {
            return Err(ConfigError::ZeroThreshold { field: "username_digit_run" });
        }
        if self.name_digit_run == 0 {
            return Err(ConfigError::ZeroThreshold { field: "name_digit_run" });
        }
        if self.suspicious_score == 0 {
            return Err(ConfigError::ZeroThreshold { field: "suspicious_score" });
        }
        if self.suspicious_score > self.fake_score {
            return Err(ConfigError::InvertedScores {
                suspicious: self.suspicious_score,
                fake: self.fake_score,
            });
        }
        Ok(())
    }
}

/// One independent suspicion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    NoPhoto,
    SuspiciousUsername,
    SuspiciousName,
    NoLastName,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::NoPhoto,
        Signal::SuspiciousUsername,
        Signal::SuspiciousName,
        Signal::NoLastName,
    ];

    fn bit(self) -> u8 {
        match self {
            Signal::NoPhoto => 1,
            Signal::SuspiciousUsername => 1 << 1,
            Signal::SuspiciousName => 1 << 2,
            Signal::NoLastName => 1 << 3,
        }
    }
}

/// Set of signals that fired for a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals(u8);

impl Signals {
    pub fn insert(&mut self, signal: Signal) {
        self.0 |= signal.bit();
    }

    pub fn contains(self, signal: Signal) -> bool {
        self.0 & signal.bit() != 0
    }

    pub fn score(self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = Signal> {
        Signal::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

/// Category plus the signals that produced it. Bots carry no signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub category: Category,
    pub signals: Signals,
}

static CANONICAL: Lazy<Classifier> = Lazy::new(|| {
    Classifier::new(HeuristicConfig::default()).expect("default heuristic config is valid")
});

/// Classify with the built-in thresholds.
pub fn classify(profile: &MemberProfile) -> Category {
    CANONICAL.classify(profile)
}

/// Scores member profiles against a fixed [`HeuristicConfig`].
#[derive(Debug, Clone)]
pub struct Classifier {
    config: HeuristicConfig,
    username_digits: Regex,
    name_letters_digits: Regex,
}

impl Classifier {
    pub fn new(config: HeuristicConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let username_digits = Regex::new(&format!(r"\d{{{},}}", config.username_digit_run))?;
        let name_letters_digits =
            Regex::new(&format!(r"\p{{L}}+\d{{{},}}", config.name_digit_run))?;
        Ok(Self {
            config,
            username_digits,
            name_letters_digits,
        })
    }

    pub fn classify(&self, profile: &MemberProfile) -> Category {
        self.evaluate(profile).category
    }

    /// Score a profile and report which signals fired.
    pub fn evaluate(&self, profile: &MemberProfile) -> Verdict {
        if profile.is_bot {
            return Verdict {
                category: Category::Bot,
                signals: Signals::default(),
            };
        }

        let mut signals = Signals::default();
        if !profile.has_photo {
            signals.insert(Signal::NoPhoto);
        }
        if let Some(username) = profile.username.as_deref() {
            if self.username_digits.is_match(username)
                || username.chars().count() > self.config.username_max_len
            {
                signals.insert(Signal::SuspiciousUsername);
            }
        }
        if let Some(first) = profile.first_name.as_deref() {
            if is_symbols_only(first) || self.name_letters_digits.is_match(first) {
                signals.insert(Signal::SuspiciousName);
            }
        }
        if profile.last_name.as_deref().map_or(true, str::is_empty) {
            signals.insert(Signal::NoLastName);
        }

        Verdict {
            category: self.bucket(signals.score()),
            signals,
        }
    }

    fn bucket(&self, score: u32) -> Category {
        if score >= self.config.fake_score {
            Category::Fake
        } else if score >= self.config.suspicious_score {
            Category::Suspicious
        } else {
            Category::Real
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        CANONICAL.clone()
    }
}

// Non-empty and without a single letter or digit (emoji, punctuation).
fn is_symbols_only(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(
        has_photo: bool,
        username: Option<&str>,
        first: Option<&str>,
        last: Option<&str>,
    ) -> MemberProfile {
        MemberProfile {
            is_bot: false,
            has_photo,
            username: username.map(str::to_string),
            first_name: first.map(str::to_string),
            last_name: last.map(str::to_string),
        }
    }

    #[test]
    fn bot_short_circuits() {
        let mut p = profile(false, Some("spam123456789"), Some("!!!"), None);
        p.is_bot = true;
        let v = Classifier::default().evaluate(&p);
        assert_eq!(v.category, Category::Bot);
        assert_eq!(v.signals.score(), 0);
    }

    #[test]
    fn digit_heavy_username_without_photo_and_last_name_is_fake() {
        let p = profile(false, Some("user12345678"), Some("X"), Some(""));
        let v = Classifier::default().evaluate(&p);
        assert_eq!(v.signals.score(), 3);
        assert!(v.signals.contains(Signal::SuspiciousUsername));
        assert!(!v.signals.contains(Signal::SuspiciousName));
        assert_eq!(v.category, Category::Fake);
    }

    #[test]
    fn complete_profile_is_real() {
        let p = profile(true, Some("anna"), Some("Anna"), Some("Smith"));
        assert_eq!(classify(&p), Category::Real);
    }

    #[test]
    fn bare_profile_is_only_suspicious() {
        let p = profile(false, None, None, None);
        let v = Classifier::default().evaluate(&p);
        assert_eq!(v.signals.score(), 2);
        assert_eq!(v.category, Category::Suspicious);
    }

    #[test]
    fn six_digits_do_not_trigger_username_signal() {
        let p = profile(true, Some("user123456"), Some("Anna"), Some("Smith"));
        assert_eq!(Classifier::default().evaluate(&p).signals.score(), 0);
    }

    #[test]
    fn username_boundaries() {
        let c = Classifier::default();
        let fires = |username: &str| {
            let p = profile(true, Some(username), Some("Anna"), Some("Smith"));
            c.evaluate(&p).signals.contains(Signal::SuspiciousUsername)
        };
        assert!(!fires(&"a".repeat(25)));
        assert!(fires(&"a".repeat(26)));
        assert!(!fires("anna123456"));
        assert!(fires("anna1234567"));
        assert!(!fires("12345_67890"));
    }

    #[test]
    fn long_username_triggers() {
        let p = profile(true, Some("a_really_long_username_here_x"), Some("Anna"), Some("S"));
        let v = Classifier::default().evaluate(&p);
        assert!(v.signals.contains(Signal::SuspiciousUsername));
    }

    #[test]
    fn name_patterns() {
        let c = Classifier::default();
        let symbols = profile(true, None, Some("🔥🔥"), Some("S"));
        assert!(c.evaluate(&symbols).signals.contains(Signal::SuspiciousName));
        let mixed = profile(true, None, Some("Anna2024"), Some("S"));
        assert!(c.evaluate(&mixed).signals.contains(Signal::SuspiciousName));
        let short_run = profile(true, None, Some("Anna202"), Some("S"));
        assert!(!c.evaluate(&short_run).signals.contains(Signal::SuspiciousName));
        let empty = profile(true, None, Some(""), Some("S"));
        assert!(!c.evaluate(&empty).signals.contains(Signal::SuspiciousName));
    }

    #[test]
    fn custom_thresholds_apply() {
        let c = Classifier::new(HeuristicConfig {
            username_digit_run: 5,
            fake_score: 4,
            ..HeuristicConfig::default()
        })
        .unwrap();
        let p = profile(false, Some("user12345"), Some("X"), None);
        let v = c.evaluate(&p);
        assert_eq!(v.signals.score(), 3);
        assert_eq!(v.category, Category::Suspicious);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let zero = HeuristicConfig {
            username_digit_run: 0,
            ..HeuristicConfig::default()
        };
        assert!(matches!(Classifier::new(zero), Err(ConfigError::ZeroThreshold { .. })));
        let inverted = HeuristicConfig {
            suspicious_score: 4,
            fake_score: 3,
            ..HeuristicConfig::default()
        };
        assert!(matches!(
            Classifier::new(inverted),
            Err(ConfigError::InvertedScores { .. })
        ));
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Public profile attributes of one roster member, as reported by the platform.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MemberProfile {
    pub is_bot: bool,
    pub has_photo: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Outcome of classifying a single member.
///
/// Ordered by severity for non-bot members: `Real < Suspicious < Fake`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Bot,
    Real,
    Suspicious,
    Fake,
}

impl Category {
    /// Severity rank of a human member; `None` for bots, which sit outside the scale.
    pub fn severity(self) -> Option<u8> {
        match self {
            Category::Bot => None,
            Category::Real => Some(0),
            Category::Suspicious => Some(1),
            Category::Fake => Some(2),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Bot => "bot",
            Category::Real => "real",
            Category::Suspicious => "suspicious",
            Category::Fake => "fake",
        };
        f.write_str(s)
    }
}

/// Platform-side identifier of a group or channel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the lookup collaborator knows about an entity.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    pub id: EntityId,
    pub display_name: String,
    pub reported_total: u64,
}

/// Per-signal tallies across a scan. Bots never contribute.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalTally {
    pub no_photo: u64,
    pub suspicious_username: u64,
    pub suspicious_name: u64,
    pub no_last_name: u64,
}

/// Mutable counters owned by exactly one in-flight scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanAccumulator {
    pub real: u64,
    pub bot: u64,
    pub suspicious: u64,
    pub fake: u64,
    pub scanned: u64,
    pub signals: SignalTally,
}

impl ScanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one classified member.
    pub fn record(&mut self, category: Category) {
        match category {
            Category::Bot => self.bot += 1,
            Category::Real => self.real += 1,
            Category::Suspicious => self.suspicious += 1,
            Category::Fake => self.fake += 1,
        }
        self.scanned += 1;
    }

    pub fn count(&self, category: Category) -> u64 {
        match category {
            Category::Bot => self.bot,
            Category::Real => self.real,
            Category::Suspicious => self.suspicious,
            Category::Fake => self.fake,
        }
    }
}

/// Count and percentage of one category.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct CategoryShare {
    pub count: u64,
    pub percent: f64,
}

/// Immutable summary of a finished scan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub entity_id: EntityId,
    pub display_name: String,
    /// Member count as reported by the platform; may exceed `scanned`.
    pub reported_total: u64,
    pub scanned: u64,
    pub cap: u64,
    pub capped: bool,
    pub real: CategoryShare,
    pub bot: CategoryShare,
    pub suspicious: CategoryShare,
    pub fake: CategoryShare,
    pub signals: SignalTally,
    pub scanned_at: String,
}

impl ScanReport {
    pub fn share(&self, category: Category) -> CategoryShare {
        match category {
            Category::Bot => self.bot,
            Category::Real => self.real,
            Category::Suspicious => self.suspicious,
            Category::Fake => self.fake,
        }
    }
}

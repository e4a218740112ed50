use serde::{Deserialize, Serialize};

/// How an incoming root name is compared with existing top-level names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum NameMatching {
    /// Names must be identical
    #[default]
    Exact,
    /// An existing name containing the incoming name counts as a match
    Contains,
}

impl NameMatching {
    pub fn matches(self, existing: &str, incoming: &str) -> bool {
        match self {
            Self::Exact => existing == incoming,
            Self::Contains => existing.contains(incoming),
        }
    }
}

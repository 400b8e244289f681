use crate::models::CandidateProfile;
use std::collections::HashSet;
use std::fmt;

/// Lowercased name and email; empty counts as absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    name: Option<String>,
    email: Option<String>,
}

impl IdentityKey {
    pub fn new(name: Option<&str>, email: Option<&str>) -> Self {
        Self {
            name: normalize(name),
            email: normalize(email),
        }
    }

    pub fn of(profile: &CandidateProfile) -> Self {
        Self::new(profile.name.as_deref(), profile.email.as_deref())
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.is_empty())
        .map(str::to_lowercase)
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}",
            self.name.as_deref().unwrap_or_default(),
            self.email.as_deref().unwrap_or_default()
        )
    }
}

/// Seen-identity set scoped to one ingestion run.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<IdentityKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the profile's identity; false when it was already seen.
    pub fn is_new(&mut self, profile: &CandidateProfile) -> bool {
        self.seen.insert(IdentityKey::of(profile))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

use crate::models::{CandidateProfile, Document};
use std::cmp::Reverse;

/// Ordered candidate profiles. Insertion order until a score is applied, then
/// descending by score with unscored profiles last.
#[derive(Debug, Default, Clone)]
pub struct ProfileSet {
    profiles: Vec<CandidateProfile>,
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, profile: CandidateProfile) {
        self.profiles.push(profile);
    }

    /// Sets a profile's score, replacing any earlier one, and re-sorts the whole
    /// set. Returns false when no profile has that id.
    pub fn upsert_and_resort(&mut self, id: &str, score: u8) -> bool {
        let Some(profile) = self.profiles.iter_mut().find(|profile| profile.id == id) else {
            return false;
        };
        profile.match_score = Some(score);
        self.profiles
            .sort_by_key(|profile| Reverse(profile.match_score.map_or(-1, i16::from)));
        true
    }

    /// Drops every profile, releasing the source document buffers they hold.
    pub fn clear(&mut self) {
        self.profiles.clear();
        self.profiles.shrink_to_fit();
    }

    pub fn get(&self, id: &str) -> Option<&CandidateProfile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    pub fn source_document(&self, id: &str) -> Option<&Document> {
        self.get(id).map(|profile| &profile.source_document)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CandidateProfile> {
        self.profiles.iter()
    }

    pub fn as_slice(&self) -> &[CandidateProfile] {
        &self.profiles
    }

    pub fn snapshot(&self) -> Vec<CandidateProfile> {
        self.profiles.clone()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl<'a> IntoIterator for &'a ProfileSet {
    type Item = &'a CandidateProfile;
    type IntoIter = std::slice::Iter<'a, CandidateProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.profiles.iter()
    }
}

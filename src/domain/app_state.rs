use serde::{Deserialize, Serialize};

use super::{
    entities::{CandidateItem, CandidateUpdate},
    settings::SellerSettings,
};

/// Candidates from the latest scan, editable until the lot is bought or discarded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanSession {
    candidates: Vec<CandidateItem>,
}

impl ScanSession {
    pub fn candidates(&self) -> &[CandidateItem] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn set_candidates(&mut self, candidates: Vec<CandidateItem>) {
        self.candidates = candidates;
    }

    pub fn add(&mut self, candidate: CandidateItem) {
        self.candidates.push(candidate);
    }

    /// Appends the results of another photo of the same lot.
    pub fn extend(&mut self, candidates: Vec<CandidateItem>) {
        self.candidates.extend(candidates);
    }

    /// Returns false if no candidate has `id`.
    pub fn update(&mut self, id: &str, update: CandidateUpdate) -> bool {
        match self.candidates.iter_mut().find(|candidate| candidate.id == id) {
            Some(candidate) => {
                update.apply(candidate);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<CandidateItem> {
        let index = self.candidates.iter().position(|candidate| candidate.id == id)?;
        Some(self.candidates.remove(index))
    }

    pub fn reset(&mut self) {
        self.candidates.clear();
    }

    /// Frozen copy of the candidates, taken before a purchase writes anything.
    pub fn snapshot(&self) -> Vec<CandidateItem> {
        self.candidates.clone()
    }
}

/// What survives a restart. Scan results are intentionally not persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub settings: SellerSettings,
}

impl PersistedState {
    pub fn from_settings(settings: &SellerSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }
}

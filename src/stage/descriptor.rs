use serde::Deserialize;
use thiserror::Error;

/// How a stage's passage is framed on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StageMode {
    Chat,
    Article,
    Text,
}

/// One selectable location within a stage.
///
/// A subset of candidates are genuine errors (`is_error`); finding those, in
/// order, is the object of the game. Every candidate carries an explanation
/// shown after it is picked correctly.
#[derive(Clone, Debug, Deserialize)]
pub struct Candidate {
    pub id: u32,
    pub text: String,
    pub is_error: bool,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StageError {
    #[error("stage '{0}' has no candidates")]
    NoCandidates(String),
    #[error("stage '{0}' has no error targets")]
    NoErrorTargets(String),
    #[error("stage '{0}' has duplicate candidate id {1}")]
    DuplicateCandidateId(String, u32),
}

/// Read-only puzzle data for one level.
#[derive(Clone, Debug, Deserialize)]
pub struct StageDescriptor {
    pub stage_id: String,
    pub level: u32,
    pub mode: StageMode,
    /// Per-stage time limit; the configured default applies when absent.
    #[serde(default)]
    pub time_limit_secs: Option<f64>,
    pub candidates: Vec<Candidate>,
}

impl StageDescriptor {
    pub fn candidate(&self, id: u32) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Error targets in stage order; this ordering defines the rounds.
    pub fn error_targets(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter().filter(|c| c.is_error)
    }

    pub fn error_target_count(&self) -> usize {
        self.error_targets().count()
    }

    pub fn validate(&self) -> Result<(), StageError> {
        if self.candidates.is_empty() {
            return Err(StageError::NoCandidates(self.stage_id.clone()));
        }
        if self.error_target_count() == 0 {
            return Err(StageError::NoErrorTargets(self.stage_id.clone()));
        }
        for (i, c) in self.candidates.iter().enumerate() {
            if self.candidates[..i].iter().any(|prev| prev.id == c.id) {
                return Err(StageError::DuplicateCandidateId(
                    self.stage_id.clone(),
                    c.id,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(candidates: Vec<Candidate>) -> StageDescriptor {
        StageDescriptor {
            stage_id: "test".into(),
            level: 1,
            mode: StageMode::Text,
            time_limit_secs: None,
            candidates,
        }
    }

    fn candidate(id: u32, is_error: bool) -> Candidate {
        Candidate {
            id,
            text: format!("word{id}"),
            is_error,
            explanation: String::new(),
        }
    }

    #[test]
    fn validate_rejects_empty_stage() {
        assert_eq!(
            stage(vec![]).validate(),
            Err(StageError::NoCandidates("test".into()))
        );
    }

    #[test]
    fn validate_rejects_stage_without_error_targets() {
        let s = stage(vec![candidate(1, false), candidate(2, false)]);
        assert_eq!(s.validate(), Err(StageError::NoErrorTargets("test".into())));
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let s = stage(vec![candidate(1, false), candidate(1, true)]);
        assert_eq!(
            s.validate(),
            Err(StageError::DuplicateCandidateId("test".into(), 1))
        );
    }

    #[test]
    fn error_targets_keep_stage_order() {
        let s = stage(vec![
            candidate(5, true),
            candidate(9, false),
            candidate(2, true),
        ]);
        let ids: Vec<u32> = s.error_targets().map(|c| c.id).collect();
        assert_eq!(ids, vec![5, 2]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn candidate_lookup() {
        let s = stage(vec![candidate(1, false), candidate(7, true)]);
        assert_eq!(s.candidate(7).map(|c| c.is_error), Some(true));
        assert!(s.candidate(42).is_none());
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"
        {
            "stage_id": "text-001",
            "level": 1,
            "mode": "text",
            "time_limit_secs": 45.0,
            "candidates": [
                { "id": 1, "text": "their", "is_error": false },
                { "id": 2, "text": "recieve", "is_error": true,
                  "explanation": "receive: i before e, except after c." }
            ]
        }
        "#;
        let s: StageDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(s.stage_id, "text-001");
        assert_eq!(s.mode, StageMode::Text);
        assert_eq!(s.time_limit_secs, Some(45.0));
        assert_eq!(s.error_target_count(), 1);
        assert!(s.validate().is_ok());
    }
}

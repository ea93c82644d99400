use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;

use super::descriptor::{StageDescriptor, StageMode};

static STAGE_DIR: Dir = include_dir!("src/stages");

/// The built-in stage catalog, parsed once from the embedded JSON pack.
#[derive(Clone, Debug)]
pub struct StageLibrary {
    stages: Vec<StageDescriptor>,
}

impl StageLibrary {
    /// Load every embedded stage, sorted by level then id so `--list`
    /// output and `pick` tie-breaking are stable.
    pub fn builtin() -> Self {
        let mut stages: Vec<StageDescriptor> = STAGE_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|e| e == "json"))
            .filter_map(|f| f.contents_utf8())
            .filter_map(|s| serde_json::from_str(s).ok())
            .collect();
        stages.sort_by(|a, b| (a.level, &a.stage_id).cmp(&(b.level, &b.stage_id)));
        Self { stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageDescriptor> {
        self.stages.iter()
    }

    pub fn by_id(&self, stage_id: &str) -> Option<&StageDescriptor> {
        self.stages.iter().find(|s| s.stage_id == stage_id)
    }

    /// Pick a random stage matching the given filters.
    pub fn pick(&self, mode: Option<StageMode>, level: Option<u32>) -> Option<&StageDescriptor> {
        let matching: Vec<&StageDescriptor> = self
            .stages
            .iter()
            .filter(|s| mode.map_or(true, |m| s.mode == m))
            .filter(|s| level.map_or(true, |l| s.level == l))
            .collect();
        matching.choose(&mut rand::thread_rng()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_library_is_not_empty() {
        let library = StageLibrary::builtin();
        assert!(!library.is_empty());
    }

    #[test]
    fn by_id_finds_known_stage() {
        let library = StageLibrary::builtin();
        let first_id = library.iter().next().unwrap().stage_id.clone();
        assert!(library.by_id(&first_id).is_some());
        assert!(library.by_id("no-such-stage").is_none());
    }

    #[test]
    fn pick_honours_mode_filter() {
        let library = StageLibrary::builtin();
        for _ in 0..10 {
            if let Some(stage) = library.pick(Some(StageMode::Chat), None) {
                assert_eq!(stage.mode, StageMode::Chat);
            }
        }
    }

    #[test]
    fn pick_with_impossible_filter_is_none() {
        let library = StageLibrary::builtin();
        assert!(library.pick(None, Some(9999)).is_none());
    }

    #[test]
    fn stages_are_sorted_by_level() {
        let library = StageLibrary::builtin();
        let levels: Vec<u32> = library.iter().map(|s| s.level).collect();
        let mut sorted = levels.clone();
        sorted.sort_unstable();
        assert_eq!(levels, sorted);
    }
}

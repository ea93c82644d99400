pub mod descriptor;
pub mod library;

// Re-export the main types for convenience
pub use descriptor::{Candidate, StageDescriptor, StageError, StageMode};
pub use library::StageLibrary;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_stages_all_validate() {
        let library = StageLibrary::builtin();
        assert!(library.len() > 0);
        for stage in library.iter() {
            assert!(stage.validate().is_ok(), "bad stage {}", stage.stage_id);
        }
    }

    #[test]
    fn builtin_stages_cover_every_mode() {
        let library = StageLibrary::builtin();
        for mode in [StageMode::Chat, StageMode::Article, StageMode::Text] {
            assert!(
                library.iter().any(|s| s.mode == mode),
                "no stage for mode {mode}"
            );
        }
    }
}

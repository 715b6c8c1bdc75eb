use super::state::FinishReason;
use crate::config::{Difficulty, TestMode};

/// Snapshot the completion guards look at after each accepted key
#[derive(Debug, Clone, Copy)]
pub struct GuardInput<'a> {
    pub difficulty: Difficulty,
    pub mode: TestMode,
    pub target: &'a [char],
    pub input: &'a [char],
    pub boundaries: &'a [usize],
    pub words_completed: usize,
    pub target_word_count: usize,
    /// the character appended by this key, `None` for backspace
    pub appended: Option<char>,
}

/// Evaluates the completion guards in fixed order:
/// difficulty termination, then word count, then text exhaustion.
pub fn evaluate(g: &GuardInput) -> Option<FinishReason> {
    if difficulty_failed(g) {
        Some(FinishReason::DifficultyFailed)
    } else if word_count_reached(g) {
        Some(FinishReason::WordCountReached)
    } else if text_exhausted(g) {
        Some(FinishReason::TextExhausted)
    } else {
        None
    }
}

pub fn difficulty_failed(g: &GuardInput) -> bool {
    let Some(typed) = g.appended else {
        return false;
    };
    let Some(idx) = g.input.len().checked_sub(1) else {
        return false;
    };

    match g.difficulty {
        Difficulty::Normal => false,
        Difficulty::Master => g.target.get(idx) != Some(&typed),
        Difficulty::Expert => typed == ' ' && closed_word_has_error(g, idx),
    }
}

fn closed_word_has_error(g: &GuardInput, space_idx: usize) -> bool {
    let word_start = g
        .boundaries
        .iter()
        .rev()
        .find(|&&b| b <= space_idx)
        .copied()
        .unwrap_or(0);

    (word_start..=space_idx).any(|i| g.input.get(i) != g.target.get(i))
}

pub fn word_count_reached(g: &GuardInput) -> bool {
    g.mode == TestMode::Words && g.target_word_count > 0 && g.words_completed >= g.target_word_count
}

pub fn text_exhausted(g: &GuardInput) -> bool {
    !g.target.is_empty() && g.input.len() == g.target.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::words::word_boundaries;

    fn guard<'a>(
        difficulty: Difficulty,
        mode: TestMode,
        target: &'a [char],
        input: &'a [char],
        boundaries: &'a [usize],
    ) -> GuardInput<'a> {
        GuardInput {
            difficulty,
            mode,
            target,
            input,
            boundaries,
            words_completed: 0,
            target_word_count: 0,
            appended: input.last().copied(),
        }
    }

    #[test]
    fn normal_never_fails_on_mistakes() {
        let target: Vec<char> = "the".chars().collect();
        let input: Vec<char> = "thx".chars().collect();
        let g = guard(Difficulty::Normal, TestMode::Quote, &target, &input, &[0]);
        assert!(!difficulty_failed(&g));
        assert_eq!(evaluate(&g), Some(FinishReason::TextExhausted));
    }

    #[test]
    fn master_fails_on_first_mistake() {
        let target: Vec<char> = "the cat".chars().collect();
        let input: Vec<char> = "thx".chars().collect();
        let g = guard(Difficulty::Master, TestMode::Time, &target, &input, &[0, 4]);
        assert_eq!(evaluate(&g), Some(FinishReason::DifficultyFailed));
    }

    #[test]
    fn master_ignores_backspace() {
        let target: Vec<char> = "the".chars().collect();
        let input: Vec<char> = "t".chars().collect();
        let mut g = guard(Difficulty::Master, TestMode::Time, &target, &input, &[0]);
        g.appended = None;
        assert!(!difficulty_failed(&g));
    }

    #[test]
    fn expert_fails_when_a_broken_word_is_closed() {
        let target: Vec<char> = "the cat".chars().collect();
        let boundaries = word_boundaries(&target);

        let typing: Vec<char> = "thx".chars().collect();
        let g = guard(Difficulty::Expert, TestMode::Time, &target, &typing, &boundaries);
        assert!(!difficulty_failed(&g), "mistake inside an open word is allowed");

        let closed: Vec<char> = "thx ".chars().collect();
        let g = guard(Difficulty::Expert, TestMode::Time, &target, &closed, &boundaries);
        assert!(difficulty_failed(&g));
    }

    #[test]
    fn expert_passes_clean_words() {
        let target: Vec<char> = "the cat".chars().collect();
        let boundaries = word_boundaries(&target);
        let input: Vec<char> = "the ".chars().collect();
        let g = guard(Difficulty::Expert, TestMode::Time, &target, &input, &boundaries);
        assert!(!difficulty_failed(&g));
    }

    #[test]
    fn word_count_only_applies_in_words_mode() {
        let target: Vec<char> = "a b c".chars().collect();
        let input: Vec<char> = "a b ".chars().collect();
        let mut g = guard(Difficulty::Normal, TestMode::Words, &target, &input, &[0, 2, 4]);
        g.words_completed = 2;
        g.target_word_count = 2;
        assert_eq!(evaluate(&g), Some(FinishReason::WordCountReached));

        g.mode = TestMode::Time;
        assert_eq!(evaluate(&g), None);
    }

    #[test]
    fn difficulty_is_checked_before_completion() {
        let target: Vec<char> = "ab".chars().collect();
        let input: Vec<char> = "ax".chars().collect();
        let g = guard(Difficulty::Master, TestMode::Quote, &target, &input, &[0]);
        assert_eq!(evaluate(&g), Some(FinishReason::DifficultyFailed));
    }

    #[test]
    fn empty_target_is_never_exhausted() {
        let g = guard(Difficulty::Normal, TestMode::Quote, &[], &[], &[]);
        assert!(!text_exhausted(&g));
    }
}

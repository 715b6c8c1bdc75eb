//! The typing-session state machine.
//!
//! A [`TypingSession`] owns everything about one test: the configuration
//! snapshot, the target text, what has been typed, per-character
//! classification, live stats and word progress. Keys go in through
//! [`TypingSession::handle_key`]; the countdown and persistence live
//! outside and talk to it through [`TypingSession::finish`],
//! [`TypingSession::pause`] and [`TypingSession::complete`].

pub mod policy;
pub mod state;
pub mod stats;
pub mod words;

pub use state::{
    CharStatus, CharacterState, FinishReason, GameStatus, KeyInput, KeyOutcome, SessionStats,
    WordProgress,
};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigPatch, TestConfig, TestMode};
use crate::history::TestResult;
use crate::time_series::{push_sample, WpmSample};
use policy::GuardInput;

#[derive(Debug)]
pub struct TypingSession {
    config: TestConfig,
    clock: Box<dyn Clock>,
    target_text: String,
    target: Vec<char>,
    input: Vec<char>,
    character_states: Vec<CharacterState>,
    status: GameStatus,
    stats: SessionStats,
    word_progress: WordProgress,
    finish_reason: Option<FinishReason>,
    paused_at: Option<u64>,
    wpm_trace: Vec<WpmSample>,
}

impl TypingSession {
    pub fn new(config: TestConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    pub fn with_clock(config: TestConfig, clock: impl Clock + 'static) -> Self {
        let word_count = config.word_count;
        Self {
            config,
            clock: Box::new(clock),
            target_text: String::new(),
            target: Vec::new(),
            input: Vec::new(),
            character_states: Vec::new(),
            status: GameStatus::Ready,
            stats: SessionStats::fresh(),
            word_progress: WordProgress {
                target_word_count: word_count,
                ..Default::default()
            },
            finish_reason: None,
            paused_at: None,
            wpm_trace: Vec::new(),
        }
    }

    /// Merges `patch` into the config. Returns true when the target text
    /// no longer matches the config and has to be reloaded.
    pub fn configure(&mut self, patch: ConfigPatch) -> bool {
        self.config.apply(patch)
    }

    pub fn set_target_text(&mut self, text: impl Into<String>) {
        self.target_text = text.into();
        self.target = self.target_text.chars().collect();
        self.word_progress.boundaries = words::word_boundaries(&self.target);
        self.word_progress.target_word_count = self.config.word_count;
        self.reset_game();
    }

    /// Overrides the word goal, used when the provider returned fewer words than asked for.
    pub fn set_target_word_count(&mut self, count: usize) {
        self.word_progress.target_word_count = count;
    }

    pub fn handle_key(&mut self, key: KeyInput) -> KeyOutcome {
        if !matches!(self.status, GameStatus::Ready | GameStatus::Running) {
            return KeyOutcome::Rejected;
        }

        let appended = match key {
            KeyInput::Other => return KeyOutcome::Rejected,
            KeyInput::Char(c) if c.is_control() => return KeyOutcome::Rejected,
            KeyInput::Char(_) if self.input.len() >= self.target.len() => {
                return KeyOutcome::Rejected
            }
            KeyInput::Char(c) => Some(c),
            KeyInput::Backspace => None,
        };

        let now = self.clock.now_ms();
        if self.status == GameStatus::Ready {
            self.status = GameStatus::Running;
            self.stats.start_time = Some(now);
            tracing::debug!(mode = %self.config.mode, "test started");
        }

        let from = match appended {
            Some(c) => {
                self.input.push(c);
                self.input.len() - 1
            }
            None => {
                self.input.pop();
                self.input.len()
            }
        };

        self.refresh_character_states(from, now);
        self.recompute_stats(now);
        self.update_word_progress();
        self.record_wpm_sample();

        let reason = policy::evaluate(&GuardInput {
            difficulty: self.config.difficulty,
            mode: self.config.mode,
            target: &self.target,
            input: &self.input,
            boundaries: &self.word_progress.boundaries,
            words_completed: self.word_progress.words_completed,
            target_word_count: self.word_progress.target_word_count,
            appended,
        });

        match reason {
            Some(reason) => {
                self.status = GameStatus::Finished;
                self.finish_reason = Some(reason);
                tracing::debug!(?reason, typed = self.input.len(), "test finished by input");
                KeyOutcome::Finished(reason)
            }
            None => KeyOutcome::Accepted,
        }
    }

    /// Convenience for DOM-style key names ("a", "Backspace", "Shift").
    pub fn handle_key_name(&mut self, key: &str) -> KeyOutcome {
        self.handle_key(KeyInput::from_key_name(key))
    }

    pub fn reset_game(&mut self) {
        self.input.clear();
        self.stats = SessionStats::fresh();
        self.status = GameStatus::Ready;
        self.finish_reason = None;
        self.paused_at = None;
        self.wpm_trace.clear();
        self.word_progress.reset_counters();
        self.rebuild_character_states();
    }

    /// Ends a running (or paused) test from outside, e.g. when the countdown expires.
    pub fn finish(&mut self) -> bool {
        match self.status {
            GameStatus::Running | GameStatus::Paused => {
                self.resume();
                self.status = GameStatus::Finished;
                self.finish_reason = Some(FinishReason::External);
                true
            }
            GameStatus::Ready | GameStatus::Finished => false,
        }
    }

    /// Finalizes the test and returns the result to persist.
    /// Returns `None` if nothing was typed or the test was already completed.
    pub fn complete(&mut self) -> Option<TestResult> {
        match self.status {
            GameStatus::Ready => return None,
            GameStatus::Running | GameStatus::Paused => {
                self.finish();
            }
            GameStatus::Finished => {}
        }
        if self.stats.end_time.is_some() {
            return None;
        }

        let now = self.clock.now_ms();
        self.recompute_stats(now);
        self.stats.end_time = Some(now);

        Some(TestResult::from_session(
            &self.config,
            &self.stats,
            self.word_progress.target_word_count,
            now,
        ))
    }

    /// Time mode only: stop the clock while the terminal is out of focus.
    pub fn pause(&mut self) -> bool {
        if self.status != GameStatus::Running || self.config.mode != TestMode::Time {
            return false;
        }
        self.status = GameStatus::Paused;
        self.paused_at = Some(self.clock.now_ms());
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.status != GameStatus::Paused {
            return false;
        }
        let now = self.clock.now_ms();
        if let (Some(paused_at), Some(start)) = (self.paused_at.take(), self.stats.start_time) {
            self.stats.start_time = Some(start + now.saturating_sub(paused_at));
        }
        self.status = GameStatus::Running;
        true
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    pub fn target_text(&self) -> &str {
        &self.target_text
    }

    pub fn target_len(&self) -> usize {
        self.target.len()
    }

    pub fn user_input(&self) -> String {
        self.input.iter().collect()
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
    }

    pub fn character_states(&self) -> &[CharacterState] {
        &self.character_states
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn word_progress(&self) -> &WordProgress {
        &self.word_progress
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    pub fn wpm_trace(&self) -> &[WpmSample] {
        &self.wpm_trace
    }

    pub fn is_completed(&self) -> bool {
        self.stats.end_time.is_some()
    }

    fn rebuild_character_states(&mut self) {
        self.character_states = self
            .target
            .iter()
            .map(|&c| CharacterState::untyped(c))
            .collect();
        if let Some(first) = self.character_states.first_mut() {
            first.status = CharStatus::Current;
        }
    }

    /// Re-derives states from `from` up to one past the cursor; everything
    /// before `from` is unchanged by a single append or backspace.
    fn refresh_character_states(&mut self, from: usize, now: u64) {
        let cursor = self.input.len();
        let end = (cursor + 2).min(self.target.len());
        for i in from..end {
            let state = &mut self.character_states[i];
            if i < cursor {
                state.status = if self.input[i] == self.target[i] {
                    CharStatus::Correct
                } else {
                    CharStatus::Incorrect
                };
                state.classified_at = Some(now);
            } else if i == cursor {
                state.status = CharStatus::Current;
                state.classified_at = None;
            } else {
                state.status = CharStatus::Default;
                state.classified_at = None;
            }
        }
    }

    fn recompute_stats(&mut self, now: u64) {
        let elapsed_ms = self
            .stats
            .start_time
            .map_or(0, |start| now.saturating_sub(start));
        let correct = stats::count_correct(&self.input, &self.target);

        self.stats.elapsed_ms = elapsed_ms;
        self.stats.total_chars = self.input.len();
        self.stats.correct_chars = correct;
        self.stats.incorrect_chars = self.input.len() - correct;
        self.stats.wpm = stats::wpm(correct, elapsed_ms);
        self.stats.accuracy = stats::accuracy(correct, self.input.len());
    }

    fn update_word_progress(&mut self) {
        if self.config.mode != TestMode::Words {
            return;
        }
        let progress = &mut self.word_progress;
        progress.words_completed =
            words::words_completed(&progress.boundaries, self.target.len(), self.input.len());
        progress.words_progress =
            words::words_progress(progress.words_completed, progress.target_word_count);
    }

    fn record_wpm_sample(&mut self) {
        if self.stats.elapsed_ms == 0 {
            return;
        }
        let t = self.stats.elapsed_ms as f64 / 1000.0;
        push_sample(
            &mut self.wpm_trace,
            WpmSample::new(t, f64::from(self.stats.wpm)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Difficulty;
    use assert_matches::assert_matches;

    fn session(text: &str, config: TestConfig) -> (TypingSession, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let mut s = TypingSession::with_clock(config, clock.clone());
        s.set_target_text(text);
        (s, clock)
    }

    fn quote_config() -> TestConfig {
        TestConfig {
            mode: TestMode::Quote,
            ..Default::default()
        }
    }

    fn type_str(s: &mut TypingSession, clock: &ManualClock, text: &str) -> Vec<KeyOutcome> {
        text.chars()
            .map(|c| {
                clock.advance_ms(200);
                s.handle_key(KeyInput::Char(c))
            })
            .collect()
    }

    fn statuses(s: &TypingSession) -> Vec<CharStatus> {
        s.character_states().iter().map(|c| c.status).collect()
    }

    #[test]
    fn set_target_text_resets_everything() {
        let (mut s, clock) = session("abc", quote_config());
        type_str(&mut s, &clock, "ab");
        s.set_target_text("xyz");

        assert_eq!(s.target_text(), "xyz");
        assert_eq!(s.user_input(), "");
        assert_eq!(s.status(), GameStatus::Ready);
        assert_eq!(
            statuses(&s),
            vec![CharStatus::Current, CharStatus::Default, CharStatus::Default]
        );
        assert_eq!(*s.stats(), SessionStats::fresh());
    }

    #[test]
    fn first_key_starts_the_clock() {
        let (mut s, clock) = session("abc", quote_config());
        assert_eq!(s.status(), GameStatus::Ready);
        clock.set_ms(5_000);
        s.handle_key(KeyInput::Char('a'));
        assert_eq!(s.status(), GameStatus::Running);
        assert_eq!(s.stats().start_time, Some(5_000));
    }

    #[test]
    fn classification_tracks_the_cursor() {
        let (mut s, clock) = session("test", quote_config());
        type_str(&mut s, &clock, "tx");
        assert_eq!(
            statuses(&s),
            vec![
                CharStatus::Correct,
                CharStatus::Incorrect,
                CharStatus::Current,
                CharStatus::Default
            ]
        );
        assert!(s.character_states()[1].classified_at.is_some());
        assert!(s.character_states()[2].classified_at.is_none());

        s.handle_key(KeyInput::Backspace);
        assert_eq!(
            statuses(&s),
            vec![
                CharStatus::Correct,
                CharStatus::Current,
                CharStatus::Default,
                CharStatus::Default
            ]
        );
    }

    #[test]
    fn backspace_on_empty_input_is_harmless() {
        let (mut s, _clock) = session("abc", quote_config());
        assert_eq!(s.handle_key(KeyInput::Backspace), KeyOutcome::Accepted);
        assert_eq!(s.user_input(), "");
        assert_eq!(s.character_states()[0].status, CharStatus::Current);
    }

    #[test]
    fn control_keys_are_rejected_without_starting() {
        let (mut s, _clock) = session("abc", quote_config());
        assert_eq!(s.handle_key(KeyInput::Other), KeyOutcome::Rejected);
        assert_eq!(s.handle_key(KeyInput::Char('\u{7}')), KeyOutcome::Rejected);
        assert_eq!(s.status(), GameStatus::Ready);
        assert_eq!(s.stats().start_time, None);
    }

    #[test]
    fn natural_completion_with_perfect_accuracy() {
        let (mut s, clock) = session("hi", quote_config());
        let outcomes = type_str(&mut s, &clock, "hi");
        assert_eq!(outcomes[0], KeyOutcome::Accepted);
        assert_matches!(outcomes[1], KeyOutcome::Finished(FinishReason::TextExhausted));
        assert_eq!(s.status(), GameStatus::Finished);
        assert_eq!(s.stats().accuracy, 100);
        assert!(!s.character_states().iter().any(|c| c.status == CharStatus::Current));
    }

    #[test]
    fn master_stops_on_first_mistake() {
        let config = TestConfig {
            difficulty: Difficulty::Master,
            ..quote_config()
        };
        let (mut s, clock) = session("the", config);
        let outcomes = type_str(&mut s, &clock, "thx");
        assert_matches!(outcomes[2], KeyOutcome::Finished(FinishReason::DifficultyFailed));
        assert_eq!(s.user_input(), "thx");
        assert_eq!(s.handle_key(KeyInput::Char('e')), KeyOutcome::Rejected);
        assert_eq!(s.handle_key(KeyInput::Backspace), KeyOutcome::Rejected);
        assert_eq!(s.user_input(), "thx");
    }

    #[test]
    fn master_failure_mid_text() {
        let config = TestConfig {
            difficulty: Difficulty::Master,
            ..quote_config()
        };
        let (mut s, clock) = session("the quick fox", config);
        let outcomes = type_str(&mut s, &clock, "tha");
        assert_matches!(outcomes[2], KeyOutcome::Finished(FinishReason::DifficultyFailed));
        assert_eq!(s.stats().incorrect_chars, 1);
    }

    #[test]
    fn expert_stops_when_broken_word_is_closed() {
        let config = TestConfig {
            difficulty: Difficulty::Expert,
            ..quote_config()
        };
        let (mut s, clock) = session("the quick fox", config);
        let outcomes = type_str(&mut s, &clock, "thx");
        assert!(outcomes.iter().all(|o| *o == KeyOutcome::Accepted));
        assert_matches!(
            s.handle_key(KeyInput::Char(' ')),
            KeyOutcome::Finished(FinishReason::DifficultyFailed)
        );
    }

    #[test]
    fn expert_allows_fixing_before_closing() {
        let config = TestConfig {
            difficulty: Difficulty::Expert,
            ..quote_config()
        };
        let (mut s, clock) = session("the quick", config);
        type_str(&mut s, &clock, "thx");
        s.handle_key(KeyInput::Backspace);
        let outcomes = type_str(&mut s, &clock, "e ");
        assert_eq!(outcomes, vec![KeyOutcome::Accepted, KeyOutcome::Accepted]);
    }

    #[test]
    fn words_mode_finishes_at_word_goal() {
        let config = TestConfig {
            mode: TestMode::Words,
            word_count: 2,
            ..Default::default()
        };
        let (mut s, clock) = session("hello world test game", config);
        let outcomes = type_str(&mut s, &clock, "hello world ");
        assert_eq!(s.user_input().len(), 12);
        assert_eq!(s.word_progress().words_completed, 2);
        assert_eq!(s.word_progress().words_progress, 100);
        assert_matches!(
            outcomes.last(),
            Some(KeyOutcome::Finished(FinishReason::WordCountReached))
        );
        assert_eq!(s.status(), GameStatus::Finished);
    }

    #[test]
    fn words_progress_counts_partial_goal() {
        let config = TestConfig {
            mode: TestMode::Words,
            word_count: 3,
            ..Default::default()
        };
        let (mut s, clock) = session("one two three four", config);
        type_str(&mut s, &clock, "one ");
        assert_eq!(s.word_progress().words_completed, 1);
        assert_eq!(s.word_progress().words_progress, 33);
        assert_eq!(s.status(), GameStatus::Running);
    }

    #[test]
    fn provider_word_count_overrides_goal() {
        let config = TestConfig {
            mode: TestMode::Words,
            word_count: 50,
            ..Default::default()
        };
        let (mut s, clock) = session("only two", config);
        s.set_target_word_count(2);
        let outcomes = type_str(&mut s, &clock, "only two");
        assert_matches!(
            outcomes.last(),
            Some(KeyOutcome::Finished(FinishReason::WordCountReached))
        );
    }

    #[test]
    fn keys_past_the_end_are_rejected() {
        let (mut s, _clock) = session("", quote_config());
        assert_eq!(s.handle_key(KeyInput::Char('a')), KeyOutcome::Rejected);
        assert_eq!(s.status(), GameStatus::Ready);
    }

    #[test]
    fn stats_follow_the_formulas() {
        let (mut s, clock) = session("hello world", quote_config());
        clock.set_ms(0);
        s.handle_key(KeyInput::Char('h'));
        for c in "ellx".chars() {
            clock.advance_ms(3_000);
            s.handle_key(KeyInput::Char(c));
        }
        // 4 correct of 5 typed in 12 seconds
        let stats = s.stats();
        assert_eq!(stats.total_chars, 5);
        assert_eq!(stats.correct_chars, 4);
        assert_eq!(stats.incorrect_chars, 1);
        assert_eq!(stats.elapsed_ms, 12_000);
        assert_eq!(stats.accuracy, 80);
        assert_eq!(stats.wpm, 4);
    }

    #[test]
    fn reset_is_idempotent() {
        let (mut s, clock) = session("abc def", quote_config());
        type_str(&mut s, &clock, "abx");
        s.reset_game();
        let once = format!("{s:?}");
        s.reset_game();
        assert_eq!(format!("{s:?}"), once);
        assert_eq!(s.status(), GameStatus::Ready);
        assert_eq!(s.user_input(), "");
        assert_eq!(s.target_text(), "abc def");
        assert_eq!(s.character_states()[0].status, CharStatus::Current);
        assert_eq!(s.word_progress().words_completed, 0);
        assert!(s.wpm_trace().is_empty());
    }

    #[test]
    fn finish_only_applies_to_running_tests() {
        let (mut s, clock) = session("abc", TestConfig::default());
        assert!(!s.finish());
        type_str(&mut s, &clock, "a");
        assert!(s.finish());
        assert_eq!(s.finish_reason(), Some(FinishReason::External));
        assert!(!s.finish());
        assert_eq!(s.handle_key(KeyInput::Char('b')), KeyOutcome::Rejected);
    }

    #[test]
    fn complete_stamps_end_time_once() {
        let (mut s, clock) = session("abc", TestConfig::default());
        assert!(s.complete().is_none(), "nothing typed yet");

        clock.set_ms(10_000);
        s.handle_key(KeyInput::Char('a'));
        clock.set_ms(16_000);
        let result = s.complete().expect("first completion yields a result");
        assert_eq!(s.status(), GameStatus::Finished);
        assert_eq!(s.stats().end_time, Some(16_000));
        assert_eq!(s.stats().elapsed_ms, 6_000);
        assert_eq!(result.correct_chars, 1);
        assert_eq!(result.duration, Some(30));
        assert_eq!(result.word_count, None);

        assert!(s.complete().is_none());
    }

    #[test]
    fn pause_freezes_elapsed_time() {
        let (mut s, clock) = session("abcdef", TestConfig::default());
        clock.set_ms(0);
        s.handle_key(KeyInput::Char('a'));
        clock.set_ms(1_000);
        assert!(s.pause());
        assert_eq!(s.status(), GameStatus::Paused);
        assert_eq!(s.handle_key(KeyInput::Char('b')), KeyOutcome::Rejected);
        assert_eq!(s.user_input(), "a");

        clock.set_ms(61_000);
        assert!(s.resume());
        assert_eq!(s.stats().start_time, Some(60_000));
        clock.set_ms(62_000);
        s.handle_key(KeyInput::Char('b'));
        assert_eq!(s.stats().elapsed_ms, 2_000);
    }

    #[test]
    fn pause_is_time_mode_only() {
        let (mut s, clock) = session("abc", quote_config());
        type_str(&mut s, &clock, "a");
        assert!(!s.pause());
        assert!(!s.resume());
        assert_eq!(s.status(), GameStatus::Running);
    }

    #[test]
    fn wpm_trace_grows_with_time() {
        let (mut s, clock) = session("abcdefgh", quote_config());
        for c in "abcd".chars() {
            clock.advance_ms(600);
            s.handle_key(KeyInput::Char(c));
        }
        let trace = s.wpm_trace();
        assert!(!trace.is_empty());
        assert!(trace.windows(2).all(|w| w[0].t < w[1].t));
    }

    #[test]
    fn sessions_are_independent() {
        let (mut a, clock_a) = session("abc", quote_config());
        let (b, _clock_b) = session("abc", quote_config());
        type_str(&mut a, &clock_a, "ab");
        assert_eq!(b.user_input(), "");
        assert_eq!(b.status(), GameStatus::Ready);
    }

    #[test]
    fn key_names_drive_the_session() {
        let (mut s, _clock) = session("ab", quote_config());
        assert_eq!(s.handle_key_name("Shift"), KeyOutcome::Rejected);
        assert_eq!(s.handle_key_name("a"), KeyOutcome::Accepted);
        assert_eq!(s.handle_key_name("Backspace"), KeyOutcome::Accepted);
        assert_eq!(s.user_input(), "");
    }
}

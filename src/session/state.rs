use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CharStatus {
    Default,
    Correct,
    Incorrect,
    Current,
}

/// One character of the target text and how it has been typed so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharacterState {
    pub char: char,
    pub status: CharStatus,
    /// epoch ms when the character was classified correct/incorrect
    pub classified_at: Option<u64>,
}

impl CharacterState {
    pub fn untyped(char: char) -> Self {
        Self {
            char,
            status: CharStatus::Default,
            classified_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Ready,
    Running,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub elapsed_ms: u64,
    pub total_chars: usize,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
}

impl SessionStats {
    /// Stats before the first keystroke: nothing typed, nothing missed
    pub fn fresh() -> Self {
        Self {
            accuracy: 100,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WordProgress {
    pub boundaries: Vec<usize>,
    pub target_word_count: usize,
    pub words_completed: usize,
    pub words_progress: u32,
}

impl WordProgress {
    pub fn reset_counters(&mut self) {
        self.words_completed = 0;
        self.words_progress = 0;
    }
}

/// Result of feeding one key to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// outside the accepted alphabet, past the end of the text, or the session is not accepting input
    Rejected,
    Accepted,
    /// accepted and the key ended the test
    Finished(FinishReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    DifficultyFailed,
    WordCountReached,
    TextExhausted,
    /// forced from outside, e.g. the time-mode countdown expired
    External,
}

/// Keyboard input the session understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Other,
}

impl KeyInput {
    /// Maps a DOM-style key name, so `"a"`, `"Backspace"`, `"Shift"`.
    pub fn from_key_name(name: &str) -> Self {
        if name == "Backspace" {
            return KeyInput::Backspace;
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_control() => KeyInput::Char(c),
            _ => KeyInput::Other,
        }
    }
}

impl From<crossterm::event::KeyEvent> for KeyInput {
    fn from(key: crossterm::event::KeyEvent) -> Self {
        use crossterm::event::{KeyCode, KeyModifiers};

        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return KeyInput::Other;
        }
        match key.code {
            KeyCode::Backspace => KeyInput::Backspace,
            KeyCode::Char(c) if !c.is_control() => KeyInput::Char(c),
            _ => KeyInput::Other,
        }
    }
}

use itertools::Itertools;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigPatch, TestConfig, TestMode};
use crate::error::ProviderError;
use crate::history::{HistorySink, TestResult};
use crate::session::{KeyInput, KeyOutcome, TypingSession};
use crate::text::{punctuate, TextProvider};

/// Used whenever the text provider cannot deliver
pub const FALLBACK_TEXT: &str = "the quick brown fox jumps over the lazy dog";

/// Words fetched for a time-mode test
pub const TIME_MODE_WORDS: usize = 120;

struct LoadedText {
    text: String,
    word_count: Option<usize>,
    quote_source: Option<String>,
}

/// Single owner of one typing session and the collaborators around it:
/// where the text comes from and where finished results go.
pub struct SessionController {
    session: TypingSession,
    provider: Box<dyn TextProvider>,
    history: Box<dyn HistorySink>,
    randomize: bool,
    text_error: Option<String>,
    persistence_error: Option<String>,
    quote_source: Option<String>,
    last_result: Option<TestResult>,
}

impl SessionController {
    pub fn new(
        config: TestConfig,
        provider: impl TextProvider + 'static,
        history: impl HistorySink + 'static,
    ) -> Self {
        Self::with_clock(config, provider, history, SystemClock, true)
    }

    pub fn with_clock(
        config: TestConfig,
        provider: impl TextProvider + 'static,
        history: impl HistorySink + 'static,
        clock: impl Clock + 'static,
        randomize: bool,
    ) -> Self {
        let mut controller = Self {
            session: TypingSession::with_clock(config, clock),
            provider: Box::new(provider),
            history: Box::new(history),
            randomize,
            text_error: None,
            persistence_error: None,
            quote_source: None,
            last_result: None,
        };
        controller.reload_text();
        controller
    }

    /// Merges `patch` into the config and reloads the text when the change
    /// affects it. Returns whether a reload happened.
    pub fn configure(&mut self, patch: ConfigPatch) -> bool {
        if self.session.configure(patch) {
            self.reload_text();
            true
        } else {
            false
        }
    }

    /// Fetches fresh text for the current config. Provider failures fall
    /// back to [`FALLBACK_TEXT`] and set the text error flag.
    pub fn reload_text(&mut self) {
        self.last_result = None;
        self.persistence_error = None;

        match self.fetch_text() {
            Ok(loaded) => {
                tracing::info!(
                    mode = %self.session.config().mode,
                    chars = loaded.text.chars().count(),
                    "target text loaded"
                );
                self.text_error = None;
                self.quote_source = loaded.quote_source;
                self.session.set_target_text(loaded.text);
                if let Some(count) = loaded.word_count {
                    self.session.set_target_word_count(count);
                }
            }
            Err(err) => {
                tracing::warn!(%err, "text provider failed, using fallback text");
                self.text_error = Some(err.to_string());
                self.quote_source = None;
                self.session.set_target_text(FALLBACK_TEXT);
                let fallback_words = FALLBACK_TEXT.split_whitespace().count();
                let wanted = self.session.config().word_count;
                self.session
                    .set_target_word_count(wanted.min(fallback_words));
            }
        }
    }

    fn fetch_text(&self) -> Result<LoadedText, ProviderError> {
        let config = self.session.config();

        if let Some(custom) = &config.custom_text {
            return Ok(LoadedText {
                text: custom.split_whitespace().join(" "),
                word_count: Some(custom.split_whitespace().count()),
                quote_source: None,
            });
        }

        let limit = match config.mode {
            TestMode::Quote => {
                let quote = self.provider.fetch_quote(self.randomize)?;
                return Ok(LoadedText {
                    text: quote.text,
                    word_count: None,
                    quote_source: Some(quote.source),
                });
            }
            TestMode::Words => config.word_count,
            TestMode::Time => TIME_MODE_WORDS,
        };

        let response = self
            .provider
            .fetch_words(&config.text_source, limit, self.randomize)?;
        let count = response.metadata.count;
        let words = if config.punctuation {
            punctuate(response.words, &mut rand::thread_rng())
        } else {
            response.words
        };

        Ok(LoadedText {
            text: words.join(" "),
            word_count: Some(count),
            quote_source: None,
        })
    }

    /// Feeds one key to the session; completes the test when the key ends it.
    pub fn handle_key(&mut self, key: KeyInput) -> KeyOutcome {
        let outcome = self.session.handle_key(key);
        if let KeyOutcome::Finished(_) = outcome {
            self.complete_game();
        }
        outcome
    }

    /// Restarts the current text from scratch.
    pub fn reset_game(&mut self) {
        self.session.reset_game();
        self.last_result = None;
        self.persistence_error = None;
    }

    /// Finalizes the test and hands the result to the history sink.
    /// A failing sink is reported through [`Self::persistence_error`] and
    /// never undoes the completion.
    pub fn complete_game(&mut self) -> Option<&TestResult> {
        if let Some(result) = self.session.complete() {
            match self.history.persist(&result) {
                Ok(()) => {
                    tracing::info!(
                        wpm = result.wpm,
                        accuracy = result.accuracy,
                        mode = %result.mode,
                        "test completed"
                    );
                }
                Err(err) => {
                    tracing::error!(%err, "could not save result");
                    self.persistence_error = Some(err.to_string());
                }
            }
            self.last_result = Some(result);
        }
        self.last_result.as_ref()
    }

    pub fn pause(&mut self) -> bool {
        self.session.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.session.resume()
    }

    pub fn session(&self) -> &TypingSession {
        &self.session
    }

    pub fn config(&self) -> &TestConfig {
        self.session.config()
    }

    pub fn text_error(&self) -> Option<&str> {
        self.text_error.as_deref()
    }

    pub fn persistence_error(&self) -> Option<&str> {
        self.persistence_error.as_deref()
    }

    pub fn quote_source(&self) -> Option<&str> {
        self.quote_source.as_deref()
    }

    pub fn last_result(&self) -> Option<&TestResult> {
        self.last_result.as_ref()
    }

    pub fn history(&self) -> &dyn HistorySink {
        self.history.as_ref()
    }

    pub fn available_lists(&self) -> Vec<String> {
        self.provider.available_lists()
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("session", &self.session)
            .field("randomize", &self.randomize)
            .field("text_error", &self.text_error)
            .field("persistence_error", &self.persistence_error)
            .finish_non_exhaustive()
    }
}

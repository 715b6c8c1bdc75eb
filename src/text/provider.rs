use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

static WORDS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/words");

/// Identifier of the embedded quote collection
pub const QUOTES_LIST: &str = "quotes";

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Quote {
    pub text: String,
    pub source: String,
}

#[derive(Deserialize, Clone, Debug)]
struct QuoteList {
    quotes: Vec<Quote>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordsMetadata {
    pub list: String,
    pub count: usize,
    pub total_available: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordsResponse {
    pub words: Vec<String>,
    pub metadata: WordsMetadata,
}

impl WordsResponse {
    pub fn joined(&self) -> String {
        self.words.join(" ")
    }
}

/// Source of practice text
pub trait TextProvider {
    /// Up to `limit` words from `list`. Random fetches sample without
    /// replacement, so short lists return fewer words than asked for.
    fn fetch_words(
        &self,
        list: &str,
        limit: usize,
        randomize: bool,
    ) -> Result<WordsResponse, ProviderError>;

    fn fetch_quote(&self, randomize: bool) -> Result<Quote, ProviderError>;

    fn available_lists(&self) -> Vec<String>;
}

/// Word lists and quotes compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedWordLists;

impl EmbeddedWordLists {
    fn contents(list: &str) -> Result<&'static str, ProviderError> {
        let file = WORDS_DIR
            .get_file(format!("{list}.json"))
            .ok_or_else(|| ProviderError::UnknownList(list.to_string()))?;
        file.contents_utf8().ok_or_else(|| ProviderError::Malformed {
            list: list.to_string(),
            reason: "not valid utf-8".to_string(),
        })
    }
}

impl TextProvider for EmbeddedWordLists {
    fn fetch_words(
        &self,
        list: &str,
        limit: usize,
        randomize: bool,
    ) -> Result<WordsResponse, ProviderError> {
        if list == QUOTES_LIST {
            return Err(ProviderError::UnknownList(list.to_string()));
        }
        let word_list = parse_word_list(list, Self::contents(list)?)?;
        let total_available = word_list.words.len();

        let words: Vec<String> = if randomize {
            let mut rng = rand::thread_rng();
            word_list
                .words
                .choose_multiple(&mut rng, limit)
                .cloned()
                .collect()
        } else {
            word_list.words.into_iter().take(limit).collect()
        };

        Ok(WordsResponse {
            metadata: WordsMetadata {
                list: list.to_string(),
                count: words.len(),
                total_available,
            },
            words,
        })
    }

    fn fetch_quote(&self, randomize: bool) -> Result<Quote, ProviderError> {
        let malformed = |reason: String| ProviderError::Malformed {
            list: QUOTES_LIST.to_string(),
            reason,
        };
        let quotes: QuoteList = serde_json::from_str(Self::contents(QUOTES_LIST)?)
            .map_err(|e| malformed(e.to_string()))?;

        let quote = if randomize {
            quotes.quotes.choose(&mut rand::thread_rng()).cloned()
        } else {
            quotes.quotes.first().cloned()
        };
        quote.ok_or_else(|| malformed("no quotes".to_string()))
    }

    fn available_lists(&self) -> Vec<String> {
        let mut names: Vec<String> = WORDS_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .filter_map(|stem| stem.to_str())
            .filter(|name| *name != QUOTES_LIST)
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }
}

/// Parses a `{name, size, words}` list, rejecting lists without usable words.
pub fn parse_word_list(list: &str, contents: &str) -> Result<WordList, ProviderError> {
    let malformed = |reason: String| ProviderError::Malformed {
        list: list.to_string(),
        reason,
    };

    let mut parsed: WordList =
        serde_json::from_str(contents).map_err(|e| malformed(e.to_string()))?;
    parsed.words.retain(|w| !w.trim().is_empty());
    if parsed.words.is_empty() {
        return Err(malformed("no words".to_string()));
    }
    if parsed.words.iter().any(|w| w.contains(char::is_whitespace)) {
        return Err(malformed("words must not contain whitespace".to_string()));
    }
    Ok(parsed)
}

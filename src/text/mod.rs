pub mod provider;
pub mod punctuation;

pub use provider::{
    parse_word_list, EmbeddedWordLists, Quote, TextProvider, WordList, WordsMetadata,
    WordsResponse, QUOTES_LIST,
};
pub use punctuation::punctuate;

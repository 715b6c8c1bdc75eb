use rand::seq::SliceRandom;
use rand::Rng;

/// Turns a plain word sequence into sentences: capitalized starts, the odd
/// comma, and a terminal mark at every sentence end. The word count is unchanged.
pub fn punctuate<R: Rng + ?Sized>(words: Vec<String>, rng: &mut R) -> Vec<String> {
    let last = words.len().saturating_sub(1);
    let mut sentence_start = true;

    words
        .into_iter()
        .enumerate()
        .map(|(i, word)| {
            let mut formatted = if sentence_start {
                capitalize_first_letter(&word)
            } else {
                word
            };
            sentence_start = false;

            if i == last || rng.gen_bool(0.12) {
                formatted.push_str(final_mark(rng));
                sentence_start = true;
            } else if rng.gen_bool(0.15) {
                formatted.push(',');
            }
            formatted
        })
        .collect()
}

fn final_mark<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    match rng.gen_range(0..100) {
        0..=79 => ".",
        80..=94 => "!",
        _ => ["?", "..."].choose(rng).copied().unwrap_or("?"),
    }
}

pub fn capitalize_first_letter(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

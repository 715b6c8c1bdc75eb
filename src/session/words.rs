/// Start offsets (in chars) of every maximal run of non-space characters.
/// Runs of several spaces between words produce no extra boundaries.
pub fn word_boundaries(text: &[char]) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut in_word = false;
    for (idx, c) in text.iter().enumerate() {
        let is_space = *c == ' ';
        if !is_space && !in_word {
            boundaries.push(idx);
        }
        in_word = !is_space;
    }
    boundaries
}

/// Number of words whose span is fully covered by `typed_len` characters.
/// A word ends where the next one starts (so its trailing spaces belong to it),
/// the last word ends at the end of the text.
pub fn words_completed(boundaries: &[usize], text_len: usize, typed_len: usize) -> usize {
    boundaries
        .iter()
        .enumerate()
        .take_while(|(i, _)| {
            let word_end = boundaries.get(i + 1).copied().unwrap_or(text_len);
            typed_len >= word_end
        })
        .count()
}

pub fn words_progress(completed: usize, target: usize) -> u32 {
    if target == 0 {
        return 0;
    }
    (100.0 * completed as f64 / target as f64).round() as u32
}

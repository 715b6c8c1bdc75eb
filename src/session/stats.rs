/// Characters per "word" in WPM arithmetic
pub const CHARS_PER_WORD: f64 = 5.0;

/// Counts of typed characters against the target, position by position
pub fn count_correct(input: &[char], target: &[char]) -> usize {
    input
        .iter()
        .zip(target.iter())
        .filter(|(typed, expected)| typed == expected)
        .count()
}

/// Words per minute from correct characters only, rounded
pub fn wpm(correct_chars: usize, elapsed_ms: u64) -> u32 {
    let elapsed_minutes = elapsed_ms as f64 / 60_000.0;
    if elapsed_minutes > 0.0 {
        ((correct_chars as f64 / CHARS_PER_WORD) / elapsed_minutes).round() as u32
    } else {
        0
    }
}

/// Percentage of typed characters that were correct, rounded.
/// Nothing typed counts as perfect.
pub fn accuracy(correct_chars: usize, typed_chars: usize) -> u32 {
    if typed_chars > 0 {
        let ratio = correct_chars.min(typed_chars) as f64 / typed_chars as f64;
        (100.0 * ratio).round() as u32
    } else {
        100
    }
}

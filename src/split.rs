/// Pick the index at which an over-long segment should be broken.
///
/// Scans right to left for the last sentence-ending word, then for the last
/// comma, and otherwise falls back to the midpoint. The returned index is the
/// position right after the chosen word, so it can equal `words.len()`.
/// Returns 0 for segments of one word or less, which cannot be split.
pub fn find_split<S: AsRef<str>>(words: &[S]) -> usize {
    if words.len() <= 1 {
        return 0;
    }

    if let Some(index) = rightmost_ending_with(words, &['.', '!', '?']) {
        return index + 1;
    }

    if let Some(index) = rightmost_ending_with(words, &[',']) {
        return index + 1;
    }

    words.len() / 2
}

fn rightmost_ending_with<S: AsRef<str>>(words: &[S], marks: &[char]) -> Option<usize> {
    words
        .iter()
        .rposition(|word| trailing_mark(word.as_ref()).is_some_and(|c| marks.contains(&c)))
}

// Last meaningful character, looking through closing quotes and brackets
fn trailing_mark(word: &str) -> Option<char> {
    word.trim_end_matches(['"', '\'', ')', ']', '”', '’', '»'])
        .chars()
        .next_back()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_segments_cannot_split() {
        assert_eq!(find_split::<&str>(&[]), 0);
        assert_eq!(find_split(&["alone."]), 0);
    }

    #[test]
    fn test_prefers_rightmost_sentence_end() {
        let words = ["One.", "two", "three!", "four,", "five"];
        assert_eq!(find_split(&words), 3);
    }

    #[test]
    fn test_sentence_end_beats_later_comma() {
        let words = ["Is", "it?", "yes,", "maybe"];
        assert_eq!(find_split(&words), 2);
    }

    #[test]
    fn test_falls_back_to_comma() {
        let words = ["well,", "I", "think,", "so"];
        assert_eq!(find_split(&words), 3);
    }

    #[test]
    fn test_falls_back_to_midpoint() {
        let words = ["a", "b", "c", "d", "e"];
        assert_eq!(find_split(&words), 2);
        assert_eq!(find_split(&["a", "b"]), 1);
    }

    #[test]
    fn test_punctuation_on_last_word_returns_len() {
        let words = ["Hello", "world."];
        assert_eq!(find_split(&words), 2);
    }

    #[test]
    fn test_looks_through_closing_quotes() {
        let words = ["He", "said", "\"stop.\"", "then", "left"];
        assert_eq!(find_split(&words), 3);
    }
}

/// Count the words in a block of text.
///
/// A word is a maximal run of non-whitespace characters. Line breaks and
/// Unicode whitespace separate words; punctuation does not.
pub fn word_count_from(text: &str) -> usize {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0;
    }

    trimmed.split_whitespace().count()
}

use std::collections::BTreeSet;

use super::numeric::{parse_number, DEFAULT_MAX, DEFAULT_MIN};

const WORDS: [(&str, &str, i64); 5] = [
    (" one ", "1 star", 1),
    (" two ", "2 star", 2),
    (" three ", "3 star", 3),
    (" four ", "4 star", 4),
    (" five ", "5 star", 5),
];

/// Reads a 1-5 star rating.
///
/// Models often explain themselves, so every signal in the text proposes a
/// value: `*` count, `★` count, number words / "N star", and the numeric
/// parser. The rating is accepted only when all proposals agree.
pub fn parse_stars(text: &str) -> Option<i64> {
    let lowered = text.to_lowercase();
    let mut proposals = BTreeSet::new();

    for symbol in ['*', '★'] {
        let count = lowered.chars().filter(|&c| c == symbol).count();
        if count > 0 {
            proposals.insert(count as i64);
        }
    }

    let padded = format!(" {} ", lowered).replace('\n', " ");
    for (word, digits, value) in WORDS {
        if padded.contains(word) || padded.contains(digits) {
            proposals.insert(value);
        }
    }

    if let Some(n) = parse_number(&padded, DEFAULT_MIN, DEFAULT_MAX) {
        proposals.insert(n);
    }

    let mut iter = proposals.into_iter();
    match (iter.next(), iter.next()) {
        (Some(value), None) if (1..=5).contains(&value) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unanimous_signals() {
        assert_eq!(parse_stars("★★★★★ Five stars: perfect"), Some(5));
        assert_eq!(parse_stars("4 stars"), Some(4));
        assert_eq!(parse_stars("***"), Some(3));
        assert_eq!(parse_stars("Two"), Some(2));
        assert_eq!(parse_stars("One\nstar"), Some(1));
    }

    #[test]
    fn conflicting_signals_are_rejected() {
        assert_eq!(parse_stars("three stars, maybe 4 stars"), None);
        // Markdown bold adds four '*' next to the digit.
        assert_eq!(parse_stars("**5**"), None);
        assert_eq!(parse_stars("★★★ but honestly five"), None);
    }

    #[test]
    fn no_signal() {
        assert_eq!(parse_stars("excellent translation"), None);
        assert_eq!(parse_stars(""), None);
    }

    #[test]
    fn unanimous_but_out_of_range() {
        assert_eq!(parse_stars("0"), None);
        assert_eq!(parse_stars("******"), None);
        assert_eq!(parse_stars("I rate it 80"), None);
    }

    #[test]
    fn number_words_need_word_boundaries() {
        // "someone" and "fivefold" must not count as words.
        assert_eq!(parse_stars("someone said fivefold"), None);
    }
}

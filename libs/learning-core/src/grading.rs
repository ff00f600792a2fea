//! Answer grading for multiple-choice letter sets.
//!
//! Submitted answers arrive as a list of selected option letters. Grading is
//! order-insensitive: "CA" and "AC" are the same selection. Repeated letters
//! collapse to one.

/// Normalize an answer string: strip whitespace, sort letters, drop repeats.
pub fn normalize_answer(raw: &str) -> String {
    let mut letters: Vec<char> = raw.chars().filter(|c| !c.is_whitespace()).collect();
    letters.sort_unstable();
    letters.dedup();
    letters.into_iter().collect()
}

/// Concatenate submitted option letters into a single answer string.
pub fn join_choices(choices: &[String]) -> String {
    normalize_answer(&choices.concat())
}

/// Compare a submitted answer against the canonical one.
pub fn is_correct(submitted: &str, canonical: &str) -> bool {
    normalize_answer(submitted) == normalize_answer(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_sorts_letters() {
        assert_eq!(normalize_answer("CAB"), "ABC");
        assert_eq!(normalize_answer("A"), "A");
        assert_eq!(normalize_answer(""), "");
    }

    #[test]
    fn normalization_drops_repeats_and_whitespace() {
        assert_eq!(normalize_answer("AAB"), "AB");
        assert_eq!(normalize_answer(" B A "), "AB");
    }

    #[test]
    fn grading_is_order_insensitive() {
        assert!(is_correct("CA", "AC"));
        assert!(is_correct("ABC", "CBA"));
        assert!(!is_correct("AB", "AC"));
        assert!(!is_correct("", "A"));
    }

    #[test]
    fn choices_join_into_letter_set() {
        let choices = vec!["C".to_string(), "A".to_string()];
        assert_eq!(join_choices(&choices), "AC");
        assert!(is_correct(&join_choices(&choices), "CA"));
    }
}

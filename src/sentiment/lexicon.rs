//! Fragment sets for the lexical half of the classifier.
//!
//! Entries are substrings, not words: `"annoy"` hits "annoying", `"irritat"` hits
//! "irritated", and "unhappy" lights up both `"unhappy"` and `"happy"`.

pub const POSITIVE_FRAGMENTS: &[&str] = &[
    "love",
    "great",
    "amazing",
    "wonderful",
    "excellent",
    "fantastic",
    "superb",
    "awesome",
    "perfect",
    "brilliant",
    "outstanding",
    "happy",
    "joy",
    "delight",
    "pleasure",
    "thrilled",
    "ecstatic",
    "fabulous",
    "terrific",
    "super",
    "wow",
    "yay",
    "yippee",
    "hooray",
    "nice",
    "good",
];

pub const NEGATIVE_FRAGMENTS: &[&str] = &[
    "hate",
    "terrible",
    "awful",
    "horrible",
    "worst",
    "bad",
    "sad",
    "angry",
    "mad",
    "upset",
    "disappoint",
    "failure",
    "fail",
    "crap",
    "suck",
    "dreadful",
    "miserable",
    "tragic",
    "unhappy",
    "annoy",
    "irritat",
    "frustrat",
    "poor",
    "boring",
];

/// Number of distinct fragments contained in `lowered`. Repeats do not add up.
pub fn count_fragments(lowered: &str, fragments: &[&str]) -> usize {
    fragments.iter().filter(|f| lowered.contains(*f)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fragment_sets_have_no_duplicates() {
        let pos: HashSet<_> = POSITIVE_FRAGMENTS.iter().collect();
        let neg: HashSet<_> = NEGATIVE_FRAGMENTS.iter().collect();
        assert_eq!(pos.len(), POSITIVE_FRAGMENTS.len());
        assert_eq!(neg.len(), NEGATIVE_FRAGMENTS.len());
    }

    #[test]
    fn fragments_match_inside_words() {
        assert_eq!(count_fragments("this is so annoying", NEGATIVE_FRAGMENTS), 1);
        assert_eq!(count_fragments("i got irritated", NEGATIVE_FRAGMENTS), 1);
    }

    #[test]
    fn repeats_count_once() {
        assert_eq!(count_fragments("bad bad bad", NEGATIVE_FRAGMENTS), 1);
    }

    #[test]
    fn overlapping_fragments_each_count() {
        // "unhappy" + "happy" on different sides, "superb" + "super" on the same side
        assert_eq!(count_fragments("unhappy", NEGATIVE_FRAGMENTS), 1);
        assert_eq!(count_fragments("unhappy", POSITIVE_FRAGMENTS), 1);
        assert_eq!(count_fragments("superb", POSITIVE_FRAGMENTS), 2);
    }
}

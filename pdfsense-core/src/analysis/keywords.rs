use crate::{consts::KEYWORD_VOCABULARY, model::KeywordSet};

/// Vocabulary terms contained in `text`, in vocabulary order.
///
/// Matching is case-insensitive substring containment, so "testing" reports
/// "test".
pub fn detect_keywords(text: &str) -> KeywordSet {
    detect_keywords_in(text, &KEYWORD_VOCABULARY)
}

pub fn detect_keywords_in(text: &str, vocabulary: &[&str]) -> KeywordSet {
    let haystack = text.to_lowercase();
    vocabulary
        .iter()
        .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
        .map(|keyword| keyword.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_keywords_follow_vocabulary_order() {
        let found = detect_keywords("Cable length 5m, voltage 220V");
        assert_eq!(found, vec!["cable", "voltage", "length"]);
    }

    #[test]
    fn test_keywords_substring_and_case() {
        assert_eq!(detect_keywords("Retesting of WIRES"), vec!["wire", "test"]);
        assert!(detect_keywords("").is_empty());
        assert!(detect_keywords("nothing relevant here").is_empty());
    }

    #[test]
    fn test_keywords_listed_once() {
        let found = detect_keywords("cable cable CABLE cable");
        assert_eq!(found, vec!["cable"]);
    }

    proptest! {
        #[test]
        fn adding_found_keyword_is_monotonic(text in "[a-z ]{0,40}") {
            let found = detect_keywords(&text);
            for keyword in &found {
                let extended = format!("{text} {keyword}");
                prop_assert_eq!(&detect_keywords(&extended), &found);
            }
        }
    }
}

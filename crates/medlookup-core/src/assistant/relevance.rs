//! Cheap pre-filter for messages that cannot be medicine questions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::resolver::STOPWORDS;

pub const MIN_MESSAGE_LEN: usize = 2;
pub const MAX_MESSAGE_LEN: usize = 500;

/// Words that mark a message as medicine-related on their own.
const MEDICINE_KEYWORDS: &[&str] = &[
    "medicine", "medicines", "medication", "drug", "drugs", "tablet", "tablets", "tab", "tabs",
    "capsule", "capsules", "syrup", "injection", "cream", "gel", "ointment", "drops", "inhaler",
    "spray", "suspension", "dose", "dosage", "mg", "mcg", "ml", "price", "cost", "mrp",
    "composition", "ingredients", "salt", "side", "effects", "alternative", "alternatives",
    "substitute", "substitutes", "generic", "manufacturer", "pharma", "pharmacy",
];

/// Topics that are never medicine questions, unless a medicine keyword is also present.
const UNRELATED_TOPICS: &[&str] = &[
    "weather", "football", "cricket", "movie", "movies", "song", "songs", "music", "joke",
    "jokes", "recipe", "politics", "election", "bitcoin", "crypto", "stock", "stocks", "game",
    "games", "homework", "news",
];

const GREETINGS: &[&str] = &[
    "hi", "hello", "hey", "hii", "yo", "thanks", "thank you", "ok", "okay", "bye",
    "good morning", "good evening", "good night", "how are you", "who are you",
];

/// A word immediately followed by a strength, e.g. "dolo 650" or "crocin 500mg".
static WORD_WITH_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z][a-z\-]+\s*\d+(?:\.\d+)?\s*(?:mg|mcg|ml|g|iu)?\b").unwrap()
});

fn tokens(message: &str) -> Vec<String> {
    message
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `message` plausibly asks about a medicine.
///
/// Accepts on a medicine keyword or a word+number strength; otherwise
/// requires at least one purely alphabetic non-stopword token of three or
/// more letters. Greetings and unrelated topics are rejected.
pub fn is_plausible_medicine_query(message: &str) -> bool {
    let trimmed = message.trim();
    let len = trimmed.chars().count();
    if !(MIN_MESSAGE_LEN..=MAX_MESSAGE_LEN).contains(&len) {
        return false;
    }

    let tokens = tokens(trimmed);
    if tokens.is_empty() || GREETINGS.contains(&tokens.join(" ").as_str()) {
        return false;
    }

    let has_keyword = tokens.iter().any(|t| MEDICINE_KEYWORDS.contains(&t.as_str()));
    if has_keyword {
        return true;
    }
    if tokens.iter().any(|t| UNRELATED_TOPICS.contains(&t.as_str())) {
        return false;
    }
    if WORD_WITH_NUMBER.is_match(trimmed) {
        return true;
    }

    tokens.iter().any(|t| {
        t.len() >= 3
            && t.chars().all(|c| c.is_ascii_alphabetic())
            && !STOPWORDS.contains(&t.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_medicine_questions() {
        for message in [
            "What is the price of Dolo 650?",
            "paracetmol tablet",
            "side effects of azithral",
            "crocin 500mg",
            "Allegra",
            "dolo650",
        ] {
            assert!(is_plausible_medicine_query(message), "{}", message);
        }
    }

    #[test]
    fn test_rejects_noise() {
        for message in [
            "",
            " ",
            "a",
            "xyz123notamedicine",
            "hello",
            "Hi!",
            "how are you?",
            "what is the weather today",
            "12345",
            "what is the",
        ] {
            assert!(!is_plausible_medicine_query(message), "{:?}", message);
        }
    }

    #[test]
    fn test_keyword_outweighs_topic() {
        assert!(is_plausible_medicine_query("cricket player injection price"));
    }

    #[test]
    fn test_length_bounds() {
        assert!(!is_plausible_medicine_query(&"dolo ".repeat(120)));
        assert!(is_plausible_medicine_query("Pan 40"));
        assert!(!is_plausible_medicine_query("ab"));
    }
}

//! Edit-distance similarity for typo-tolerant matching.

use strsim::levenshtein;

/// Levenshtein distance over Unicode scalar values.
pub fn edit_distance(a: &str, b: &str) -> usize {
    levenshtein(a, b)
}

/// Similarity as a percentage: `(max_len - distance) / max_len * 100`.
///
/// Two empty strings are 100% similar.
pub fn similarity_percent(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 100.0;
    }
    let distance = edit_distance(a, b);
    (max_len - distance) as f64 / max_len as f64 * 100.0
}

/// Score a catalog name against a search term.
///
/// Takes the better of the whole name and the name's first N words, where N
/// is the term's word count, so strength and form suffixes do not drag a
/// close match below the threshold. Both inputs are compared lowercased.
pub fn name_similarity(term: &str, name: &str) -> f64 {
    let term = term.trim().to_lowercase();
    let name = name.trim().to_lowercase();

    let whole = similarity_percent(&term, &name);

    let word_count = term.split_whitespace().count().max(1);
    let leading = name
        .split_whitespace()
        .take(word_count)
        .collect::<Vec<_>>()
        .join(" ");

    whole.max(similarity_percent(&term, &leading))
}

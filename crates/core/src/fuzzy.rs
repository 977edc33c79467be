//! Fuzzy matching of search queries against patient labels.
//!
//! Scores follow the "partial ratio" idea: a short query typed at the scene ("ola hans")
//! should score 100 against a long label that contains it, so the shorter string is slid over
//! the longer one and the best window wins.

use ambu_types::MatchScore;

/// Best normalized-Levenshtein similarity of the shorter input against any equally long
/// window of the longer one. Comparison is case-insensitive and counts chars, not bytes.
pub fn partial_ratio(a: &str, b: &str) -> MatchScore {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return MatchScore::default();
    }

    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let short: String = short.into_iter().collect();

    let mut best = 0.0_f64;
    for window in long.windows(short.chars().count()) {
        let window: String = window.iter().collect();
        let similarity = strsim::normalized_levenshtein(&short, &window);
        if similarity > best {
            best = similarity;
            if best >= 1.0 {
                break;
            }
        }
    }

    MatchScore::from_ratio(best)
}

/// Scores every choice against `query`, keeps those at or above `threshold` and returns them
/// best first. Equal scores keep the order of `choices`.
pub fn fuzzy_search<'a, I>(query: &str, choices: I, threshold: u8) -> Vec<(&'a str, MatchScore)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut results: Vec<(&'a str, MatchScore)> = choices
        .into_iter()
        .map(|choice| (choice, partial_ratio(query, choice)))
        .filter(|(_, score)| score.value() >= threshold)
        .collect();
    results.sort_by(|x, y| y.1.cmp(&x.1));
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_scores_100() {
        assert_eq!(
            partial_ratio("ola hansen", "Ola Hansen - 120384 12345"),
            MatchScore::MAX
        );
        assert_eq!(partial_ratio("120384", "Ola Hansen - 120384 12345").value(), 100);
    }

    #[test]
    fn argument_order_does_not_matter() {
        let label = "Kari Nordmann – 250795 67890";
        assert_eq!(partial_ratio("kari nordman", label), partial_ratio(label, "kari nordman"));
    }

    #[test]
    fn typo_scores_below_100_but_above_threshold() {
        let score = partial_ratio("ola hanson", "Ola Hansen - 120384 12345");
        assert!(score.value() < 100);
        assert!(score.value() >= 65, "got {score}");
    }

    #[test]
    fn unrelated_query_scores_low() {
        let score = partial_ratio("zzzz", "Ola Hansen - 120384 12345");
        assert!(score.value() < 65, "got {score}");
    }

    #[test]
    fn empty_input_scores_zero() {
        assert_eq!(partial_ratio("", "Ola").value(), 0);
        assert_eq!(partial_ratio("Ola", "").value(), 0);
    }

    #[test]
    fn non_ascii_names_are_windowed_by_char() {
        assert_eq!(
            partial_ratio("ødegård", "Åse Ødegård - 010101 33333").value(),
            100
        );
    }

    #[test]
    fn search_filters_and_sorts() {
        let choices = [
            "Kari Nordmann – 250795 67890",
            "Ola Hansen - 120384 12345",
            "Ola Nordmann - 010203 55555",
        ];
        let results = fuzzy_search("ola", choices, 65);
        let labels: Vec<&str> = results.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec!["Ola Hansen - 120384 12345", "Ola Nordmann - 010203 55555"]
        );
        assert!(results.iter().all(|(_, s)| s.value() == 100));
    }
}

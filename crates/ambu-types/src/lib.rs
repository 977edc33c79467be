//! Small validated value types shared by the Ambulance Assistant crates.

/// Errors that can occur when creating validated value types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// A match score outside of 0..=100
    #[error("match score {0} is outside 0..=100")]
    ScoreOutOfRange(i64),
}

/// A string type that guarantees non-empty content.
///
/// Leading and trailing whitespace is checked but **not** removed: patient identifiers are raw
/// search-result labels and must round-trip to the journal service byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl Into<String>) -> Result<Self, TextError> {
        let input = input.into();
        if input.trim().is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(input))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(s).map_err(serde::de::Error::custom)
    }
}

/// Fuzzy match score of a search result, 0 (no match) to 100 (exact substring).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MatchScore(u8);

impl MatchScore {
    pub const MAX: MatchScore = MatchScore(100);

    /// Creates a score, rejecting values above 100.
    pub fn new(value: u8) -> Result<Self, TextError> {
        if value > 100 {
            return Err(TextError::ScoreOutOfRange(i64::from(value)));
        }
        Ok(Self(value))
    }

    /// Rounds a similarity ratio in `0.0..=1.0` to a score, clamping out-of-range input.
    pub fn from_ratio(ratio: f64) -> Self {
        if !ratio.is_finite() {
            return Self(0);
        }
        Self((ratio.clamp(0.0, 1.0) * 100.0).round() as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for MatchScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl serde::Serialize for MatchScore {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for MatchScore {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // The wire contract says "number"; accept floats from lenient servers.
        let raw = f64::deserialize(deserializer)?;
        if !(0.0..=100.0).contains(&raw) {
            return Err(serde::de::Error::custom(TextError::ScoreOutOfRange(
                raw as i64,
            )));
        }
        Ok(MatchScore(raw.round() as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_rejects_blank_input() {
        assert_eq!(NonEmptyText::new("   ").unwrap_err(), TextError::Empty);
        assert_eq!(NonEmptyText::new("").unwrap_err(), TextError::Empty);
    }

    #[test]
    fn non_empty_text_keeps_surrounding_whitespace() {
        let text = NonEmptyText::new(" Ola - 120384 12345 ").expect("valid text");
        assert_eq!(text.as_str(), " Ola - 120384 12345 ");
    }

    #[test]
    fn match_score_bounds() {
        assert!(MatchScore::new(100).is_ok());
        assert_eq!(
            MatchScore::new(101).unwrap_err(),
            TextError::ScoreOutOfRange(101)
        );
        assert_eq!(MatchScore::from_ratio(0.655).value(), 66);
        assert_eq!(MatchScore::from_ratio(2.0), MatchScore::MAX);
        assert_eq!(MatchScore::from_ratio(f64::NAN).value(), 0);
    }

    #[test]
    fn match_score_deserialises_integer_and_float() {
        let a: MatchScore = serde_json::from_str("87").expect("integer score");
        let b: MatchScore = serde_json::from_str("86.6").expect("float score");
        assert_eq!(a.value(), 87);
        assert_eq!(b.value(), 87);
        assert!(serde_json::from_str::<MatchScore>("140").is_err());
    }
}

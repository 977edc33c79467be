//! Search-result label resolution.
//!
//! The patient search returns one composite string per hit:
//!
//! ```text
//! <name> - <DDMMYY> <personalNumber>
//! <name> – <DDMMYY> <personalNumber>      (en dash)
//! ```
//!
//! [`resolve`] is the single place that takes such a label apart. It never fails: anything it
//! cannot make sense of is left empty and reported as a [`ParseDegraded`] note next to the
//! best-effort result.
//!
//! The patient identifier is always the raw label. Personal numbers are not guaranteed to be
//! present, and two patients with an empty personal-number token would otherwise collide.
//!
//! Years stay two-digit (`25.07.95`). Display code downstream relies on that form, so the
//! century is deliberately not guessed here.

/// Accepted name/info separators, hyphen and en dash.
pub const SEPARATORS: [&str; 2] = [" - ", " – "];

const DATE_TOKEN_LEN: usize = 6;

/// A non-fatal problem found while resolving a label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDegraded {
    #[error("label has no name/info separator")]
    MissingSeparator,
    #[error("label contains more than one separator")]
    RepeatedSeparator,
    #[error("label has no date of birth token")]
    MissingDateToken,
    #[error("date token {0:?} is not 6 characters long")]
    DateLength(String),
    #[error("date token {0:?} is not numeric")]
    NonNumericDate(String),
    #[error("label has no personal number token")]
    MissingPersonalNumber,
    #[error("{0} unexpected trailing token(s) after the personal number")]
    ExtraTokens(usize),
}

/// Result of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLabel {
    pub name: String,
    /// `dd.mm.yy`, or empty.
    pub date_of_birth: String,
    /// Personal number token, or empty.
    pub personal_number: String,
    /// The raw label.
    pub identifier: String,
    pub degradations: Vec<ParseDegraded>,
}

impl ResolvedLabel {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

/// Resolves a raw search-result label into name, date of birth and identifier.
pub fn resolve(label: &str) -> ResolvedLabel {
    let mut degradations = Vec::new();

    let Some((name, info)) = split_on_separator(label) else {
        degradations.push(ParseDegraded::MissingSeparator);
        return ResolvedLabel {
            name: label.to_string(),
            date_of_birth: String::new(),
            personal_number: String::new(),
            identifier: label.to_string(),
            degradations,
        };
    };

    if split_on_separator(info).is_some() {
        degradations.push(ParseDegraded::RepeatedSeparator);
    }

    let mut tokens = info.split_whitespace();
    let date_token = tokens.next();
    let personal_number = tokens.next();
    let extra = tokens.count();

    let date_of_birth = match date_token {
        Some(token) => normalise_date(token, &mut degradations),
        None => {
            degradations.push(ParseDegraded::MissingDateToken);
            String::new()
        }
    };
    if personal_number.is_none() {
        degradations.push(ParseDegraded::MissingPersonalNumber);
    }
    if extra > 0 {
        degradations.push(ParseDegraded::ExtraTokens(extra));
    }

    ResolvedLabel {
        name: name.to_string(),
        date_of_birth,
        personal_number: personal_number.unwrap_or_default().to_string(),
        identifier: label.to_string(),
        degradations,
    }
}

/// Name part of a label, as shown in a result list.
pub fn display_name(label: &str) -> &str {
    split_on_separator(label).map_or(label, |(name, _)| name)
}

/// Splits at whichever accepted separator occurs first.
fn split_on_separator(label: &str) -> Option<(&str, &str)> {
    SEPARATORS
        .iter()
        .filter_map(|sep| label.find(sep).map(|at| (at, sep.len())))
        .min_by_key(|(at, _)| *at)
        .map(|(at, len)| (&label[..at], &label[at + len..]))
}

fn normalise_date(token: &str, degradations: &mut Vec<ParseDegraded>) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() != DATE_TOKEN_LEN {
        degradations.push(ParseDegraded::DateLength(token.to_string()));
        return String::new();
    }
    if !chars.iter().all(char::is_ascii_digit) {
        degradations.push(ParseDegraded::NonNumericDate(token.to_string()));
    }

    let day: String = chars[0..2].iter().collect();
    let month: String = chars[2..4].iter().collect();
    let year: String = chars[4..6].iter().collect();
    format!("{day}.{month}.{year}")
}

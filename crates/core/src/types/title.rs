//! Variation title type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`VariationTitle`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VariationTitleError {
    /// The input string is empty or only whitespace.
    #[error("title cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("title must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The title has more option segments than the product can carry.
    #[error("title must have at most {max} slash-separated parts")]
    TooManySegments {
        /// Maximum allowed number of segments.
        max: usize,
    },
    /// One of the slash-separated segments is blank.
    #[error("title parts cannot be empty")]
    EmptySegment,
}

/// A variation title such as `Red / Small / Cotton`.
///
/// Each slash-separated segment is an option value; segments map by
/// position to the `Color`, `Size` and `Material` options.
///
/// ## Constraints
///
/// - Length: 1-255 characters
/// - 1-3 segments, each non-empty after trimming
///
/// ## Examples
///
/// ```
/// use product_bridge_core::VariationTitle;
///
/// let title = VariationTitle::parse("Red/ Small").unwrap();
/// assert_eq!(title.segments(), ["Red", "Small"]);
/// assert_eq!(title.canonical(), "Red / Small");
///
/// assert!(VariationTitle::parse("Red / / Small").is_err());
/// assert!(VariationTitle::parse("A / B / C / D").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct VariationTitle {
    raw: String,
    segments: Vec<String>,
}

impl VariationTitle {
    /// Maximum length of a title.
    pub const MAX_LENGTH: usize = 255;

    /// Maximum number of option segments.
    pub const MAX_SEGMENTS: usize = 3;

    /// Parse a `VariationTitle` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Is longer than 255 characters
    /// - Has more than three segments
    /// - Has a blank segment
    pub fn parse(s: &str) -> Result<Self, VariationTitleError> {
        if s.trim().is_empty() {
            return Err(VariationTitleError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(VariationTitleError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let segments: Vec<String> = s.split('/').map(|part| part.trim().to_owned()).collect();

        if segments.len() > Self::MAX_SEGMENTS {
            return Err(VariationTitleError::TooManySegments {
                max: Self::MAX_SEGMENTS,
            });
        }

        if segments.iter().any(String::is_empty) {
            return Err(VariationTitleError::EmptySegment);
        }

        Ok(Self {
            raw: s.to_owned(),
            segments,
        })
    }

    /// Returns the title exactly as submitted.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the trimmed option values in order.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the title in Shopify's variant title format (`A / B / C`).
    #[must_use]
    pub fn canonical(&self) -> String {
        self.segments.join(" / ")
    }
}

impl fmt::Display for VariationTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl TryFrom<String> for VariationTitle {
    type Error = VariationTitleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VariationTitle> for String {
    fn from(title: VariationTitle) -> Self {
        title.raw
    }
}

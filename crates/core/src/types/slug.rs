//! URL slugs for products and categories.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input string is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9-]`.
    #[error("slug may only contain lowercase letters, digits, and hyphens (found {0:?})")]
    InvalidChar(char),
    /// The input starts or ends with a hyphen, or contains `--`.
    #[error("slug hyphens must separate words")]
    MisplacedHyphen,
}

/// A URL-safe identifier such as `litus-klasik-erkek-gomlek`.
///
/// ## Constraints
///
/// - Length: 1-200 characters
/// - Only ASCII lowercase letters, digits, and single hyphens between words
///
/// ## Examples
///
/// ```
/// use litus_core::Slug;
///
/// assert!(Slug::parse("home-aksesuar").is_ok());
/// assert!(Slug::parse("Home").is_err());
/// assert!(Slug::parse("-trailing-").is_err());
/// assert_eq!(Slug::from_name("Litus Klasik Gömlek").as_str(), "litus-klasik-gomlek");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Maximum length (matches the `VARCHAR(200)` column).
    pub const MAX_LENGTH: usize = 200;

    /// Parse a slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or not in slug form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(SlugError::InvalidChar(c));
        }
        if s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::MisplacedHyphen);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a display name.
    ///
    /// Turkish letters are folded to ASCII, everything else outside
    /// `[a-z0-9]` becomes a word break. Returns `"item"` if nothing survives.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.chars().flat_map(char::to_lowercase) {
            let folded = match c {
                'ç' => 'c',
                'ğ' => 'g',
                'ı' | 'i' => 'i',
                'ö' => 'o',
                'ş' => 's',
                'ü' => 'u',
                other => other,
            };
            if folded.is_ascii_lowercase() || folded.is_ascii_digit() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                out.push(folded);
            } else {
                pending_hyphen = true;
            }
        }

        out.truncate(Self::MAX_LENGTH);
        while out.ends_with('-') {
            out.pop();
        }
        if out.is_empty() {
            out.push_str("item");
        }
        Self(out)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the slug and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Slug::parse("kadin").is_ok());
        assert!(Slug::parse("litus-premium-deniz-mavisi-elbise").is_ok());
        assert!(Slug::parse("set-2").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("Kadin"), Err(SlugError::InvalidChar('K')));
        assert_eq!(Slug::parse("a b"), Err(SlugError::InvalidChar(' ')));
        assert_eq!(Slug::parse("a--b"), Err(SlugError::MisplacedHyphen));
        assert_eq!(Slug::parse("-a"), Err(SlugError::MisplacedHyphen));
        assert!(matches!(
            Slug::parse(&"a".repeat(201)),
            Err(SlugError::TooLong { .. })
        ));
    }

    #[test]
    fn test_from_name_folds_turkish() {
        assert_eq!(
            Slug::from_name("Litus Çocuk Deniz Yıldızı Şapka").as_str(),
            "litus-cocuk-deniz-yildizi-sapka"
        );
        assert_eq!(Slug::from_name("Home & Aksesuar").as_str(), "home-aksesuar");
    }

    #[test]
    fn test_from_name_is_always_valid() {
        for name in ["  ", "!!!", "Ürün -- 2", "ÇĞİÖŞÜ"] {
            let slug = Slug::from_name(name);
            assert!(Slug::parse(slug.as_str()).is_ok(), "{name:?} -> {slug}");
        }
    }

    #[test]
    fn test_serde_validates() {
        assert!(serde_json::from_str::<Slug>("\"erkek\"").is_ok());
        assert!(serde_json::from_str::<Slug>("\"Erkek\"").is_err());
    }
}

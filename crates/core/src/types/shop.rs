//! Shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

const MYSHOPIFY_SUFFIX: &str = ".myshopify.com";
const MAX_SHOP_DOMAIN_LENGTH: usize = 255;

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The domain is not a `*.myshopify.com` host.
    #[error("shop domain must end with {MYSHOPIFY_SUFFIX}")]
    NotMyshopify,
    /// The store handle contains characters other than `a-z`, `0-9`, and `-`.
    #[error("shop domain contains invalid characters")]
    InvalidCharacters,
}

/// A permanent Shopify shop domain such as `acme-store.myshopify.com`.
///
/// Every row in the database is scoped by this value, and it is the key used
/// to find a shop's offline access token.
///
/// ## Constraints
///
/// - Lowercase `<handle>.myshopify.com`
/// - Handle is non-empty and uses only `a-z`, `0-9`, `-`
/// - A leading `https://` and trailing `/` are accepted and stripped
///
/// ## Examples
///
/// ```
/// use bundlewise_core::ShopDomain;
///
/// assert!(ShopDomain::parse("acme.myshopify.com").is_ok());
/// assert!(ShopDomain::parse("https://Acme.myshopify.com/").is_ok());
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("acme.example.com").is_err());
/// assert!(ShopDomain::parse("ac_me.myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Parse and normalise a shop domain.
    ///
    /// # Errors
    ///
    /// Returns [`ShopDomainError`] if the input is not a valid `myshopify.com` domain.
    pub fn parse(input: &str) -> Result<Self, ShopDomainError> {
        let trimmed = input.trim();
        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);
        let host = without_scheme.trim_end_matches('/').to_ascii_lowercase();

        if host.is_empty() {
            return Err(ShopDomainError::Empty);
        }
        if host.len() > MAX_SHOP_DOMAIN_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: MAX_SHOP_DOMAIN_LENGTH,
            });
        }

        let handle = host
            .strip_suffix(MYSHOPIFY_SUFFIX)
            .ok_or(ShopDomainError::NotMyshopify)?;
        if handle.is_empty() {
            return Err(ShopDomainError::NotMyshopify);
        }
        if !handle
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ShopDomainError::InvalidCharacters);
        }

        Ok(Self(host))
    }

    /// Get the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The store handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0
            .strip_suffix(MYSHOPIFY_SUFFIX)
            .unwrap_or(self.0.as_str())
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(shop: ShopDomain) -> Self {
        shop.0
    }
}

impl core::str::FromStr for ShopDomain {
    type Err = ShopDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

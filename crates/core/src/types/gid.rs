//! Shopify global IDs (`gid://shopify/<Kind>/<id>`).
//!
//! Storefront scripts and REST webhooks hand us bare numeric IDs while the
//! Admin GraphQL API speaks GIDs. Everything persisted uses the GID form.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

const GID_PREFIX: &str = "gid://shopify/";

/// Errors that can occur when parsing a [`Gid`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GidError {
    #[error("global id cannot be empty")]
    Empty,
    #[error("unsupported resource type: {0}")]
    UnknownKind(String),
    #[error("expected a {expected} id, got {actual}")]
    WrongKind {
        expected: ResourceKind,
        actual: ResourceKind,
    },
    #[error("invalid numeric id: {0}")]
    InvalidId(String),
}

/// Shopify resource types referenced by Bundlewise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Product,
    ProductVariant,
    InventoryItem,
    Location,
    Market,
    Order,
    LineItem,
    BulkOperation,
}

impl ResourceKind {
    /// The type segment used inside a GID.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "Product",
            Self::ProductVariant => "ProductVariant",
            Self::InventoryItem => "InventoryItem",
            Self::Location => "Location",
            Self::Market => "Market",
            Self::Order => "Order",
            Self::LineItem => "LineItem",
            Self::BulkOperation => "BulkOperation",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = GidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Product" => Ok(Self::Product),
            "ProductVariant" => Ok(Self::ProductVariant),
            "InventoryItem" => Ok(Self::InventoryItem),
            "Location" => Ok(Self::Location),
            "Market" => Ok(Self::Market),
            "Order" => Ok(Self::Order),
            "LineItem" => Ok(Self::LineItem),
            "BulkOperation" => Ok(Self::BulkOperation),
            other => Err(GidError::UnknownKind(other.to_string())),
        }
    }
}

/// A parsed Shopify global ID.
///
/// ```
/// use bundlewise_core::{Gid, ResourceKind};
///
/// let gid = Gid::normalize("123", ResourceKind::Product).unwrap();
/// assert_eq!(gid.to_string(), "gid://shopify/Product/123");
///
/// let same = Gid::normalize("gid://shopify/Product/123", ResourceKind::Product).unwrap();
/// assert_eq!(gid, same);
///
/// assert!(Gid::normalize("gid://shopify/Order/1", ResourceKind::Product).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Gid {
    kind: ResourceKind,
    id: u64,
}

impl Gid {
    /// Build a GID from its parts.
    #[must_use]
    pub const fn new(kind: ResourceKind, id: u64) -> Self {
        Self { kind, id }
    }

    /// Parse a full `gid://shopify/<Kind>/<id>` string.
    ///
    /// Query strings on the GID (`?inventory_item=...`) are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GidError`] if the string is not a GID of a known kind.
    pub fn parse(input: &str) -> Result<Self, GidError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(GidError::Empty);
        }
        let rest = input
            .strip_prefix(GID_PREFIX)
            .ok_or_else(|| GidError::InvalidId(input.to_string()))?;
        let (kind, id) = rest
            .split_once('/')
            .ok_or_else(|| GidError::InvalidId(input.to_string()))?;
        let id = id.split('?').next().unwrap_or_default();

        Ok(Self {
            kind: kind.parse()?,
            id: parse_numeric(id)?,
        })
    }

    /// Accept either a full GID or a bare numeric ID of the expected kind.
    ///
    /// # Errors
    ///
    /// Returns [`GidError::WrongKind`] when a GID of another resource type is given.
    pub fn normalize(input: &str, expected: ResourceKind) -> Result<Self, GidError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(GidError::Empty);
        }
        if input.starts_with(GID_PREFIX) {
            let gid = Self::parse(input)?;
            if gid.kind != expected {
                return Err(GidError::WrongKind {
                    expected,
                    actual: gid.kind,
                });
            }
            return Ok(gid);
        }
        Ok(Self::new(expected, parse_numeric(input)?))
    }

    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The numeric ID (what REST payloads call `id`).
    #[must_use]
    pub const fn numeric_id(&self) -> u64 {
        self.id
    }
}

fn parse_numeric(id: &str) -> Result<u64, GidError> {
    id.parse::<u64>()
        .map_err(|_| GidError::InvalidId(id.to_string()))
}

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{GID_PREFIX}{}/{}", self.kind, self.id)
    }
}

impl FromStr for Gid {
    type Err = GidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Gid {
    type Error = GidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Gid> for String {
    fn from(gid: Gid) -> Self {
        gid.to_string()
    }
}

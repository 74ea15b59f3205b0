//! On-ledger metadata standards: IRC27 for collectibles, IRC30 for native
//! assets. Imported items and assets must comply before they are migrated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("no metadata feature")]
    Missing,

    #[error("metadata is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected standard {expected}, found {found}")]
    WrongStandard { expected: &'static str, found: String },

    #[error("unsupported version {0}")]
    UnsupportedVersion(String),

    #[error("field {0} is invalid")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Irc27Attribute {
    pub trait_type: String,
    pub value: serde_json::Value,
}

/// IRC27 collectible metadata (v1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Irc27 {
    pub standard: String,
    pub version: String,
    /// MIME type of the media at `uri`.
    #[serde(rename = "type")]
    pub media_type: String,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub collection_name: Option<String>,
    /// Royalty shares keyed by address, as fractions of one.
    #[serde(default)]
    pub royalties: BTreeMap<String, f64>,
    #[serde(default)]
    pub issuer_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Irc27Attribute>,
}

impl Irc27 {
    pub fn parse(raw: Option<&str>) -> Result<Self, MetadataError> {
        let raw = raw.ok_or(MetadataError::Missing)?;
        let meta: Irc27 = serde_json::from_str(raw)?;
        meta.check()?;
        Ok(meta)
    }

    fn check(&self) -> Result<(), MetadataError> {
        if self.standard != "IRC27" {
            return Err(MetadataError::WrongStandard {
                expected: "IRC27",
                found: self.standard.clone(),
            });
        }
        if self.version != "v1.0" {
            return Err(MetadataError::UnsupportedVersion(self.version.clone()));
        }
        if self.name.trim().is_empty() {
            return Err(MetadataError::Invalid("name"));
        }
        if self.uri.trim().is_empty() {
            return Err(MetadataError::Invalid("uri"));
        }
        if !self.media_type.contains('/') {
            return Err(MetadataError::Invalid("type"));
        }
        let share: f64 = self.royalties.values().sum();
        if self.royalties.values().any(|v| *v < 0.0) || share > 1.0 {
            return Err(MetadataError::Invalid("royalties"));
        }
        Ok(())
    }

    /// Attributes as a property map, keyed by trait type.
    pub fn properties(&self) -> BTreeMap<String, serde_json::Value> {
        self.attributes
            .iter()
            .map(|a| (a.trait_type.clone(), a.value.clone()))
            .collect()
    }
}

/// IRC30 native asset metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Irc30 {
    pub standard: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Irc30 {
    pub fn parse(raw: Option<&str>) -> Result<Self, MetadataError> {
        let raw = raw.ok_or(MetadataError::Missing)?;
        let meta: Irc30 = serde_json::from_str(raw)?;

        if meta.standard != "IRC30" {
            return Err(MetadataError::WrongStandard {
                expected: "IRC30",
                found: meta.standard,
            });
        }
        if meta.name.trim().is_empty() {
            return Err(MetadataError::Invalid("name"));
        }
        if !(1..=11).contains(&meta.symbol.len()) {
            return Err(MetadataError::Invalid("symbol"));
        }
        Ok(meta)
    }
}

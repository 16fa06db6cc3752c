use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SharedError;

// Country identity = ISO 3166-1 alpha-3 (cca3); alpha-2 is accepted for lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    pub fn parse(s: &str) -> Result<Self, SharedError> {
        let trimmed = s.trim();
        let valid = (2..=3).contains(&trimmed.len())
            && trimmed.bytes().all(|b| b.is_ascii_alphabetic());
        if !valid {
            return Err(SharedError::InvalidCountryCode(s.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CountryCode {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// User identity = UID issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(uid: impl Into<String>) -> Result<Self, SharedError> {
        let uid = uid.into();
        if uid.trim().is_empty() {
            return Err(SharedError::EmptyUserId);
        }
        Ok(Self(uid))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl TryFrom<String> for UserId {
    type Error = SharedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(uid: UserId) -> Self {
        uid.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A country record exactly as served by REST Countries v3.1.
///
/// Only the fields the explorer reads are modelled; everything else in the
/// upstream payload is ignored. Optional upstream fields default to empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Country {
    pub cca3: CountryCode,
    pub name: CountryName,
    #[serde(default)]
    pub population: u64,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub subregion: String,
    #[serde(default)]
    pub capital: Vec<String>,
    #[serde(default)]
    pub flags: Flags,
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
    #[serde(default)]
    pub currencies: BTreeMap<String, Currency>,
    #[serde(default)]
    pub timezones: Vec<String>,
    #[serde(default)]
    pub area: Option<f64>,
    #[serde(default)]
    pub independent: Option<bool>,
    #[serde(default)]
    pub borders: Vec<CountryCode>,
}

impl Country {
    pub fn common_name(&self) -> &str {
        &self.name.common
    }

    pub fn primary_capital(&self) -> Option<&str> {
        self.capital.first().map(String::as_str)
    }

    pub fn speaks(&self, language: &str) -> bool {
        self.languages.values().any(|l| l == language)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CountryName {
    pub common: String,
    #[serde(default)]
    pub official: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Flags {
    #[serde(default)]
    pub png: Option<String>,
    #[serde(default)]
    pub svg: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

impl Flags {
    /// Preferred image URL: SVG when published, PNG otherwise.
    pub fn best(&self) -> Option<&str> {
        self.svg.as_deref().or(self.png.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Currency {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "{} ({})", self.name, symbol),
            None => f.write_str(&self.name),
        }
    }
}

//! A user's favorite countries.

use serde::{Deserialize, Serialize};

use crate::types::CountryCode;

/// Set of favorite country codes.
///
/// Insertion order is kept so the list reads the way the user built it, but
/// membership is what matters: a code is never stored twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CountryCode>", into = "Vec<CountryCode>")]
pub struct Favorites(Vec<CountryCode>);

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `code`. Returns `false` if it was already present.
    pub fn insert(&mut self, code: CountryCode) -> bool {
        if self.contains(&code) {
            return false;
        }
        self.0.push(code);
        true
    }

    /// Remove `code`. Returns `false` if it was not present.
    pub fn remove(&mut self, code: &CountryCode) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c != code);
        self.0.len() != before
    }

    pub fn contains(&self, code: &CountryCode) -> bool {
        self.0.iter().any(|c| c == code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryCode> {
        self.0.iter()
    }
}

impl From<Vec<CountryCode>> for Favorites {
    fn from(codes: Vec<CountryCode>) -> Self {
        codes.into_iter().collect()
    }
}

impl From<Favorites> for Vec<CountryCode> {
    fn from(favorites: Favorites) -> Self {
        favorites.0
    }
}

impl FromIterator<CountryCode> for Favorites {
    fn from_iter<I: IntoIterator<Item = CountryCode>>(iter: I) -> Self {
        let mut favorites = Favorites::new();
        for code in iter {
            favorites.insert(code);
        }
        favorites
    }
}

//! What each screen shows, computed from the fetched collection and the
//! session.  All builders are pure.

use serde::Serialize;

use explorer_shared::filter::{filter_countries, paginate};
use explorer_shared::{
    Country, CountryCode, Facets, Favorites, FilterState, MatchMode, Page, Stats,
};

use crate::session::SignedInUser;

pub const NO_MATCHES: &str = "No matches.";
pub const HOME_LOAD_ERROR: &str = "Error loading countries.";
pub const COUNTRY_NOT_FOUND: &str = "Country not found";
pub const DATA_LOAD_ERROR: &str = "Error loading data";
pub const NO_FAVORITES: &str = "You haven't added any favorites yet";
pub const DELETE_ACCOUNT_FAILED: &str = "Failed to delete account. Please try again.";
pub const SIGN_IN_PROMPT: &str = "Sign in with Google";
pub const DELETE_ACCOUNT_WARNING: &str =
    "Permanently delete your account and all associated data, including your favorite countries.";

/// Summary shown for one country in a grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryCard {
    pub code: CountryCode,
    pub name: String,
    pub population: u64,
    pub region: String,
    pub capital: Option<String>,
    pub flag: Option<String>,
    pub favorite: bool,
}

impl CountryCard {
    pub fn new(country: &Country, favorites: Option<&Favorites>) -> Self {
        Self {
            code: country.cca3.clone(),
            name: country.name.common.clone(),
            population: country.population,
            region: country.region.clone(),
            capital: country.primary_capital().map(str::to_string),
            flag: country.flags.best().map(str::to_string),
            favorite: favorites.map(|f| f.contains(&country.cca3)).unwrap_or(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Home
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub stats: Stats,
    pub facets: Facets,
    /// The state actually applied, with the page after clamping.
    pub filter: FilterState,
    pub filters_active: bool,
    pub results: Page<CountryCard>,
    pub message: Option<&'static str>,
}

impl HomeView {
    pub fn build(
        all: &[Country],
        filter: &FilterState,
        mode: MatchMode,
        page_size: usize,
        favorites: Option<&Favorites>,
    ) -> Self {
        let facets = Facets::derive(all);
        let stats = Stats::from_facets(all, &facets);

        let matches = filter_countries(all, filter, mode);
        let results = paginate(matches, filter.page, page_size)
            .map(|country| CountryCard::new(country, favorites));

        let message = (results.total == 0).then_some(NO_MATCHES);
        let applied = filter.clone().with_page(results.page);

        Self {
            stats,
            facets,
            filters_active: applied.filters_active(),
            filter: applied,
            results,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// Country detail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub code: CountryCode,
    pub name: String,
    pub official_name: String,
    pub flag: Option<String>,
    pub flag_alt: Option<String>,
    pub population: u64,
    pub region: String,
    pub subregion: String,
    pub capital: Option<String>,
    /// Language names joined with ", ".
    pub languages: String,
    /// `Name (symbol)` entries joined with ", ".
    pub currencies: String,
    pub timezones: Vec<String>,
    pub area: Option<f64>,
    pub independent: Option<bool>,
    pub borders: Vec<CountryCode>,
    pub favorite: bool,
}

impl DetailView {
    pub fn new(country: &Country, favorites: Option<&Favorites>) -> Self {
        let languages = country
            .languages
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let currencies = country
            .currencies
            .values()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            code: country.cca3.clone(),
            name: country.name.common.clone(),
            official_name: country.name.official.clone(),
            flag: country.flags.svg.clone().or_else(|| country.flags.png.clone()),
            flag_alt: country.flags.alt.clone(),
            population: country.population,
            region: country.region.clone(),
            subregion: country.subregion.clone(),
            capital: country.primary_capital().map(str::to_string),
            languages,
            currencies,
            timezones: country.timezones.clone(),
            area: country.area,
            independent: country.independent,
            borders: country.borders.clone(),
            favorite: favorites.map(|f| f.contains(&country.cca3)).unwrap_or(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Favorites
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoritesView {
    pub countries: Vec<CountryCard>,
    pub message: Option<&'static str>,
}

impl FavoritesView {
    /// The user's favorite countries, in collection order.
    pub fn build(all: &[Country], user: &SignedInUser) -> Self {
        let countries: Vec<CountryCard> = all
            .iter()
            .filter(|c| user.favorites.contains(&c.cca3))
            .map(|c| CountryCard::new(c, Some(&user.favorites)))
            .collect();

        let message = countries.is_empty().then_some(NO_FAVORITES);
        Self { countries, message }
    }
}

// ---------------------------------------------------------------------------
// Login / delete account
// ---------------------------------------------------------------------------

/// The login screen: who is signed in, or the sign-in prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginView {
    pub user: Option<SignedInUser>,
    pub prompt: Option<&'static str>,
}

impl LoginView {
    pub fn new(user: Option<&SignedInUser>) -> Self {
        Self {
            user: user.cloned(),
            prompt: user.is_none().then_some(SIGN_IN_PROMPT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteAccountView {
    pub uid: String,
    pub display_name: Option<String>,
    pub favorites: usize,
    pub warning: &'static str,
}

impl DeleteAccountView {
    pub fn new(user: &SignedInUser) -> Self {
        Self {
            uid: user.uid.as_str().to_string(),
            display_name: user.display_name.clone(),
            favorites: user.favorites.len(),
            warning: DELETE_ACCOUNT_WARNING,
        }
    }
}

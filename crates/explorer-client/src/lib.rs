//! # explorer-client
//!
//! Application core of Country Explorer.
//!
//! - [`api`]: REST Countries data client
//! - [`fetch`]: loading / failed / ready wrapper around one-shot requests
//! - [`identity`] and [`favorites`]: seams to the identity provider and the
//!   per-user favorites document
//! - [`session`]: the signed-in user and their favorites, passed explicitly
//!   to whoever needs it
//! - [`pages`] and [`routes`]: what each screen shows and which screen a
//!   path resolves to

pub mod api;
pub mod favorites;
pub mod fetch;
pub mod identity;
pub mod pages;
pub mod routes;
pub mod session;

pub use api::{ApiConfig, ApiError, CountryApi, RestCountriesClient, LISTING_FIELDS};
pub use favorites::{FavoritesError, FavoritesStore, MemoryFavoritesStore, SqliteFavoritesStore};
pub use fetch::FetchState;
pub use identity::{AuthUser, Credential, IdentityError, IdentityProvider, LocalIdentityProvider};
pub use session::{Session, SessionError, SignedInUser};

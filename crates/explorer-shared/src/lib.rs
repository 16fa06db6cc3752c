//! # explorer-shared
//!
//! Domain types and the pure derivations shared by every other crate:
//! the country record as served by REST Countries, user favorites, and the
//! search / facet / pagination engine behind the home listing.
//!
//! Nothing in here performs I/O.

pub mod constants;
pub mod error;
pub mod facets;
pub mod favorites;
pub mod filter;
pub mod types;

pub use error::SharedError;
pub use facets::{Facets, Stats};
pub use favorites::Favorites;
pub use filter::{Facet, FilterState, MatchMode, Page};
pub use types::{Country, CountryCode, UserId};

//! Client route table: which screen a path shows, and where a path the user
//! may not see redirects to.

use std::fmt;

use serde::Serialize;

use explorer_shared::CountryCode;

pub const HOME: &str = "/";
pub const LOGIN: &str = "/login";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", content = "code", rename_all = "snake_case")]
pub enum Route {
    Home,
    Country(CountryCode),
    Login,
    Favorites,
    DeleteAccount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(&'static str),
}

impl Route {
    /// Match a path (without query string). Trailing slashes are ignored.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Home),
            ["country", code] => CountryCode::parse(code).ok().map(Route::Country),
            ["login"] => Some(Route::Login),
            ["favorites"] => Some(Route::Favorites),
            ["delete-account"] => Some(Route::DeleteAccount),
            _ => None,
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Favorites | Route::DeleteAccount)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str(HOME),
            Route::Country(code) => write!(f, "/country/{code}"),
            Route::Login => f.write_str(LOGIN),
            Route::Favorites => f.write_str("/favorites"),
            Route::DeleteAccount => f.write_str("/delete-account"),
        }
    }
}

/// Resolve `path` for a visitor. Unknown paths go home; protected pages send
/// signed-out visitors to the login page.
pub fn resolve(path: &str, signed_in: bool) -> Resolution {
    match Route::parse(path) {
        None => Resolution::Redirect(HOME),
        Some(route) if route.requires_auth() && !signed_in => Resolution::Redirect(LOGIN),
        Some(route) => Resolution::Render(route),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_routes() {
        assert_eq!(Route::parse("/"), Some(Route::Home));
        assert_eq!(Route::parse(""), Some(Route::Home));
        assert_eq!(Route::parse("/?search=fr&page=2"), Some(Route::Home));
        assert_eq!(
            Route::parse("/country/fra/"),
            Some(Route::Country(CountryCode::parse("FRA").unwrap()))
        );
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(Route::parse("/favorites"), Some(Route::Favorites));
        assert_eq!(Route::parse("/delete-account"), Some(Route::DeleteAccount));
    }

    #[test]
    fn unknown_paths_redirect_home() {
        assert_eq!(resolve("/nope", true), Resolution::Redirect(HOME));
        assert_eq!(resolve("/country/12345", false), Resolution::Redirect(HOME));
        assert_eq!(resolve("/country", false), Resolution::Redirect(HOME));
    }

    #[test]
    fn protected_routes_need_sign_in() {
        assert_eq!(resolve("/favorites", false), Resolution::Redirect(LOGIN));
        assert_eq!(resolve("/delete-account", false), Resolution::Redirect(LOGIN));
        assert_eq!(
            resolve("/favorites", true),
            Resolution::Render(Route::Favorites)
        );
        assert_eq!(resolve("/login", false), Resolution::Render(Route::Login));
    }

    #[test]
    fn display_round_trips() {
        for path in ["/", "/country/JPN", "/login", "/favorites", "/delete-account"] {
            assert_eq!(Route::parse(path).unwrap().to_string(), path);
        }
    }
}

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use explorer_client::pages::{
    DeleteAccountView, DetailView, FavoritesView, HomeView, LoginView, COUNTRY_NOT_FOUND,
    DATA_LOAD_ERROR, HOME_LOAD_ERROR,
};
use explorer_client::routes::{self, Resolution, HOME, LOGIN};
use explorer_client::{Credential, FetchState, SignedInUser};
use explorer_shared::filter::FilterParams;
use explorer_shared::{CountryCode, Favorites, FilterState};

use crate::catalog::CountryCatalog;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::sessions::{CurrentSession, MaybeSession, SessionRegistry};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CountryCatalog>,
    pub sessions: SessionRegistry,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route(HOME, get(home_page))
        .route("/country/:code", get(country_page))
        .route("/favorites", get(favorites_page))
        .route(LOGIN, get(login_page))
        .route("/delete-account", get(delete_account_page))
        .route("/api/login", post(api_login))
        .route("/api/logout", post(api_logout))
        .route("/api/me", get(api_me))
        .route("/api/favorites/:code", put(favorite_add).delete(favorite_remove))
        .route("/api/account", delete(account_delete))
        .fallback(fallback)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct LoginResponse {
    token: Uuid,
    user: SignedInUser,
}

#[derive(Serialize)]
struct FavoriteResponse {
    code: CountryCode,
    favorite: bool,
    changed: bool,
    favorites: Favorites,
}

#[derive(Deserialize)]
struct DeleteAccountRequest {
    id_token: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Status for a page body: the page itself renders the failure, the status
/// only tells non-browser callers something went wrong upstream.
fn page_status<T>(state: &FetchState<T>) -> StatusCode {
    if state.error().is_some() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::OK
    }
}

// ─── Pages ───

async fn home_page(
    State(state): State<AppState>,
    session: MaybeSession,
    Query(params): Query<FilterParams>,
) -> (StatusCode, Json<FetchState<HomeView>>) {
    let filter = FilterState::from_params(&params);
    let favorites = session.favorites().await;

    let view = FetchState::load(state.catalog.all())
        .await
        .with_failure_message(HOME_LOAD_ERROR)
        .map(|all| {
            HomeView::build(
                &all,
                &filter,
                state.config.search_mode,
                state.config.page_size,
                favorites.as_ref(),
            )
        });

    (page_status(&view), Json(view))
}

async fn country_page(
    State(state): State<AppState>,
    session: MaybeSession,
    Path(code): Path<String>,
) -> Response {
    let Ok(code) = CountryCode::parse(&code) else {
        return Redirect::temporary(HOME).into_response();
    };
    let favorites = session.favorites().await;

    let (status, view) = match state.catalog.by_code(&code).await {
        Ok(Some(country)) => (
            StatusCode::OK,
            FetchState::Ready {
                data: DetailView::new(&country, favorites.as_ref()),
            },
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            FetchState::Failed {
                message: COUNTRY_NOT_FOUND.to_string(),
            },
        ),
        Err(e) => {
            warn!(code = %code, error = %e, "Country lookup failed");
            (
                StatusCode::BAD_GATEWAY,
                FetchState::Failed {
                    message: DATA_LOAD_ERROR.to_string(),
                },
            )
        }
    };

    (status, Json(view)).into_response()
}

async fn favorites_page(State(state): State<AppState>, session: MaybeSession) -> Response {
    let Some(user) = session.user().await else {
        return Redirect::temporary(LOGIN).into_response();
    };

    let view = FetchState::load(state.catalog.all())
        .await
        .with_failure_message(DATA_LOAD_ERROR)
        .map(|all| FavoritesView::build(&all, &user));

    (page_status(&view), Json(view)).into_response()
}

async fn login_page(session: MaybeSession) -> Json<LoginView> {
    Json(LoginView::new(session.user().await.as_ref()))
}

async fn delete_account_page(session: MaybeSession) -> Response {
    match session.user().await {
        Some(user) => Json(DeleteAccountView::new(&user)).into_response(),
        None => Redirect::temporary(LOGIN).into_response(),
    }
}

// ─── Session API ───

async fn api_login(
    State(state): State<AppState>,
    Json(credential): Json<Credential>,
) -> Result<Json<LoginResponse>, ServerError> {
    let (token, user) = state.sessions.login(&credential).await?;
    Ok(Json(LoginResponse { token, user }))
}

async fn api_logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<StatusCode, ServerError> {
    current.session.lock().await.logout().await?;
    state.sessions.remove(&current.token).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn api_me(current: CurrentSession) -> Result<Json<SignedInUser>, ServerError> {
    current.user().await.map(Json).ok_or(ServerError::Unauthorized)
}

fn parse_code(raw: &str) -> Result<CountryCode, ServerError> {
    CountryCode::parse(raw).map_err(|e| ServerError::BadRequest(e.to_string()))
}

async fn favorite_add(
    current: CurrentSession,
    Path(code): Path<String>,
) -> Result<Json<FavoriteResponse>, ServerError> {
    let code = parse_code(&code)?;
    let mut session = current.session.lock().await;
    let changed = session.add_favorite(&code).await?;
    let favorites = session.favorites().cloned().ok_or(ServerError::Unauthorized)?;

    Ok(Json(FavoriteResponse {
        code,
        favorite: true,
        changed,
        favorites,
    }))
}

async fn favorite_remove(
    current: CurrentSession,
    Path(code): Path<String>,
) -> Result<Json<FavoriteResponse>, ServerError> {
    let code = parse_code(&code)?;
    let mut session = current.session.lock().await;
    let changed = session.remove_favorite(&code).await?;
    let favorites = session.favorites().cloned().ok_or(ServerError::Unauthorized)?;

    Ok(Json(FavoriteResponse {
        code,
        favorite: false,
        changed,
        favorites,
    }))
}

async fn account_delete(
    State(state): State<AppState>,
    current: CurrentSession,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let uid = current
        .user()
        .await
        .map(|u| u.uid)
        .ok_or(ServerError::Unauthorized)?;
    current
        .session
        .lock()
        .await
        .delete_account(&Credential::new(req.id_token))
        .await
        .map_err(|_| ServerError::AccountDeletion)?;

    // Covers the caller's token and any other sign-in of the same account.
    state.sessions.remove_user(&uid).await;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ─── Fallback ───

/// Unknown API paths are 404s. Any other path is redirected: home when it
/// names no screen, to the login page when the screen needs a signed-in
/// user, or to the canonical form of a screen it spells loosely.
async fn fallback(session: MaybeSession, uri: Uri) -> Response {
    let path = uri.path();
    if path.starts_with("/api/") {
        return ServerError::NotFound(format!("No such endpoint: {path}")).into_response();
    }

    match routes::resolve(path, session.0.is_some()) {
        Resolution::Redirect(target) => Redirect::temporary(target).into_response(),
        Resolution::Render(route) => Redirect::temporary(&route.to_string()).into_response(),
    }
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use explorer_client::{LocalIdentityProvider, SqliteFavoritesStore};
    use explorer_store::Database;

    use super::*;
    use crate::catalog::stub::{country, StubApi};

    fn app_with(api: Arc<StubApi>) -> Router {
        let store = SqliteFavoritesStore::new(Database::open_in_memory().unwrap());
        let state = AppState {
            catalog: Arc::new(CountryCatalog::new(api, Duration::from_secs(60))),
            sessions: SessionRegistry::new(
                Arc::new(LocalIdentityProvider::new()),
                Arc::new(store),
            ),
            config: Arc::new(ServerConfig::default()),
        };
        build_router(state)
    }

    fn stub() -> Arc<StubApi> {
        Arc::new(StubApi::with(vec![
            country("USA", "United States", "Americas", "English"),
            country("FRA", "France", "Europe", "French"),
            country("DEU", "Germany", "Europe", "German"),
            country("PER", "Peru", "Americas", "Spanish"),
        ]))
    }

    fn app() -> Router {
        app_with(stub())
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value, Option<String>) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let location = res
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json, location)
    }

    async fn login(app: &Router, uid: &str) -> String {
        let (status, body, _) = send(
            app,
            Method::POST,
            "/api/login",
            None,
            Some(json!({"id_token": uid, "display_name": "Ada"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    fn names(view: &Value) -> Vec<&str> {
        view["data"]["results"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body, _) = send(&app(), Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_home_lists_everything() {
        let (status, body, _) = send(&app(), Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "ready");
        assert_eq!(body["data"]["stats"]["countries"], 4);
        assert_eq!(body["data"]["facets"]["regions"], json!(["Americas", "Europe"]));
        assert_eq!(body["data"]["filters_active"], false);
        assert_eq!(names(&body).len(), 4);
    }

    #[tokio::test]
    async fn test_home_filters_from_query() {
        let app = app();
        let (_, body, _) = send(&app, Method::GET, "/?region=Europe&search=ge", None, None).await;
        assert_eq!(names(&body), vec!["Germany"]);
        assert_eq!(body["data"]["filters_active"], true);

        let (_, body, _) =
            send(&app, Method::GET, "/?language=Spanish&page=9", None, None).await;
        assert_eq!(names(&body), vec!["Peru"]);
        assert_eq!(body["data"]["filter"]["page"], 1);

        let (_, body, _) = send(&app, Method::GET, "/?search=zz", None, None).await;
        assert_eq!(body["data"]["message"], "No matches.");
    }

    #[tokio::test]
    async fn test_home_upstream_failure() {
        let api = stub();
        api.down.store(true, Ordering::SeqCst);
        let (status, body, _) = send(&app_with(api), Method::GET, "/", None, None).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["state"], "failed");
        assert_eq!(body["message"], "Error loading countries.");
    }

    #[tokio::test]
    async fn test_country_page() {
        let app = app();
        let (status, body, _) = send(&app, Method::GET, "/country/fra", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "France");
        assert_eq!(body["data"]["languages"], "French");

        let (status, body, _) = send(&app, Method::GET, "/country/XYZ", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Country not found");

        let (status, _, location) =
            send(&app, Method::GET, "/country/not-a-code", None, None).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location.as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn test_protected_pages_redirect_to_login() {
        let app = app();
        for path in ["/favorites", "/delete-account"] {
            let (status, _, location) = send(&app, Method::GET, path, None, None).await;
            assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
            assert_eq!(location.as_deref(), Some("/login"));
        }

        let (_, body, _) = send(&app, Method::GET, "/login", None, None).await;
        assert_eq!(body["prompt"], "Sign in with Google");
        assert_eq!(body["user"], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_paths() {
        let app = app();
        let (status, _, location) = send(&app, Method::GET, "/nowhere", None, None).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location.as_deref(), Some("/"));

        let (_, _, location) = send(&app, Method::GET, "/favorites/", None, None).await;
        assert_eq!(location.as_deref(), Some("/login"));

        let (status, body, _) = send(&app, Method::GET, "/api/nowhere", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("/api/nowhere"));
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let app = app();
        let token = login(&app, "uid-1").await;

        let (status, body, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["uid"], "uid-1");
        assert_eq!(body["display_name"], "Ada");
        assert_eq!(body["favorites"], json!([]));

        let (_, body, _) = send(&app, Method::GET, "/login", Some(&token), None).await;
        assert_eq!(body["prompt"], Value::Null);

        let (status, _, _) = send(&app, Method::GET, "/api/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_login() {
        let (status, body, _) = send(
            &app(),
            Method::POST,
            "/api/login",
            None,
            Some(json!({"id_token": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credential");
    }

    #[tokio::test]
    async fn test_favorites_flow() {
        let app = app();
        let token = login(&app, "uid-1").await;

        let (status, body, _) =
            send(&app, Method::PUT, "/api/favorites/fra", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert_eq!(body["favorites"], json!(["FRA"]));

        let (_, body, _) = send(&app, Method::PUT, "/api/favorites/FRA", Some(&token), None).await;
        assert_eq!(body["changed"], false);

        send(&app, Method::PUT, "/api/favorites/USA", Some(&token), None).await;

        let (status, body, _) = send(&app, Method::GET, "/favorites", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let favs: Vec<&str> = body["data"]["countries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["code"].as_str().unwrap())
            .collect();
        assert_eq!(favs, vec!["USA", "FRA"]);

        let (_, body, _) = send(&app, Method::GET, "/", Some(&token), None).await;
        let fra = body["data"]["results"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["code"] == "FRA")
            .unwrap()
            .clone();
        assert_eq!(fra["favorite"], true);

        let (_, body, _) =
            send(&app, Method::DELETE, "/api/favorites/FRA", Some(&token), None).await;
        assert_eq!(body["changed"], true);
        assert_eq!(body["favorites"], json!(["USA"]));
    }

    #[tokio::test]
    async fn test_favorites_need_session() {
        let app = app();
        let (status, _, _) = send(&app, Method::PUT, "/api/favorites/FRA", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = login(&app, "uid-1").await;
        let (status, _, _) =
            send(&app, Method::PUT, "/api/favorites/12", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_favorites_survive_relogin() {
        let app = app();
        let token = login(&app, "uid-1").await;
        send(&app, Method::PUT, "/api/favorites/JPN", Some(&token), None).await;

        let (status, _, _) = send(&app, Method::POST, "/api/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = login(&app, "uid-1").await;
        let (_, body, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(body["favorites"], json!(["JPN"]));
    }

    #[tokio::test]
    async fn test_delete_account() {
        let app = app();
        let token = login(&app, "uid-1").await;
        send(&app, Method::PUT, "/api/favorites/FRA", Some(&token), None).await;

        let (_, body, _) = send(&app, Method::GET, "/delete-account", Some(&token), None).await;
        assert_eq!(body["favorites"], 1);

        let (status, body, _) = send(
            &app,
            Method::DELETE,
            "/api/account",
            Some(&token),
            Some(json!({"id_token": "someone-else"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to delete account. Please try again.");
        let (status, _, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body, _) = send(
            &app,
            Method::DELETE,
            "/api/account",
            Some(&token),
            Some(json!({"id_token": "uid-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], true);

        let (status, _, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = login(&app, "uid-1").await;
        let (_, body, _) = send(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(body["favorites"], json!([]));
    }

    #[tokio::test]
    async fn test_delete_account_signs_out_every_session() {
        let app = app();
        let laptop = login(&app, "uid-1").await;
        let phone = login(&app, "uid-1").await;
        let other = login(&app, "uid-2").await;

        let (status, _, _) = send(
            &app,
            Method::DELETE,
            "/api/account",
            Some(&laptop),
            Some(json!({"id_token": "uid-1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, _) = send(&app, Method::GET, "/api/me", Some(&phone), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _, location) =
            send(&app, Method::GET, "/delete-account", Some(&phone), None).await;
        assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location.as_deref(), Some("/login"));
        let (status, _, _) =
            send(&app, Method::PUT, "/api/favorites/FRA", Some(&phone), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(&app, Method::GET, "/api/me", Some(&other), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}

//! Shared-password session gate and its extractor.

use axum::{
    extract::{FromRequestParts, Query},
    http::{request::Parts, Method, Uri},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::collections::HashMap;

use crate::error::warning_redirect;
use crate::session::{Session, SessionStore};
use crate::state::AppState;

/// Page explaining that the app needs cookies
pub const COOKIES_PAGE: &str = "/cookies.html";

/// Query parameter carrying the shared password
pub const PASSWORD_PARAM: &str = "pwd";

/// Marker appended to the URI after a session is issued
const SESSION_PARAM: &str = "session";
const SESSION_START: &str = "start";

/// Authenticated session.
/// Add this as a handler parameter to require the shared password.
pub struct Authorized(pub Session);

/// Why a request did not get through the gate
#[derive(Debug)]
pub enum AuthRejection {
    /// A session was just issued; revisit `location` with the new cookie
    SessionStarted { jar: CookieJar, location: String },
    /// The browser didn't send back the cookie issued on the previous hop
    CookiesRequired,
    /// Session is live but the password is missing or wrong
    Unauthorised,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::SessionStarted { jar, location } => {
                (jar, Redirect::to(&location)).into_response()
            }
            Self::CookiesRequired => Redirect::to(COOKIES_PAGE).into_response(),
            Self::Unauthorised => warning_redirect("Unauthorised").into_response(),
        }
    }
}

/// Resolve the request's session and check it is authenticated.
///
/// Without a session, a new one is started and the client is sent back to
/// the same URI marked with `session=start` (to `/` for anything other than
/// GET or HEAD, since the redirect turns into a GET); if that marker is
/// already present the cookie did not stick and the client is sent to the
/// cookies page instead. A live but unauthenticated session is unlocked by a
/// `pwd` query parameter matching `password`.
///
/// Only the request path is logged: the query may carry the password.
pub fn check_access(
    store: &SessionStore,
    jar: CookieJar,
    method: &Method,
    uri: &Uri,
    password: &str,
) -> Result<Session, AuthRejection> {
    let query = query_params(uri);

    let Some(session) = store.get(&jar) else {
        if query.get(SESSION_PARAM).map(String::as_str) == Some(SESSION_START) {
            tracing::info!(path = uri.path(), "Session cookie was not returned");
            return Err(AuthRejection::CookiesRequired);
        }
        let (jar, id) = store.start(jar);
        tracing::info!(
            session = id.prefix(),
            %method,
            path = uri.path(),
            "Started session"
        );
        let location = if *method == Method::GET || *method == Method::HEAD {
            with_session_start(uri)
        } else {
            with_session_start(&Uri::from_static("/"))
        };
        return Err(AuthRejection::SessionStarted { jar, location });
    };

    if session.is_authenticated() {
        return Ok(session);
    }

    tracing::debug!(
        session = session.id().prefix(),
        path = uri.path(),
        "Session not authenticated"
    );
    match query.get(PASSWORD_PARAM) {
        Some(supplied) if supplied == password => {
            session.authenticate();
            tracing::info!(session = session.id().prefix(), "Password matched");
            Ok(session)
        }
        _ => {
            tracing::warn!(session = session.id().prefix(), path = uri.path(), "Unauthorised");
            Err(AuthRejection::Unauthorised)
        }
    }
}

impl FromRequestParts<AppState> for Authorized {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        check_access(&state.sessions, jar, &parts.method, &parts.uri, &state.password)
            .map(Authorized)
    }
}

fn query_params(uri: &Uri) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(params)| params)
        .unwrap_or_default()
}

fn with_session_start(uri: &Uri) -> String {
    match uri.query() {
        Some(query) if !query.is_empty() => {
            format!("{}?{}&{}={}", uri.path(), query, SESSION_PARAM, SESSION_START)
        }
        _ => format!("{}?{}={}", uri.path(), SESSION_PARAM, SESSION_START),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{SessionConfig, SESSION_COOKIE_NAME};
    use crate::testing::capture_logs;
    use axum::http::{header::LOCATION, StatusCode};
    use axum_extra::extract::cookie::Cookie;

    const PASSWORD: &str = "open sesame";

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    fn check_get(
        store: &SessionStore,
        jar: CookieJar,
        uri: &Uri,
        password: &str,
    ) -> Result<Session, AuthRejection> {
        check_access(store, jar, &Method::GET, uri, password)
    }

    fn jar_for(session_id: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(SESSION_COOKIE_NAME, session_id.to_string()))
    }

    #[test]
    fn test_no_session_starts_one() {
        let store = SessionStore::new(SessionConfig::default());
        let result = check_get(&store, CookieJar::new(), &uri("/edit?id=1"), PASSWORD);

        let Err(AuthRejection::SessionStarted { jar, location }) = result else {
            panic!("expected a new session");
        };
        assert_eq!(location, "/edit?id=1&session=start");
        let cookie = jar.get(SESSION_COOKIE_NAME).unwrap();
        assert!(store.contains(cookie.value()));
    }

    #[test]
    fn test_session_start_marker_without_query() {
        assert_eq!(with_session_start(&uri("/")), "/?session=start");
        assert_eq!(with_session_start(&uri("/?")), "/?session=start");
    }

    #[test]
    fn test_cookie_not_returned() {
        let store = SessionStore::new(SessionConfig::default());
        let result = check_get(&store, CookieJar::new(), &uri("/?session=start"), PASSWORD);
        assert!(matches!(result, Err(AuthRejection::CookiesRequired)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_wrong_password_is_unauthorised() {
        let store = SessionStore::new(SessionConfig::default());
        let (_, id) = store.start(CookieJar::new());

        let result = check_get(&store, jar_for(id.as_str()), &uri("/?pwd=nope"), PASSWORD);
        assert!(matches!(result, Err(AuthRejection::Unauthorised)));

        let result = check_get(&store, jar_for(id.as_str()), &uri("/"), PASSWORD);
        assert!(matches!(result, Err(AuthRejection::Unauthorised)));
    }

    #[test]
    fn test_password_unlocks_session() {
        let store = SessionStore::new(SessionConfig::default());
        let (_, id) = store.start(CookieJar::new());

        let session =
            check_get(&store, jar_for(id.as_str()), &uri("/?pwd=open%20sesame"), PASSWORD).unwrap();
        assert!(session.is_authenticated());

        // Later requests need no password
        let session = check_get(&store, jar_for(id.as_str()), &uri("/"), PASSWORD).unwrap();
        assert_eq!(session.id(), &id);
    }

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::CookiesRequired.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], COOKIES_PAGE);

        let response = AuthRejection::Unauthorised.into_response();
        assert_eq!(response.headers()[LOCATION], "/warning?text=Unauthorised");

        let store = SessionStore::new(SessionConfig::default());
        let (jar, _) = store.start(CookieJar::new());
        let response = AuthRejection::SessionStarted {
            jar,
            location: "/?session=start".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let set_cookie = response.headers()["set-cookie"].to_str().unwrap();
        assert!(set_cookie.starts_with("Session="));
        assert!(set_cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_form_post_without_session_restarts_at_root() {
        let store = SessionStore::new(SessionConfig::default());
        let result = check_access(
            &store,
            CookieJar::new(),
            &Method::POST,
            &uri("/add?id=42"),
            PASSWORD,
        );

        let Err(AuthRejection::SessionStarted { jar, location }) = result else {
            panic!("expected a new session");
        };
        assert_eq!(location, "/?session=start");
        assert!(jar.get(SESSION_COOKIE_NAME).is_some());
    }

    #[test]
    fn test_password_never_logged() {
        let store = SessionStore::new(SessionConfig::default());
        let (_, id) = store.start(CookieJar::new());
        let secret = "TopSecret42";

        let logs = capture_logs(|| {
            let _ = check_get(&store, CookieJar::new(), &uri("/?pwd=TopSecret42"), secret);
            let _ = check_get(&store, jar_for(id.as_str()), &uri("/?pwd=wrong-guess"), secret);
            let session =
                check_get(&store, jar_for(id.as_str()), &uri("/edit?pwd=TopSecret42"), secret);
            assert!(session.is_ok());
        });

        assert!(logs.contains("Started session"));
        assert!(logs.contains("Unauthorised"));
        assert!(logs.contains("Password matched"));
        assert!(logs.contains("/edit"));
        assert!(!logs.contains(secret));
        assert!(!logs.contains("wrong-guess"));
        assert!(!logs.contains(id.as_str()));
    }
}

use crate::web::AppState;
use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::extract::FromRequestParts;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sesion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

impl fmt::Display for FlashLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashLevel::Success => write!(f, "success"),
            FlashLevel::Error => write!(f, "error"),
        }
    }
}

/// One-shot notification: queued in the session, rendered on the next page,
/// then discarded.
#[derive(Debug, Clone)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
struct SessionData {
    username: Option<String>,
    flash: Vec<FlashMessage>,
}

/// In-process session state keyed by a random token; the token travels in a
/// signed cookie. Sessions exist for anonymous visitors too — `username`
/// marks authentication, exactly as a flash-style session dict would.
pub struct SessionStore {
    secret: String,
    sessions: Mutex<HashMap<Uuid, SessionData>>,
}

impl SessionStore {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sign(&self, token: Uuid) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"|");
        hasher.update(token.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Serialized cookie value for a token: `<token>.<signature>`.
    fn cookie_value(&self, token: Uuid) -> String {
        format!("{}.{}", token, self.sign(token))
    }

    /// Parse and verify a raw cookie value back into a token.
    fn verify(&self, value: &str) -> Option<Uuid> {
        let (token, signature) = value.split_once('.')?;
        let token = Uuid::parse_str(token).ok()?;
        if self.sign(token) == signature {
            Some(token)
        } else {
            debug!("Rejected session cookie with bad signature");
            None
        }
    }

    /// Resolve the session for a request: reuse a verified token, otherwise
    /// start a fresh session. The bool reports whether a Set-Cookie is owed.
    pub fn resolve(self: &Arc<Self>, headers: &HeaderMap) -> (SessionHandle, bool) {
        if let Some(token) = cookie_from_headers(headers, SESSION_COOKIE)
            .and_then(|value| self.verify(&value))
        {
            let mut sessions = self.sessions.lock().unwrap();
            // A verified token missing from the map (e.g. after a restart)
            // gets an empty session under the same token.
            sessions.entry(token).or_default();
            return (
                SessionHandle {
                    token,
                    store: Arc::clone(self),
                },
                false,
            );
        }

        let token = Uuid::new_v4();
        self.sessions
            .lock()
            .unwrap()
            .insert(token, SessionData::default());
        debug!("Started session {}", token);
        (
            SessionHandle {
                token,
                store: Arc::clone(self),
            },
            true,
        )
    }
}

fn cookie_from_headers(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Handle to one visitor's session, shared through request extensions.
#[derive(Clone)]
pub struct SessionHandle {
    token: Uuid,
    store: Arc<SessionStore>,
}

impl SessionHandle {
    pub fn username(&self) -> Option<String> {
        let sessions = self.store.sessions.lock().unwrap();
        sessions.get(&self.token).and_then(|s| s.username.clone())
    }

    pub fn set_username(&self, username: &str) {
        let mut sessions = self.store.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(&self.token) {
            session.username = Some(username.to_string());
        }
    }

    pub fn clear_username(&self) {
        let mut sessions = self.store.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(&self.token) {
            session.username = None;
        }
    }

    pub fn flash(&self, level: FlashLevel, message: impl Into<String>) {
        let mut sessions = self.store.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(&self.token) {
            session.flash.push(FlashMessage {
                level,
                message: message.into(),
            });
        }
    }

    /// Drain pending flash messages; each shows exactly once.
    pub fn take_flashes(&self) -> Vec<FlashMessage> {
        let mut sessions = self.store.sessions.lock().unwrap();
        sessions
            .get_mut(&self.token)
            .map(|s| std::mem::take(&mut s.flash))
            .unwrap_or_default()
    }

    fn set_cookie_header(&self) -> String {
        format!(
            "{}={}; Path=/; HttpOnly",
            SESSION_COOKIE,
            self.store.cookie_value(self.token)
        )
    }
}

/// Resolves the session on every request and exposes it through request
/// extensions; fresh sessions get their cookie appended on the way out.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let (session, is_new) = state.sessions.resolve(request.headers());
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if is_new {
        if let Ok(value) = session.set_cookie_header().parse() {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
    response
}

/// Access guard for protected handlers. Unauthenticated requests are turned
/// away with a flash and a redirect to the login page before the handler
/// body runs — the original computed this redirect and then ignored it; here
/// it actually gates the request (see DESIGN.md).
pub struct CurrentUser {
    pub username: String,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or_else(|| Redirect::to("/login").into_response())?;

        match session.username() {
            Some(username) => Ok(CurrentUser { username }),
            None => {
                session.flash(
                    FlashLevel::Error,
                    "Debes iniciar sesión para acceder a esta página",
                );
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}

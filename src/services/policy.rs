use crate::domain::models::{Role, Session, View};
use crate::services::session::SessionStore;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Login,
    Home,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Home => "home",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(Route),
}

/// What a view demands of the session before it may render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Protected(Option<Role>),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum GateError {
    #[error("login required")]
    LoginRequired,
    #[error("not permitted for this account (requires {required})")]
    Forbidden { required: Role },
}

/// Decision table, first match wins:
/// no token → login; role mismatch → home; otherwise allow.
pub fn authorize(required: Option<Role>, session: &Session) -> Decision {
    if !session.is_authenticated() {
        return Decision::RedirectTo(Route::Login);
    }
    match required {
        Some(role) if session.role() != Some(role) => Decision::RedirectTo(Route::Home),
        _ => Decision::Allow,
    }
}

pub fn requirement(view: View) -> Requirement {
    match view {
        View::Home | View::Threats | View::Pipeline | View::Login | View::Signup => {
            Requirement::Public
        }
        View::Apply => Requirement::Protected(None),
        View::Analytics | View::Dashboard | View::Citizens => {
            Requirement::Protected(Some(Role::Admin))
        }
        View::Status => Requirement::Protected(Some(Role::Citizen)),
    }
}

pub fn authorize_view(view: View, session: &Session) -> Decision {
    match requirement(view) {
        Requirement::Public => Decision::Allow,
        Requirement::Protected(role) => authorize(role, session),
    }
}

/// Reads the store fresh on every call; nothing is cached between navigations.
pub fn require_view(view: View, store: &SessionStore) -> Result<(), GateError> {
    match authorize_view(view, &store.current()) {
        Decision::Allow => Ok(()),
        Decision::RedirectTo(Route::Login) => Err(GateError::LoginRequired),
        Decision::RedirectTo(Route::Home) => Err(GateError::Forbidden {
            // only role-bound views redirect home
            required: match requirement(view) {
                Requirement::Protected(Some(role)) => role,
                _ => Role::Admin,
            },
        }),
    }
}

use crate::domain::models::{NavItem, Role, Session};
use crate::services::session::{SessionStore, Subscription};
use parking_lot::Mutex;
use std::sync::Arc;

fn item(name: &str, path: &str) -> NavItem {
    NavItem {
        name: name.to_string(),
        path: path.to_string(),
    }
}

pub fn nav_items(session: &Session) -> Vec<NavItem> {
    let is_admin = session.role() == Some(Role::Admin);
    let mut out = vec![
        item("Home", "/"),
        item("Threats", "/threats"),
        item("Pipeline", "/pipeline"),
    ];
    if is_admin {
        out.push(item("Analytics", "/analytics"));
    }
    if session.is_authenticated() {
        out.push(item("Citizen Portal", "/apply"));
    }
    if is_admin {
        out.push(item("Dashboard", "/dashboard"));
    }
    if session.is_authenticated() {
        out.push(item("Logout", "/logout"));
    } else {
        out.push(item("Login", "/login"));
    }
    out
}

/// Navigation model kept current by session change notifications.
pub struct Navigation {
    items: Arc<Mutex<Vec<NavItem>>>,
    _subscription: Subscription,
}

impl Navigation {
    pub fn attach(store: &SessionStore) -> Self {
        let items = Arc::new(Mutex::new(nav_items(&store.current())));
        let target = Arc::clone(&items);
        let subscription = store.subscribe(move |session| {
            *target.lock() = nav_items(session);
        });
        Self {
            items,
            _subscription: subscription,
        }
    }

    pub fn items(&self) -> Vec<NavItem> {
        self.items.lock().clone()
    }
}

use serde::{Deserialize, Serialize};
use std::io;
use tracing::{info, warn};

use crate::models::Role;
use crate::storage::{LocalStore, keys};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Session {
    /// Reads the session flags. Returns `None` unless the logged-in flag is set
    /// and the stored role is recognised.
    pub fn load(store: &LocalStore) -> Option<Self> {
        if store.get(keys::LOGGED_IN) != Some("true") {
            return None;
        }
        let role = match store.get(keys::USER_ROLE)?.parse::<Role>() {
            Ok(role) => role,
            Err(err) => {
                warn!("ignoring session with bad role: {err}");
                return None;
            }
        };
        Some(Self {
            user_id: store.get(keys::USER_ID).unwrap_or_default().to_string(),
            name: store.get(keys::USER_NAME).unwrap_or_default().to_string(),
            email: store.get(keys::USER_EMAIL).unwrap_or_default().to_string(),
            role,
        })
    }

    pub fn save(&self, store: &mut LocalStore) -> Result<(), io::Error> {
        store.set(keys::LOGGED_IN, "true")?;
        store.set(keys::USER_ROLE, self.role.as_str())?;
        store.set(keys::USER_EMAIL, self.email.as_str())?;
        store.set(keys::USER_ID, self.user_id.as_str())?;
        store.set(keys::USER_NAME, self.name.as_str())?;
        info!(email = %self.email, role = self.role.as_str(), "session started");
        Ok(())
    }

    /// Clears the session flags. The remembered email survives logout.
    pub fn clear(store: &mut LocalStore) -> Result<(), io::Error> {
        for key in [
            keys::LOGGED_IN,
            keys::USER_ROLE,
            keys::USER_EMAIL,
            keys::USER_ID,
            keys::USER_NAME,
            keys::PERSISTENT_LOGIN,
        ] {
            store.remove(key)?;
        }
        info!("session cleared");
        Ok(())
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() { &self.email } else { &self.name }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberedUser {
    pub email: String,
}

pub fn remembered_email(store: &LocalStore) -> Option<String> {
    let raw = store.get(keys::REMEMBERED_USER)?;
    serde_json::from_str::<RememberedUser>(raw)
        .ok()
        .map(|user| user.email)
}

pub fn remember(store: &mut LocalStore, email: Option<&str>) -> Result<(), io::Error> {
    match email {
        Some(email) => {
            let json = serde_json::to_string(&RememberedUser {
                email: email.to_string(),
            })
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
            store.set(keys::REMEMBERED_USER, json)?;
            store.set(keys::PERSISTENT_LOGIN, "true")
        }
        None => {
            store.remove(keys::REMEMBERED_USER)?;
            store.remove(keys::PERSISTENT_LOGIN)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Schedule,
    ScheduleEdit,
    Employees,
    Resources,
    Profile,
    Admin,
    Settings,
    AccountRequests,
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Schedule => "Schedule",
            Page::ScheduleEdit => "Edit Schedule",
            Page::Employees => "Employees",
            Page::Resources => "Resources",
            Page::Profile => "My Profile",
            Page::Admin => "Admin Panel",
            Page::Settings => "Settings",
            Page::AccountRequests => "Account Requests",
        }
    }

    pub fn allows(self, role: Role) -> bool {
        match self {
            Page::ScheduleEdit => role.can_manage_schedule(),
            Page::Admin | Page::Settings | Page::AccountRequests => role == Role::Admin,
            _ => true,
        }
    }

    /// Where a logged-in user without access is sent instead.
    fn fallback(self) -> Page {
        match self {
            Page::ScheduleEdit => Page::Schedule,
            _ => Page::Dashboard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted(Session),
    Login,
    Redirect(Page),
}

/// Re-reads the session flags and decides whether `page` may be shown.
pub fn guard(page: Page, store: &LocalStore) -> Access {
    let Some(session) = Session::load(store) else {
        return Access::Login;
    };
    if page.allows(session.role) {
        Access::Granted(session)
    } else {
        Access::Redirect(page.fallback())
    }
}

pub fn nav_items(role: Role) -> Vec<Page> {
    let mut items = vec![
        Page::Dashboard,
        Page::Schedule,
        Page::Employees,
        Page::Resources,
        Page::Profile,
    ];
    if role == Role::Admin {
        items.extend([Page::Admin, Page::Settings, Page::AccountRequests]);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logged_in(role: Role) -> LocalStore {
        let mut store = LocalStore::in_memory();
        Session {
            user_id: "u1".to_string(),
            name: "Shane".to_string(),
            email: "shane@example.com".to_string(),
            role,
        }
        .save(&mut store)
        .unwrap();
        store
    }

    #[test]
    fn no_session_redirects_to_login() {
        let store = LocalStore::in_memory();
        assert_eq!(guard(Page::Dashboard, &store), Access::Login);
        assert_eq!(guard(Page::Settings, &store), Access::Login);
    }

    #[test]
    fn associates_are_bounced_from_restricted_pages() {
        let store = logged_in(Role::Associate);
        assert_eq!(guard(Page::ScheduleEdit, &store), Access::Redirect(Page::Schedule));
        assert_eq!(guard(Page::Admin, &store), Access::Redirect(Page::Dashboard));
        assert!(matches!(guard(Page::Employees, &store), Access::Granted(_)));
    }

    #[test]
    fn managers_edit_schedules_but_not_settings() {
        let store = logged_in(Role::Manager);
        assert!(matches!(guard(Page::ScheduleEdit, &store), Access::Granted(_)));
        assert_eq!(guard(Page::Settings, &store), Access::Redirect(Page::Dashboard));
    }

    #[test]
    fn admins_reach_everything() {
        let store = logged_in(Role::Admin);
        for page in nav_items(Role::Admin) {
            assert!(matches!(guard(page, &store), Access::Granted(_)));
        }
        assert_eq!(nav_items(Role::Admin).len(), 8);
        assert_eq!(nav_items(Role::Manager).len(), 5);
    }

    #[test]
    fn guard_sees_logout_immediately() {
        let mut store = logged_in(Role::Manager);
        Session::clear(&mut store).unwrap();
        assert_eq!(guard(Page::Schedule, &store), Access::Login);
    }

    #[test]
    fn remembered_email_survives_logout() {
        let mut store = logged_in(Role::Associate);
        remember(&mut store, Some("shane@example.com")).unwrap();
        Session::clear(&mut store).unwrap();
        assert_eq!(remembered_email(&store).as_deref(), Some("shane@example.com"));
        assert_eq!(store.get(keys::PERSISTENT_LOGIN), None);

        remember(&mut store, None).unwrap();
        assert_eq!(remembered_email(&store), None);
    }

    #[test]
    fn unknown_role_invalidates_session() {
        let mut store = logged_in(Role::Admin);
        store.set(keys::USER_ROLE, "superuser").unwrap();
        assert_eq!(Session::load(&store), None);
    }
}

// Data for the navigation shell every signed-in page renders around its content
use crate::auth::role::{Gate, Role, MANAGERS};
use crate::extractors::{CurrentUser, Preferences};
use crate::notifications::{Notification, NotificationStore};
use crate::state::AppState;

/// How many notifications the nav dropdown previews.
const RECENT_NOTIFICATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPage {
    Home,
    Users,
    Map,
    Logs,
    Notifications,
}

impl NavPage {
    pub const ALL: [NavPage; 5] = [
        NavPage::Home,
        NavPage::Users,
        NavPage::Map,
        NavPage::Logs,
        NavPage::Notifications,
    ];

    fn label(&self) -> &'static str {
        match self {
            NavPage::Home => "Home",
            NavPage::Users => "Users",
            NavPage::Map => "Map",
            NavPage::Logs => "Logs",
            NavPage::Notifications => "Notifications",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            NavPage::Home => "🏠",
            NavPage::Users => "👥",
            NavPage::Map => "🗺️",
            NavPage::Logs => "📋",
            NavPage::Notifications => "🔔",
        }
    }

    fn href(&self, role: Role) -> &'static str {
        match self {
            NavPage::Home => role.home_path(),
            NavPage::Users => "/admin/users",
            NavPage::Map => "/map",
            NavPage::Logs => "/logs",
            NavPage::Notifications => "/notifications",
        }
    }

    fn allowed_roles(&self) -> &'static [Role] {
        match self {
            NavPage::Users => MANAGERS,
            _ => &Role::ALL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NavItem {
    pub label: &'static str,
    pub icon: &'static str,
    pub href: &'static str,
    pub current: bool,
    /// Disallowed pages stay visible but locked.
    pub locked: bool,
}

#[derive(Debug, Clone)]
pub struct Shell {
    pub username: String,
    pub role_label: &'static str,
    pub items: Vec<NavItem>,
    pub unread: i64,
    pub recent: Vec<Notification>,
    pub dark_mode: bool,
}

impl Shell {
    pub fn build(user: &CurrentUser, page: NavPage, prefs: Preferences) -> Self {
        let items = NavPage::ALL
            .iter()
            .map(|p| NavItem {
                label: p.label(),
                icon: p.icon(),
                href: p.href(user.role),
                current: *p == page,
                locked: !Gate::check(p.allowed_roles(), user.role).allowed,
            })
            .collect();

        Shell {
            username: user.username.clone(),
            role_label: user.role.label(),
            items,
            unread: 0,
            recent: Vec::new(),
            dark_mode: prefs.dark_mode,
        }
    }

    /// Build the shell and fill in the notification badge and preview.
    /// A failed read shows an empty feed rather than failing the page.
    pub async fn load(state: &AppState, user: &CurrentUser, page: NavPage, prefs: Preferences) -> Self {
        let mut shell = Self::build(user, page, prefs);
        let store = state.notifications();

        match store.list(&user.id).await {
            Ok(items) => {
                shell.unread = items.iter().filter(|n| !n.read).count() as i64;
                shell.recent = items.into_iter().take(RECENT_NOTIFICATIONS).collect();
            }
            Err(e) => tracing::error!("Failed to load notifications for nav: {}", e),
        }

        shell
    }

    pub fn has_unread(&self) -> bool {
        self.unread > 0
    }
}

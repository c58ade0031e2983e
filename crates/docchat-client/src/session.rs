use std::path::{Path, PathBuf};

use docchat_types::User;
use tokio::sync::{broadcast, RwLock};

use crate::error::Result;

/// Lifecycle notifications for the signed-in identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(User),
    SignedOut,
    /// The server rejected the session; the front-end should route to `redirect_to`
    LoginRequired { redirect_to: String },
}

/// Signed-in identity shared by every request made through one client
///
/// Optionally persisted to a JSON file so a restart keeps the cached user,
/// the way the browser kept it in local storage.
pub struct Session {
    user: RwLock<Option<User>>,
    identity_path: Option<PathBuf>,
    login_route: String,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(login_route: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            user: RwLock::new(None),
            identity_path: None,
            login_route: login_route.into(),
            events,
        }
    }

    /// Session backed by an identity file; a readable file seeds the cached user
    pub fn with_identity_file(login_route: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cached = load_identity(&path);
        let (events, _) = broadcast::channel(64);
        Self {
            user: RwLock::new(cached),
            identity_path: Some(path),
            login_route: login_route.into(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.user.read().await.is_some()
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    pub async fn set_user(&self, user: User) -> Result<()> {
        if let Some(path) = &self.identity_path {
            store_identity(path, &user)?;
        }
        *self.user.write().await = Some(user.clone());
        let _ = self.events.send(SessionEvent::SignedIn(user));
        Ok(())
    }

    /// Forget the cached identity after an explicit logout
    pub async fn clear(&self) -> Result<()> {
        self.forget().await?;
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }

    /// Drop the identity and ask the front-end to route to the login page
    pub async fn invalidate(&self) {
        if let Err(e) = self.forget().await {
            tracing::warn!("Failed to remove cached identity: {}", e);
        }
        let _ = self.events.send(SessionEvent::LoginRequired {
            redirect_to: self.login_route.clone(),
        });
    }

    async fn forget(&self) -> Result<()> {
        *self.user.write().await = None;
        if let Some(path) = &self.identity_path {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_LOGIN_ROUTE)
    }
}

fn load_identity(path: &Path) -> Option<User> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            tracing::warn!("Ignoring unreadable identity file {}: {}", path.display(), e);
            None
        }
    }
}

fn store_identity(path: &Path, user: &User) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec_pretty(user)?)?;
    Ok(())
}

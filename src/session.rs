//! Who is logged in, persisted in client-local storage, and the route guard
//! that reads it.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::Result;

/// Storage key holding `"true"` while a user is logged in.
pub const LOGIN_FLAG_KEY: &str = "isLoggedIn";

/// Storage key holding the current username.
pub const USERNAME_KEY: &str = "username";

/// Durable string key/value storage (`localStorage` in the browser).
pub trait KeyValueStore {
    /// # Errors
    /// Returns `Storage` if the backing store is unavailable.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// # Errors
    /// Returns `Storage` if the write is rejected (quota, private mode).
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// # Errors
    /// Returns `Storage` if the backing store is unavailable.
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store for native builds and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Current user, mirrored between memory and durable storage.
pub struct SessionStore<S: KeyValueStore> {
    store: S,
    username: Option<String>,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Restore the session persisted in `store`, if any.
    ///
    /// A username without the login flag counts as logged out.
    ///
    /// # Errors
    /// Returns `Storage` if the store can't be read.
    pub fn open(store: S) -> Result<Self> {
        let logged_in = store.get(LOGIN_FLAG_KEY)?.as_deref() == Some("true");
        let username = if logged_in {
            store.get(USERNAME_KEY)?.filter(|name| !name.is_empty())
        } else {
            None
        };
        Ok(Self { store, username })
    }

    /// The login flag is written last; if it can't be stored the username is
    /// removed again so storage never holds a half-written session.
    ///
    /// # Errors
    /// Returns `Storage` if persisting fails; in-memory state is left unchanged.
    pub fn login(&mut self, username: &str) -> Result<()> {
        self.store.set(USERNAME_KEY, username)?;
        if let Err(e) = self.store.set(LOGIN_FLAG_KEY, "true") {
            if let Err(cleanup) = self.store.remove(USERNAME_KEY) {
                log::warn!("session: could not roll back username: {cleanup}");
            }
            return Err(e);
        }
        self.username = Some(username.to_string());
        log::debug!("session: {username} logged in");
        Ok(())
    }

    /// Clears memory first, so a failing store still logs the user out locally.
    ///
    /// # Errors
    /// Returns `Storage` if the persisted keys can't be removed.
    pub fn logout(&mut self) -> Result<()> {
        self.username = None;
        self.store.remove(USERNAME_KEY)?;
        self.store.remove(LOGIN_FLAG_KEY)?;
        log::debug!("session: logged out");
        Ok(())
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.username.is_some()
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }
}

/// Screens of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Analysis,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/",
            Self::Analysis => "/analysis",
        }
    }

    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Self::Login),
            "/analysis" => Some(Self::Analysis),
            _ => None,
        }
    }

    #[must_use]
    pub fn requires_auth(self) -> bool {
        matches!(self, Self::Analysis)
    }
}

/// Outcome of a route guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Proceed,
    Redirect(Route),
}

/// Gate `route` on the session: protected screens redirect to login.
#[must_use]
pub fn guard<S: KeyValueStore>(route: Route, session: &SessionStore<S>) -> Navigation {
    if route.requires_auth() && !session.is_logged_in() {
        Navigation::Redirect(Route::Login)
    } else {
        Navigation::Proceed
    }
}

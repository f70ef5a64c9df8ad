//! Explicit session context
//!
//! The signed-in profile lives here and is handed to whatever needs an
//! identity. Listeners subscribe once and hear every sign-in, sign-out and
//! refresh.

use tracing::info;

use crate::error::{CloseError, CloseResult};
use crate::models::{Profile, Store};
use crate::services::ProfileService;
use crate::storage::Storage;

use super::access::{can_access, Route};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Profile),
    SignedOut,
    ProfileRefreshed(Profile),
}

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(usize);

type Listener<'a> = Box<dyn Fn(&AuthEvent) + 'a>;

pub struct Session<'a> {
    storage: &'a Storage,
    profile: Option<Profile>,
    listeners: Vec<(Subscription, Listener<'a>)>,
    next_subscription: usize,
}

impl<'a> Session<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            profile: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn subscribe(&mut self, listener: impl Fn(&AuthEvent) + 'a) -> Subscription {
        let subscription = Subscription(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((subscription, Box::new(listener)));
        subscription
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != subscription);
        self.listeners.len() != before
    }

    pub fn current(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Sign in by username or id; blocked profiles are refused
    pub fn sign_in(&mut self, identifier: &str) -> CloseResult<&Profile> {
        let profile = ProfileService::new(self.storage).resolve(identifier)?;
        if profile.blocked {
            return Err(CloseError::Unauthorized(format!(
                "{} is blocked",
                profile.username
            )));
        }

        info!(user = %profile.username, role = %profile.role, "signed in");
        self.emit(&AuthEvent::SignedIn(profile.clone()));
        Ok(&*self.profile.insert(profile))
    }

    /// Returns `false` when nobody was signed in
    pub fn sign_out(&mut self) -> bool {
        match self.profile.take() {
            Some(profile) => {
                info!(user = %profile.username, "signed out");
                self.emit(&AuthEvent::SignedOut);
                true
            }
            None => false,
        }
    }

    /// Reload the signed-in profile; a deleted or blocked profile signs out
    pub fn refresh(&mut self) -> CloseResult<Option<&Profile>> {
        let Some(current) = &self.profile else {
            return Ok(None);
        };

        match self.storage.profiles.get(current.id)? {
            Some(profile) if !profile.blocked => {
                self.emit(&AuthEvent::ProfileRefreshed(profile.clone()));
                Ok(Some(&*self.profile.insert(profile)))
            }
            _ => {
                self.sign_out();
                Ok(None)
            }
        }
    }

    /// The signed-in profile, provided it may open `route`
    pub fn require(&self, route: Route) -> CloseResult<&Profile> {
        let profile = self
            .profile
            .as_ref()
            .ok_or_else(|| CloseError::Unauthorized("not signed in".into()))?;

        if !can_access(route, Some(profile.role)) {
            return Err(CloseError::Unauthorized(format!(
                "{} ({}) cannot open {}",
                profile.username, profile.role, route
            )));
        }
        Ok(profile)
    }

    /// Active stores visible to the signed-in profile
    pub fn available_stores(&self) -> CloseResult<Vec<Store>> {
        match &self.profile {
            Some(profile) => ProfileService::new(self.storage).available_stores(profile),
            None => Ok(Vec::new()),
        }
    }

    fn emit(&self, event: &AuthEvent) {
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }
}

use crate::livery::{index_of_livery, Livery};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown livery set: {0}")]
    UnknownSet(String),
}

/// The four per-livery status sets tracked by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiverySet {
    Disabled,
    Deleting,
    Updating,
    Selected,
}

impl LiverySet {
    pub const ALL: [LiverySet; 4] = [
        LiverySet::Disabled,
        LiverySet::Deleting,
        LiverySet::Updating,
        LiverySet::Selected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LiverySet::Disabled => "disabled",
            LiverySet::Deleting => "deleting",
            LiverySet::Updating => "updating",
            LiverySet::Selected => "selected",
        }
    }
}

impl fmt::Display for LiverySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LiverySet {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LiverySet::ALL
            .into_iter()
            .find(|set| set.as_str() == s)
            .ok_or_else(|| RegistryError::UnknownSet(s.to_string()))
    }
}

/// State of the authoritative installed list.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Installed {
    /// Nothing has been requested yet.
    #[default]
    Unloaded,
    /// A refresh is in flight; there is no data to show.
    Loading,
    Loaded(Vec<Livery>),
    /// The last load failed. The message is kept so the panel can display it.
    Failed(String),
}

impl Installed {
    pub fn liveries(&self) -> Option<&[Livery]> {
        match self {
            Installed::Loaded(list) => Some(list),
            _ => None,
        }
    }

    pub fn contains(&self, livery: &Livery) -> bool {
        self.liveries()
            .is_some_and(|list| index_of_livery(livery, list).is_some())
    }
}

/// Immutable view of the registry at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistrySnapshot {
    pub installed: Installed,
    pub disabled: Vec<Livery>,
    pub deleting: Vec<Livery>,
    pub updating: Vec<Livery>,
    pub selected: Vec<Livery>,
    pub refreshing: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
    /// Aircraft groups currently expanded in the panel.
    pub expanded: Vec<String>,
}

impl RegistrySnapshot {
    pub fn set(&self, set: LiverySet) -> &[Livery] {
        match set {
            LiverySet::Disabled => &self.disabled,
            LiverySet::Deleting => &self.deleting,
            LiverySet::Updating => &self.updating,
            LiverySet::Selected => &self.selected,
        }
    }

    fn set_mut(&mut self, set: LiverySet) -> &mut Vec<Livery> {
        match set {
            LiverySet::Disabled => &mut self.disabled,
            LiverySet::Deleting => &mut self.deleting,
            LiverySet::Updating => &mut self.updating,
            LiverySet::Selected => &mut self.selected,
        }
    }

    pub fn contains(&self, set: LiverySet, livery: &Livery) -> bool {
        index_of_livery(livery, self.set(set)).is_some()
    }
}

/// Installed liveries plus transient per-livery status for one panel session.
///
/// Each mutation clones the current snapshot, edits the clone and publishes it.
/// Readers holding an `Arc` from [`LiveryRegistry::snapshot`] keep seeing the
/// state they were handed.
#[derive(Debug, Default)]
pub struct LiveryRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl LiveryRegistry {
    pub fn new() -> Self {
        log::debug!("Livery registry opened");
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn publish<F>(&self, edit: F)
    where
        F: FnOnce(&mut RegistrySnapshot) -> bool,
    {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = RegistrySnapshot::clone(&guard);
        if edit(&mut next) {
            *guard = Arc::new(next);
        }
    }

    /// Inserts `livery` into `set` unless a member with the same composite key exists.
    pub fn add_to_set(&self, set: LiverySet, livery: &Livery) {
        self.publish(|s| {
            let members = s.set_mut(set);
            if index_of_livery(livery, members).is_some() {
                return false;
            }
            log::debug!("{} += {}", set, livery.key());
            members.push(livery.clone());
            true
        });
    }

    /// Removes the first member of `set` sharing `livery`'s composite key.
    pub fn remove_from_set(&self, set: LiverySet, livery: &Livery) {
        self.publish(|s| {
            let members = s.set_mut(set);
            match index_of_livery(livery, members) {
                Some(i) => {
                    log::debug!("{} -= {}", set, livery.key());
                    members.remove(i);
                    true
                }
                None => false,
            }
        });
    }

    pub fn contains(&self, set: LiverySet, livery: &Livery) -> bool {
        self.snapshot().contains(set, livery)
    }

    /// Replaces the authoritative installed list. An `Err` is published as
    /// [`Installed::Failed`] so the panel still has something to display.
    pub fn replace_installed<E: fmt::Display>(&self, result: Result<Vec<Livery>, E>) {
        let installed = match result {
            Ok(list) => Installed::Loaded(list),
            Err(e) => Installed::Failed(e.to_string()),
        };
        self.publish(|s| {
            s.installed = installed;
            true
        });
    }

    pub fn set_loading(&self) {
        self.publish(|s| {
            s.installed = Installed::Loading;
            true
        });
    }

    pub fn set_refreshing(&self, refreshing: bool) {
        self.publish(|s| {
            if s.refreshing == refreshing {
                return false;
            }
            s.refreshing = refreshing;
            true
        });
    }

    pub fn mark_refreshed(&self, at: DateTime<Utc>) {
        self.publish(|s| {
            s.last_refreshed = Some(at);
            true
        });
    }

    pub fn set_expanded(&self, aircraft: &str, expanded: bool) {
        self.publish(|s| {
            let pos = s.expanded.iter().position(|a| a == aircraft);
            match (expanded, pos) {
                (true, None) => s.expanded.push(aircraft.to_string()),
                (false, Some(i)) => {
                    s.expanded.remove(i);
                }
                _ => return false,
            }
            true
        });
    }

    pub fn is_expanded(&self, aircraft: &str) -> bool {
        self.snapshot().expanded.iter().any(|a| a == aircraft)
    }
}

impl Drop for LiveryRegistry {
    fn drop(&mut self) {
        log::debug!("Livery registry closed");
    }
}

use crate::registry::{Installed, LiveryRegistry};
use crate::scanner::{ScanError, Scanner};

/// Reloads the installed list from a [`Scanner`] into a [`LiveryRegistry`].
///
/// Overlapping refreshes are not serialized: each one publishes its result
/// when it finishes, so the last one to finish wins.
#[derive(Clone, Copy)]
pub struct RefreshCoordinator<'a> {
    registry: &'a LiveryRegistry,
    scanner: &'a dyn Scanner,
}

impl<'a> RefreshCoordinator<'a> {
    pub fn new(registry: &'a LiveryRegistry, scanner: &'a dyn Scanner) -> Self {
        Self { registry, scanner }
    }

    pub fn registry(&self) -> &'a LiveryRegistry {
        self.registry
    }

    /// Returns the number of liveries found.
    pub fn refresh(&self) -> Result<usize, ScanError> {
        self.registry.set_refreshing(true);
        self.registry.set_loading();

        let result = self.scanner.list_installed();
        let outcome = match result {
            Ok(list) => {
                let count = list.len();
                self.registry.replace_installed::<ScanError>(Ok(list));
                Ok(count)
            }
            Err(e) => {
                log::error!("Failed to load installed liveries: {}", e);
                self.registry.replace_installed::<&ScanError>(Err(&e));
                Err(e)
            }
        };

        self.registry.set_refreshing(false);
        outcome
    }

    /// A refresh the user asked for. Also records when it last succeeded.
    pub fn refresh_manual(&self) -> Result<usize, ScanError> {
        let count = self.refresh()?;
        self.registry.mark_refreshed(chrono::Utc::now());
        Ok(count)
    }

    /// Loads the list if nothing has been requested yet. Returns `None` when
    /// the registry already holds (or is fetching) a list.
    pub fn ensure_loaded(&self) -> Option<Result<usize, ScanError>> {
        if matches!(self.registry.snapshot().installed, Installed::Unloaded) {
            Some(self.refresh())
        } else {
            None
        }
    }
}

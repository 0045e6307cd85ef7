use crate::deleter::{DeleteOutcome, Deleter};
use crate::livery::{Livery, LiveryKey};
use crate::panel::{keys, Notice, NoticeHandle, PanelServices, Severity};
use crate::refresh::RefreshCoordinator;
use crate::registry::{LiverySet, LiveryRegistry};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Why a single livery could not be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingLiveryReference,
    MissingInstallLocation,
    PathNotFound,
    DeleteReportedFailure,
    DeleteFault,
    ScanFailure,
}

impl FailureKind {
    /// Failures that stop the rest of the batch under [`PreconditionPolicy::AbortBatch`].
    pub fn aborts_batch(&self) -> bool {
        !matches!(
            self,
            FailureKind::DeleteReportedFailure | FailureKind::ScanFailure
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::MissingLiveryReference => "missing livery reference",
            FailureKind::MissingInstallLocation => "missing install location",
            FailureKind::PathNotFound => "path not found",
            FailureKind::DeleteReportedFailure => "delete failed",
            FailureKind::DeleteFault => "delete fault",
            FailureKind::ScanFailure => "scan failure",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// 1-based position in the batch.
    pub position: usize,
    pub key: Option<LiveryKey>,
    pub kind: FailureKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Aborted(FailureKind),
    Cancelled,
}

/// What to do after a precondition failure or a delete fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreconditionPolicy {
    /// Stop processing the remaining items.
    #[default]
    AbortBatch,
    /// Count the failure and move on to the next item.
    SkipItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UninstallBatchReport {
    /// Number of items requested.
    pub batch_len: usize,
    /// Number of items attempted.
    pub total: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
    /// Refreshes that failed after a delete. Not counted in `failed`.
    pub refresh_errors: Vec<ItemFailure>,
    pub stopped: Option<StopReason>,
}

impl UninstallBatchReport {
    fn new(batch_len: usize) -> Self {
        Self {
            batch_len,
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> usize {
        self.total - self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    NothingToRemove,
    Declined,
    Completed(UninstallBatchReport),
}

impl UninstallOutcome {
    pub fn report(&self) -> Option<&UninstallBatchReport> {
        match self {
            UninstallOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Shared flag a panel can flip to stop a running batch before its next item.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Keeps a livery in the `deleting` set for as long as it is alive.
struct DeletingMark<'r> {
    registry: &'r LiveryRegistry,
    livery: &'r Livery,
}

impl<'r> DeletingMark<'r> {
    fn new(registry: &'r LiveryRegistry, livery: &'r Livery) -> Self {
        registry.add_to_set(LiverySet::Deleting, livery);
        Self { registry, livery }
    }
}

impl Drop for DeletingMark<'_> {
    fn drop(&mut self) {
        self.registry.remove_from_set(LiverySet::Deleting, self.livery);
    }
}

/// Removes a batch of liveries one at a time.
pub struct UninstallOrchestrator<'a> {
    registry: &'a LiveryRegistry,
    refresher: RefreshCoordinator<'a>,
    deleter: &'a dyn Deleter,
    services: PanelServices<'a>,
    policy: PreconditionPolicy,
    cancel: CancelToken,
}

impl<'a> UninstallOrchestrator<'a> {
    pub fn new(
        refresher: RefreshCoordinator<'a>,
        deleter: &'a dyn Deleter,
        services: PanelServices<'a>,
    ) -> Self {
        Self {
            registry: refresher.registry(),
            refresher,
            deleter,
            services,
            policy: PreconditionPolicy::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_policy(mut self, policy: PreconditionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Looks up each key in the current installed list. Keys that no longer
    /// resolve become `None` entries.
    pub fn resolve_batch(&self, keys: &[LiveryKey]) -> Vec<Option<Livery>> {
        let snapshot = self.registry.snapshot();
        let installed = snapshot.installed.liveries().unwrap_or(&[]);
        keys.iter()
            .map(|key| installed.iter().find(|l| l.matches_key(key)).cloned())
            .collect()
    }

    /// Removes every livery in the current installed list.
    pub fn uninstall_installed(&self) -> UninstallOutcome {
        let snapshot = self.registry.snapshot();
        let batch: Vec<Option<Livery>> = snapshot
            .installed
            .liveries()
            .unwrap_or(&[])
            .iter()
            .cloned()
            .map(Some)
            .collect();
        self.uninstall_all(&batch)
    }

    /// Removes `batch` in order, at most one delete in flight.
    ///
    /// `None` entries stand for references that could not be resolved and are
    /// counted as failures.
    pub fn uninstall_all(&self, batch: &[Option<Livery>]) -> UninstallOutcome {
        let t = self.services.translator;
        let notifier = self.services.notifier;

        if batch.is_empty() {
            notifier.show(
                &t.translate(keys::NO_LIVERIES_TO_REMOVE, &[]),
                Notice::new(Severity::Error),
            );
            return UninstallOutcome::NothingToRemove;
        }

        let choice = self.services.prompt.ask(
            &t.translate(keys::UNINSTALL_ALL_MESSAGE, &[]),
            &t.translate(keys::UNINSTALL_ALL_TITLE, &[]),
            &t.translate(keys::UNINSTALL_ALL_DETAIL, &[]),
        );
        if choice != 0 {
            log::info!("Uninstall of {} liveries declined", batch.len());
            return UninstallOutcome::Declined;
        }

        log::info!("Uninstalling {} liveries", batch.len());
        let mut report = UninstallBatchReport::new(batch.len());
        let mut progress: Option<NoticeHandle> = None;

        for (i, item) in batch.iter().enumerate() {
            if self.cancel.is_cancelled() {
                log::info!("Uninstall cancelled before item {}", i + 1);
                report.stopped = Some(StopReason::Cancelled);
                break;
            }

            if let Some(handle) = progress.take() {
                notifier.dismiss(handle);
            }
            progress = Some(notifier.show(
                &t.translate(
                    keys::REMOVING_LIVERY,
                    &[
                        ("current", (i + 1).to_string()),
                        ("total", batch.len().to_string()),
                    ],
                ),
                Notice::new(Severity::Info),
            ));
            report.total += 1;

            if let Err(failure) = self.uninstall_one(i + 1, item.as_ref(), &mut report) {
                let kind = failure.kind;
                match &failure.key {
                    Some(key) => {
                        log::warn!("Failed to remove {} ({}): {}", key, kind, failure.detail)
                    }
                    None => log::warn!("Failed to remove item {} ({})", failure.position, kind),
                }
                report.failed += 1;
                report.failures.push(failure);

                if kind.aborts_batch() && self.policy == PreconditionPolicy::AbortBatch {
                    log::error!("Uninstall stopped after item {} of {}", i + 1, batch.len());
                    report.stopped = Some(StopReason::Aborted(kind));
                    break;
                }
            }
        }

        if let Some(handle) = progress.take() {
            notifier.dismiss(handle);
        }

        notifier.show(
            &t.translate(
                keys::REMOVE_ALL_SUCCESS,
                &[("total", report.succeeded().to_string())],
            ),
            Notice::new(Severity::Success),
        );
        if report.failed > 0 {
            notifier.show(
                &t.translate(
                    keys::REMOVE_ALL_FAILURES,
                    &[("errors", report.failed.to_string())],
                ),
                Notice::new(Severity::Default),
            );
        }

        log::info!(
            "Uninstall finished: {} removed, {} failed, {} not attempted",
            report.succeeded(),
            report.failed,
            report.batch_len - report.total
        );
        UninstallOutcome::Completed(report)
    }

    fn uninstall_one(
        &self,
        position: usize,
        item: Option<&Livery>,
        report: &mut UninstallBatchReport,
    ) -> Result<(), ItemFailure> {
        let fail = |key: Option<LiveryKey>, kind: FailureKind, detail: String| ItemFailure {
            position,
            key,
            kind,
            detail,
        };

        let livery = item.ok_or_else(|| {
            fail(
                None,
                FailureKind::MissingLiveryReference,
                "no livery passed".to_string(),
            )
        })?;
        let path = livery.install_location.as_deref().ok_or_else(|| {
            fail(
                Some(livery.key()),
                FailureKind::MissingInstallLocation,
                "unknown location".to_string(),
            )
        })?;
        if !path.exists() {
            return Err(fail(
                Some(livery.key()),
                FailureKind::PathNotFound,
                format!("folder not found: {}", path.display()),
            ));
        }

        log::debug!("Deleting {} at {}", livery.key(), path.display());
        let outcome = {
            let _mark = DeletingMark::new(self.registry, livery);
            self.deleter.delete(path)
        };

        if let Err(e) = self.refresher.refresh() {
            report.refresh_errors.push(fail(
                Some(livery.key()),
                FailureKind::ScanFailure,
                e.to_string(),
            ));
        }

        match outcome {
            DeleteOutcome::Removed(message) => {
                log::debug!("{}", message);
                Ok(())
            }
            DeleteOutcome::Failed(reason) => Err(fail(
                Some(livery.key()),
                FailureKind::DeleteReportedFailure,
                reason,
            )),
            DeleteOutcome::Faulted(cause) => Err(fail(
                Some(livery.key()),
                FailureKind::DeleteFault,
                cause,
            )),
        }
    }
}

use livery_core::deleter::{DeleteOutcome, Deleter, FsDeleter};
use livery_core::panel::{
    keys, ConfirmationPrompt, Notice, NoticeHandle, NotificationSink, PanelServices, Severity,
    Translator,
};
use livery_core::refresh::RefreshCoordinator;
use livery_core::scanner::{DiskScanner, ScanError, Scanner};
use livery_core::uninstall::{
    CancelToken, FailureKind, PreconditionPolicy, StopReason, UninstallOrchestrator,
    UninstallOutcome,
};
use livery_core::{Livery, LiveryKey, LiveryRegistry, LiverySet};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Liveries folder populated with `<airplane>/<name>/texture.dds` entries.
struct MockLiveries {
    // Keep TempDir alive so the directory isn't deleted
    _dir: TempDir,
    pub root: PathBuf,
}

impl MockLiveries {
    fn new(entries: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path().to_path_buf();
        for (airplane, name) in entries {
            let path = root.join(airplane).join(name);
            fs::create_dir_all(&path).unwrap();
            fs::write(path.join("texture.dds"), "DDS").unwrap();
        }
        Self { _dir: dir, root }
    }

    fn path(&self, airplane: &str, name: &str) -> PathBuf {
        self.root.join(airplane).join(name)
    }
}

struct CountingScanner {
    inner: DiskScanner,
    calls: Cell<usize>,
}

impl Scanner for CountingScanner {
    fn list_installed(&self) -> Result<Vec<Livery>, ScanError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.list_installed()
    }
}

/// Deletes through [`FsDeleter`] unless a scripted outcome exists for the
/// folder name, and records what the registry looked like during each call.
struct ScriptedDeleter<'r> {
    inner: FsDeleter,
    registry: &'r LiveryRegistry,
    scripted: HashMap<String, DeleteOutcome>,
    calls: RefCell<Vec<PathBuf>>,
    marked_during_delete: RefCell<Vec<bool>>,
    cancel_on_first: Option<CancelToken>,
}

impl<'r> ScriptedDeleter<'r> {
    fn new(root: &Path, registry: &'r LiveryRegistry) -> Self {
        Self {
            inner: FsDeleter::new(root),
            registry,
            scripted: HashMap::new(),
            calls: RefCell::new(Vec::new()),
            marked_during_delete: RefCell::new(Vec::new()),
            cancel_on_first: None,
        }
    }

    fn script(mut self, folder: &str, outcome: DeleteOutcome) -> Self {
        self.scripted.insert(folder.to_string(), outcome);
        self
    }
}

impl Deleter for ScriptedDeleter<'_> {
    fn delete(&self, path: &Path) -> DeleteOutcome {
        let snapshot = self.registry.snapshot();
        let marked = snapshot
            .deleting
            .iter()
            .any(|l| l.install_location.as_deref() == Some(path))
            && snapshot.installed.liveries().map_or(false, |list| {
                list.iter().any(|l| l.install_location.as_deref() == Some(path))
            });
        self.marked_during_delete.borrow_mut().push(marked);
        self.calls.borrow_mut().push(path.to_path_buf());

        if let Some(token) = &self.cancel_on_first {
            token.cancel();
        }

        let folder = path.file_name().unwrap().to_string_lossy().to_string();
        match self.scripted.get(&folder) {
            Some(outcome) => outcome.clone(),
            None => self.inner.delete(path),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    shown: RefCell<Vec<(String, Severity)>>,
    dismissed: RefCell<Vec<NoticeHandle>>,
    next: Cell<u64>,
}

impl RecordingNotifier {
    fn messages_with(&self, key: &str) -> Vec<String> {
        self.shown
            .borrow()
            .iter()
            .filter(|(m, _)| m.starts_with(key))
            .map(|(m, _)| m.clone())
            .collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn show(&self, message: &str, notice: Notice<'_>) -> NoticeHandle {
        self.shown
            .borrow_mut()
            .push((message.to_string(), notice.severity));
        let id = self.next.get();
        self.next.set(id + 1);
        NoticeHandle(id)
    }

    fn dismiss(&self, handle: NoticeHandle) {
        self.dismissed.borrow_mut().push(handle);
    }
}

struct FixedPrompt {
    answer: usize,
    asked: Cell<usize>,
}

impl FixedPrompt {
    fn new(answer: usize) -> Self {
        Self {
            answer,
            asked: Cell::new(0),
        }
    }
}

impl ConfirmationPrompt for FixedPrompt {
    fn ask(&self, _message: &str, _title: &str, _detail: &str) -> usize {
        self.asked.set(self.asked.get() + 1);
        self.answer
    }
}

/// Renders `key name=value ...` so tests can inspect parameters.
struct EchoTranslator;

impl Translator for EchoTranslator {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        let mut out = key.to_string();
        for (name, value) in params {
            out.push_str(&format!(" {}={}", name, value));
        }
        out
    }
}

fn loaded_registry(scanner: &dyn Scanner) -> LiveryRegistry {
    let _ = simplelog::SimpleLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
    );
    let registry = LiveryRegistry::new();
    RefreshCoordinator::new(&registry, scanner)
        .refresh()
        .expect("initial scan");
    registry
}

fn counting(root: &Path) -> CountingScanner {
    CountingScanner {
        inner: DiskScanner::new(root),
        calls: Cell::new(0),
    }
}

fn installed_batch(registry: &LiveryRegistry) -> Vec<Option<Livery>> {
    registry
        .snapshot()
        .installed
        .liveries()
        .unwrap()
        .iter()
        .cloned()
        .map(Some)
        .collect()
}

#[test]
fn test_all_deletes_succeed() {
    let mock = MockLiveries::new(&[("A320", "DLH"), ("A320", "BAW"), ("B737", "RYR")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let deleter = ScriptedDeleter::new(&mock.root, &registry);
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };

    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    );
    let outcome = orchestrator.uninstall_installed();

    let report = outcome.report().expect("report");
    assert_eq!(report.batch_len, 3);
    assert_eq!(report.total, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.stopped, None);

    assert!(!mock.path("A320", "DLH").exists());
    assert!(!mock.path("B737", "RYR").exists());

    let snap = registry.snapshot();
    assert_eq!(snap.installed.liveries().map(|l| l.len()), Some(0));
    assert!(snap.deleting.is_empty());

    // One refresh up front plus one per delete
    assert_eq!(scanner.calls.get(), 4);
    assert_eq!(*deleter.marked_during_delete.borrow(), vec![true, true, true]);

    let progress = notifier.messages_with(keys::REMOVING_LIVERY);
    assert_eq!(progress.len(), 3);
    assert!(progress[0].ends_with("current=1 total=3"));
    assert!(progress[2].ends_with("current=3 total=3"));
    assert_eq!(notifier.dismissed.borrow().len(), 3);

    let success = notifier.messages_with(keys::REMOVE_ALL_SUCCESS);
    assert_eq!(success, vec![format!("{} total=3", keys::REMOVE_ALL_SUCCESS)]);
    assert!(notifier.messages_with(keys::REMOVE_ALL_FAILURES).is_empty());
}

#[test]
fn test_declined_has_no_side_effects() {
    let mock = MockLiveries::new(&[("A320", "DLH"), ("B737", "RYR")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let before = registry.snapshot();
    let deleter = ScriptedDeleter::new(&mock.root, &registry);
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(1);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };

    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    );
    let outcome = orchestrator.uninstall_installed();

    assert_eq!(outcome, UninstallOutcome::Declined);
    assert!(outcome.report().is_none());
    assert_eq!(prompt.asked.get(), 1);
    assert!(deleter.calls.borrow().is_empty());
    assert!(notifier.shown.borrow().is_empty());
    assert_eq!(scanner.calls.get(), 1);
    assert_eq!(*registry.snapshot(), *before);
    assert!(mock.path("A320", "DLH").exists());
}

#[test]
fn test_empty_batch_notifies_once() {
    let mock = MockLiveries::new(&[]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let deleter = ScriptedDeleter::new(&mock.root, &registry);
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };

    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    );

    assert_eq!(orchestrator.uninstall_all(&[]), UninstallOutcome::NothingToRemove);
    assert!(deleter.calls.borrow().is_empty());
    assert_eq!(prompt.asked.get(), 0);

    let shown = notifier.shown.borrow();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, keys::NO_LIVERIES_TO_REMOVE);
    assert_eq!(shown[0].1, Severity::Error);
}

#[test]
fn test_missing_path_aborts_remaining_batch() {
    let mock = MockLiveries::new(&[("A320", "DLH"), ("A320", "GONE"), ("B737", "RYR")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let batch = installed_batch(&registry);
    // Installed order is sorted: A320/DLH, A320/GONE, B737/RYR
    fs::remove_dir_all(mock.path("A320", "GONE")).unwrap();
    let gone = batch[1].clone().unwrap();
    assert_eq!(gone.file_name, "GONE");

    let deleter = ScriptedDeleter::new(&mock.root, &registry);
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };
    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    );

    let outcome = orchestrator.uninstall_all(&batch);
    let report = outcome.report().unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.stopped, Some(StopReason::Aborted(FailureKind::PathNotFound)));
    assert_eq!(report.failures[0].position, 2);
    assert_eq!(report.failures[0].key, Some(gone.key()));

    // Only the first livery was sent to the deleter
    assert_eq!(deleter.calls.borrow().len(), 1);
    assert!(mock.path("B737", "RYR").exists());
    assert!(!registry.contains(LiverySet::Deleting, &gone));

    assert_eq!(
        notifier.messages_with(keys::REMOVE_ALL_FAILURES),
        vec![format!("{} errors=1", keys::REMOVE_ALL_FAILURES)]
    );
}

#[test]
fn test_reported_failure_continues_with_next_item() {
    let mock = MockLiveries::new(&[("A320", "DLH"), ("B737", "RYR")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let deleter = ScriptedDeleter::new(&mock.root, &registry)
        .script("DLH", DeleteOutcome::Failed("reason".into()));
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };
    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    );

    let outcome = orchestrator.uninstall_installed();
    let report = outcome.report().unwrap();

    assert_eq!(report.total, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.stopped, None);
    assert_eq!(report.failures[0].kind, FailureKind::DeleteReportedFailure);
    assert_eq!(report.failures[0].detail, "reason");
    assert_eq!(deleter.calls.borrow().len(), 2);

    assert!(mock.path("A320", "DLH").exists());
    assert!(!mock.path("B737", "RYR").exists());

    let snap = registry.snapshot();
    assert!(snap.deleting.is_empty());
    let remaining = snap.installed.liveries().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].file_name, "DLH");
}

#[test]
fn test_fault_aborts_batch() {
    let mock = MockLiveries::new(&[("A320", "DLH"), ("B737", "RYR")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let deleter = ScriptedDeleter::new(&mock.root, &registry)
        .script("DLH", DeleteOutcome::Faulted("disk on fire".into()));
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };
    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    );

    let report = orchestrator.uninstall_installed().report().cloned().unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.stopped, Some(StopReason::Aborted(FailureKind::DeleteFault)));
    assert!(mock.path("B737", "RYR").exists());
    // The faulted item still triggered its refresh and was unmarked
    assert_eq!(scanner.calls.get(), 2);
    assert!(registry.snapshot().deleting.is_empty());
}

#[test]
fn test_missing_install_location_aborts_batch() {
    let mock = MockLiveries::new(&[("A320", "DLH"), ("B737", "RYR")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let mut batch = installed_batch(&registry);
    let nowhere = Livery {
        airplane: "A320".into(),
        file_name: "nowhere".into(),
        ..Default::default()
    };
    batch.insert(0, Some(nowhere.clone()));

    let deleter = ScriptedDeleter::new(&mock.root, &registry);
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };
    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    );

    let report = orchestrator.uninstall_all(&batch).report().cloned().unwrap();
    assert_eq!(
        report.stopped,
        Some(StopReason::Aborted(FailureKind::MissingInstallLocation))
    );
    assert_eq!(report.batch_len, 3);
    assert_eq!(report.total, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].key, Some(nowhere.key()));

    assert!(deleter.calls.borrow().is_empty());
    assert!(mock.path("A320", "DLH").exists());
    assert!(mock.path("B737", "RYR").exists());
    assert!(!registry.contains(LiverySet::Deleting, &nowhere));
}

#[test]
fn test_skip_policy_continues_past_precondition_failures() {
    let mock = MockLiveries::new(&[("A320", "DLH"), ("B737", "RYR")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let mut batch = installed_batch(&registry);
    batch.insert(0, None);
    batch.insert(
        1,
        Some(Livery {
            airplane: "A320".into(),
            file_name: "nowhere".into(),
            ..Default::default()
        }),
    );

    let deleter = ScriptedDeleter::new(&mock.root, &registry);
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };
    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    )
    .with_policy(PreconditionPolicy::SkipItem);

    let outcome = orchestrator.uninstall_all(&batch);
    let report = outcome.report().unwrap();

    assert_eq!(report.total, 4);
    assert_eq!(report.failed, 2);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.stopped, None);
    let kinds: Vec<_> = report.failures.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FailureKind::MissingLiveryReference,
            FailureKind::MissingInstallLocation
        ]
    );
    assert_eq!(deleter.calls.borrow().len(), 2);
    assert_eq!(
        notifier.messages_with(keys::REMOVE_ALL_SUCCESS),
        vec![format!("{} total=2", keys::REMOVE_ALL_SUCCESS)]
    );
}

#[test]
fn test_unresolved_key_aborts_with_missing_reference() {
    let mock = MockLiveries::new(&[("A320", "DLH")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let deleter = ScriptedDeleter::new(&mock.root, &registry);
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };
    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    );

    let batch = orchestrator.resolve_batch(&[
        LiveryKey::new("B747", "uninstalled"),
        LiveryKey::new("A320", "DLH"),
    ]);
    assert!(batch[0].is_none());
    assert!(batch[1].is_some());

    let report = orchestrator.uninstall_all(&batch).report().cloned().unwrap();
    assert_eq!(
        report.stopped,
        Some(StopReason::Aborted(FailureKind::MissingLiveryReference))
    );
    assert_eq!(report.total, 1);
    assert_eq!(report.succeeded(), 0);
    assert!(deleter.calls.borrow().is_empty());
    assert!(mock.path("A320", "DLH").exists());
}

#[test]
fn test_cancel_stops_before_next_item() {
    let mock = MockLiveries::new(&[("A320", "DLH"), ("A320", "BAW"), ("B737", "RYR")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let token = CancelToken::new();
    let mut deleter = ScriptedDeleter::new(&mock.root, &registry);
    deleter.cancel_on_first = Some(token.clone());
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };
    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &scanner),
        &deleter,
        services,
    )
    .with_cancel_token(token);

    let report = orchestrator.uninstall_installed().report().cloned().unwrap();

    assert_eq!(report.stopped, Some(StopReason::Cancelled));
    assert_eq!(report.total, 1);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(deleter.calls.borrow().len(), 1);
    assert_eq!(registry.snapshot().installed.liveries().unwrap().len(), 2);
    assert_eq!(notifier.messages_with(keys::REMOVE_ALL_SUCCESS).len(), 1);
}

#[test]
fn test_refresh_failure_does_not_fail_the_item() {
    let mock = MockLiveries::new(&[("A320", "DLH")]);
    let scanner = counting(&mock.root);
    let registry = loaded_registry(&scanner);
    let batch = installed_batch(&registry);

    // Deleting the only livery also removes the aircraft folder; a scanner
    // pointed at a folder that disappears with it then fails.
    let vanishing = counting(&mock.path("A320", "DLH"));
    let deleter = ScriptedDeleter::new(&mock.root, &registry);
    let notifier = RecordingNotifier::default();
    let prompt = FixedPrompt::new(0);
    let services = PanelServices {
        notifier: &notifier,
        prompt: &prompt,
        translator: &EchoTranslator,
    };
    let orchestrator = UninstallOrchestrator::new(
        RefreshCoordinator::new(&registry, &vanishing),
        &deleter,
        services,
    );

    let report = orchestrator.uninstall_all(&batch).report().cloned().unwrap();
    assert_eq!(report.failed, 0);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.refresh_errors.len(), 1);
    assert_eq!(report.refresh_errors[0].kind, FailureKind::ScanFailure);
    assert!(matches!(
        registry.snapshot().installed,
        livery_core::Installed::Failed(_)
    ));
}

//! Interfaces the panel needs from its host: notifications, confirmation
//! dialogs and translated strings.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Default,
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice<'a> {
    pub severity: Severity,
    pub id: Option<&'a str>,
}

impl Notice<'_> {
    pub fn new(severity: Severity) -> Self {
        Notice { severity, id: None }
    }
}

/// Token returned by [`NotificationSink::show`], used to dismiss the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoticeHandle(pub u64);

pub trait NotificationSink {
    fn show(&self, message: &str, notice: Notice<'_>) -> NoticeHandle;
    fn dismiss(&self, handle: NoticeHandle);
}

pub trait ConfirmationPrompt {
    /// Returns the index of the chosen button. `0` confirms.
    fn ask(&self, message: &str, title: &str, detail: &str) -> usize;
}

pub trait Translator {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String;
}

/// Everything the uninstall flow talks to besides the registry and disk.
#[derive(Clone, Copy)]
pub struct PanelServices<'a> {
    pub notifier: &'a dyn NotificationSink,
    pub prompt: &'a dyn ConfirmationPrompt,
    pub translator: &'a dyn Translator,
}

pub mod keys {
    pub const NO_LIVERIES_TO_REMOVE: &str =
        "manager.pages.installed_liveries.notifications.no_liveries_to_remove";
    pub const UNINSTALL_ALL_MESSAGE: &str =
        "manager.pages.installed_liveries.dialog.uninstall_all.message";
    pub const UNINSTALL_ALL_TITLE: &str =
        "manager.pages.installed_liveries.dialog.uninstall_all.title";
    pub const UNINSTALL_ALL_DETAIL: &str =
        "manager.pages.installed_liveries.dialog.uninstall_all.detail";
    pub const REMOVING_LIVERY: &str =
        "manager.pages.installed_liveries.notification.removing_livery";
    pub const REMOVE_ALL_SUCCESS: &str =
        "manager.pages.installed_liveries.notification.remove_all_success";
    pub const REMOVE_ALL_FAILURES: &str =
        "manager.pages.installed_liveries.notification.remove_all_failures";
}

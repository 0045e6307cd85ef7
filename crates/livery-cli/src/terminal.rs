use livery_core::panel::{
    ConfirmationPrompt, Notice, NoticeHandle, NotificationSink, Severity, Translator,
};
use rust_i18n::t;
use std::cell::Cell;
use std::io::{self, BufRead, Write};

/// Prints notifications to stderr.
#[derive(Default)]
pub struct TerminalNotifier {
    next: Cell<u64>,
}

impl NotificationSink for TerminalNotifier {
    fn show(&self, message: &str, notice: Notice<'_>) -> NoticeHandle {
        let tag = match notice.severity {
            Severity::Default => "",
            Severity::Info => "[..] ",
            Severity::Success => "[ok] ",
            Severity::Warning => "[!!] ",
            Severity::Error => "[error] ",
        };
        eprintln!("{}{}", tag, message);

        let id = self.next.get();
        self.next.set(id + 1);
        NoticeHandle(id)
    }

    fn dismiss(&self, handle: NoticeHandle) {
        log::trace!("dismiss notice {}", handle.0);
    }
}

/// Asks on stdin. Anything but `y`/`yes` declines.
pub struct TerminalPrompt {
    pub assume_yes: bool,
}

impl ConfirmationPrompt for TerminalPrompt {
    fn ask(&self, message: &str, title: &str, detail: &str) -> usize {
        if self.assume_yes {
            return 0;
        }

        eprintln!("{}\n{}\n{}", title, message, detail);
        eprint!("[y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return 1;
        }
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => 0,
            _ => 1,
        }
    }
}

/// Looks keys up in the bundled locale files and fills `%{name}` placeholders.
pub struct I18nTranslator;

impl Translator for I18nTranslator {
    fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        let mut text = t!(key).to_string();
        for (name, value) in params {
            text = text.replace(&format!("%{{{}}}", name), value);
        }
        text
    }
}

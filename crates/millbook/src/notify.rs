//! Notices on stderr.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;

use millbook_core::{Notice, NoticeKind, Notifier};

/// Prints each notice as one line plus an indented description.
///
/// Error notices are skipped: every failed mutation also returns its error
/// to `main`, which renders it as a diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct StderrNotifier {
    quiet: bool,
    color: bool,
}

impl StderrNotifier {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            color: io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    fn format(&self, notice: &Notice) -> String {
        let mark = match notice.kind {
            NoticeKind::Success => "✓",
            NoticeKind::Error => "✗",
            NoticeKind::Info => "•",
        };
        let mut line = match (self.color, notice.kind) {
            (false, _) => format!("{mark} {}", notice.message),
            (true, NoticeKind::Success) => format!("{} {}", mark.green(), notice.message),
            (true, NoticeKind::Error) => format!("{} {}", mark.red(), notice.message.red()),
            (true, NoticeKind::Info) => format!("{} {}", mark.cyan(), notice.message),
        };
        if let Some(ref description) = notice.description {
            line.push_str("\n  ");
            if self.color {
                line.push_str(&description.dimmed().to_string());
            } else {
                line.push_str(description);
            }
        }
        line
    }
}

impl Notifier for StderrNotifier {
    fn notify(&self, notice: Notice) {
        if self.quiet || notice.kind == NoticeKind::Error {
            tracing::debug!(kind = %notice.kind, message = %notice.message, "notice not printed");
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{}", self.format(&notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_format_includes_description() {
        let notifier = StderrNotifier {
            quiet: false,
            color: false,
        };
        let notice = Notice::success("Broker import complete")
            .with_description("3 of 5 rows imported, 2 skipped");
        assert_eq!(
            notifier.format(&notice),
            "✓ Broker import complete\n  3 of 5 rows imported, 2 skipped"
        );
        assert_eq!(
            notifier.format(&Notice::error("Rate must be positive")),
            "✗ Rate must be positive"
        );
    }
}

//! Colored terminal output.
//!
//! Status lines go to stderr, command results to stdout so they can be
//! piped into other tools.

use console::{Style, Term};

/// Terminal output formatter.
pub(crate) struct Output {
    status: Term,
    results: Term,
    styles: Styles,
}

struct Styles {
    ok: Style,
    warn: Style,
    fail: Style,
    title: Style,
    muted: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            status: Term::stderr(),
            results: Term::stdout(),
            styles: Styles {
                ok: Style::new().green(),
                warn: Style::new().yellow(),
                fail: Style::new().red().bold(),
                title: Style::new().cyan().bold(),
                muted: Style::new().dim(),
            },
        }
    }

    fn status_line(&self, style: Option<&Style>, msg: &str) {
        // Terminal write failures are not worth aborting a command for.
        let _ = match style {
            Some(style) => self.status.write_line(&style.apply_to(msg).to_string()),
            None => self.status.write_line(msg),
        };
    }

    pub(crate) fn info(&self, msg: &str) {
        self.status_line(None, msg);
    }

    pub(crate) fn success(&self, msg: &str) {
        self.status_line(Some(&self.styles.ok), msg);
    }

    pub(crate) fn warning(&self, msg: &str) {
        self.status_line(Some(&self.styles.warn), msg);
    }

    pub(crate) fn error(&self, msg: &str) {
        self.status_line(Some(&self.styles.fail), msg);
    }

    /// Document title or section heading.
    pub(crate) fn highlight(&self, msg: &str) {
        self.status_line(Some(&self.styles.title), msg);
    }

    pub(crate) fn separator(&self) {
        self.status_line(Some(&self.styles.muted), &"-".repeat(70));
    }

    /// Print a result line to stdout.
    pub(crate) fn result(&self, msg: &str) {
        let _ = self.results.write_line(msg);
    }

    /// Dimmed text, for secondary details inside result lines.
    pub(crate) fn dimmed(&self, msg: &str) -> String {
        self.styles.muted.apply_to(msg).to_string()
    }
}

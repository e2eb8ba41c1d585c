use crate::span::Span;

/// A compiler diagnostic (error or warning).
///
/// Front-end diagnostics carry a source span and render as full reports
/// against the offending text. The later stages (IR translation, assembly,
/// stdlib loading, I/O) operate on generated text where byte offsets mean
/// nothing; they build spanless diagnostics with [`Diagnostic::stage`],
/// which render as a single plain line naming the failing stage and
/// construct.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
            notes: Vec::new(),
            help: None,
        }
    }

    /// An error from a stage with no source location to point at. The
    /// stage name is folded into the message and the span stays dummy.
    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        Self::error(format!("{}: {}", stage, message.into()), Span::dummy())
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// True when there is no real source position behind this diagnostic.
    pub fn is_spanless(&self) -> bool {
        self.span == Span::dummy()
    }

    /// Render to stderr: a full ariadne report for spanned diagnostics, a
    /// plain line (plus notes and help) for spanless ones.
    pub fn render(&self, filename: &str, source: &str) {
        if self.is_spanless() {
            self.render_plain();
            return;
        }

        use ariadne::{Color, Label, Report, ReportKind, Source};

        let (kind, color) = match self.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };

        let mut report = Report::build(kind, filename, self.span.start as usize)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.start as usize..self.span.end as usize))
                    .with_message(&self.message)
                    .with_color(color),
            );

        for note in &self.notes {
            report = report.with_note(note);
        }

        if let Some(help) = &self.help {
            report = report.with_help(help);
        }

        report
            .finish()
            .eprint((filename, Source::from(source)))
            .ok();
    }

    /// Location-free rendering, used for spanless diagnostics.
    pub fn render_plain(&self) {
        eprintln!("{}: {}", self.severity.label(), self.message);
        for note in &self.notes {
            eprintln!("  note: {}", note);
        }
        if let Some(help) = &self.help {
            eprintln!("  help: {}", help);
        }
    }
}

/// Render a list of diagnostics against one source text.
pub fn render_diagnostics(diagnostics: &[Diagnostic], filename: &str, source: &str) {
    for diag in diagnostics {
        diag.render(filename, source);
    }
}

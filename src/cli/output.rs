use anyhow::Result;
use console::{style, Color, Term};
use dialoguer::{theme::ColorfulTheme, FuzzySelect};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use crate::document::{Position, TextSink};
use crate::pipeline::{Notifier, RunReport};

pub struct OutputFormatter {
    use_colors: bool,
}

/// Transient "working on it" indicator on stderr.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", ""]);

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    pub fn stop(self) {
        self.bar.finish_and_clear();
    }
}

/// Shows pipeline notices on stderr, with a spinner for long waits.
pub struct ConsoleNotifier {
    formatter: OutputFormatter,
    spinner: Mutex<Option<Spinner>>,
}

impl ConsoleNotifier {
    pub fn new(use_colors: bool) -> Self {
        Self {
            formatter: OutputFormatter::new(use_colors),
            spinner: Mutex::new(None),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notice(&self, message: &str) {
        eprintln!("{}", self.formatter.format_warning(message));
    }

    fn begin_progress(&self, message: &str) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(previous) = slot.replace(Spinner::new(message)) {
                previous.stop();
            }
        }
    }

    fn end_progress(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(spinner) = slot.take() {
                spinner.stop();
            }
        }
    }
}

/// Sends generated text straight to stdout.
///
/// Stdout cannot be repositioned, so this sink only works because the
/// pipeline always inserts at the end of what it wrote before.
#[derive(Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl TextSink for StdoutSink {
    fn cursor(&self) -> Position {
        Position::default()
    }

    fn insert_at(&mut self, text: &str, _at: Position) {
        let mut stdout = io::stdout().lock();
        if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
            log::warn!("Failed to write to stdout: {e}");
        }
    }
}

impl OutputFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn is_interactive() -> bool {
        Term::stdout().is_term()
    }

    // ========================================================================
    // Template picker
    // ========================================================================

    /// Fuzzy-search picker over template names. `None` when there is nothing
    /// to pick from or the user backs out.
    pub fn pick_template(&self, names: &[String]) -> Result<Option<String>> {
        if names.is_empty() {
            return Ok(None);
        }

        let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
            .with_prompt("Prompt template")
            .items(names)
            .default(0)
            .interact_opt()?;

        Ok(selection.map(|index| names[index].clone()))
    }

    pub fn format_templates(&self, names: &[String]) -> String {
        if names.is_empty() {
            return self.format_info("No prompt templates found");
        }

        names
            .iter()
            .map(|name| self.style_text(name, Color::Green))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn format_report(&self, report: &RunReport, note: &Path) -> String {
        self.format_success(&format!(
            "Inserted {} characters into {} at {}",
            report.inserted_chars,
            note.display(),
            report.start
        ))
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.style_text("Error:", Color::Red), message)
    }

    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.style_text("✓", Color::Green), message)
    }

    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.style_text("⚠", Color::Yellow), message)
    }

    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.style_text("ℹ", Color::Blue), message)
    }

    fn style_text(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            style(text).fg(color).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_formatting() {
        let formatter = OutputFormatter::new(false);
        assert_eq!(formatter.format_error("boom"), "Error: boom");
        assert_eq!(formatter.format_warning("careful"), "⚠ careful");
        assert_eq!(
            formatter.format_templates(&["a".to_string(), "b/c".to_string()]),
            "a\nb/c"
        );
        assert_eq!(formatter.format_templates(&[]), "ℹ No prompt templates found");
    }

    #[test]
    fn test_pick_from_nothing_does_not_prompt() {
        let formatter = OutputFormatter::new(false);
        assert_eq!(formatter.pick_template(&[]).unwrap(), None);
    }
}

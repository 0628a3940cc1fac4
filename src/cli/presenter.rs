//! CLI presenter for output formatting

use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::message::Message;
use crate::domain::recording::format_clock;
use crate::domain::visualizer::{Bar, BAR_COUNT};

const BAR_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Tallest bar a byte-scaled level can produce
const MAX_BAR_HEIGHT_PX: f32 = 255.0 / 2.0;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.red} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Update spinner message
    pub fn update_spinner(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Stop spinner without status
    pub fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        self.println_err(format!("{} {}", "ℹ".cyan(), message));
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        self.println_err(format!("{} {}", "✓".green(), message));
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        self.println_err(format!("{} {}", "⚠".yellow(), message));
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        self.println_err(format!("{} {}", "✗".red(), message));
    }

    // keeps a running spinner from being overwritten mid-line
    fn println_err(&self, line: String) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
            None => eprintln!("{}", line),
        }
    }

    /// Output text to stdout (ids, paths, message lines)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// One line of `voxroom list`
    pub fn format_message(&self, message: &Message) -> String {
        let mut line = format!("{} {}:", message.id.as_str().dimmed(), message.author.bold());
        if message.has_clip() {
            line.push_str(&format!(" {}", format!("[voice {}]", message.duration_label()).cyan()));
        }
        if !message.text.is_empty() {
            line.push(' ');
            line.push_str(&message.text);
        }
        line
    }

    /// Render visualizer bars as block glyphs
    pub fn format_bars(&self, bars: &[Bar; BAR_COUNT]) -> String {
        bars.iter()
            .map(|bar| {
                let level = (bar.height_px / MAX_BAR_HEIGHT_PX).clamp(0.0, 1.0);
                let index = (level * (BAR_GLYPHS.len() - 1) as f32).round() as usize;
                BAR_GLYPHS[index.min(BAR_GLYPHS.len() - 1)]
            })
            .collect()
    }

    /// Status line shown while capturing
    pub fn format_recording_status(
        &self,
        bars: &[Bar; BAR_COUNT],
        elapsed_secs: u64,
        locked: bool,
        lock_available: bool,
    ) -> String {
        let hint = if locked {
            "locked · Enter send · c cancel"
        } else if lock_available {
            "Enter send · l lock · c cancel"
        } else {
            "Enter send · c cancel"
        };
        format!(
            "{} {} {}",
            format_clock(elapsed_secs).bold(),
            self.format_bars(bars).red(),
            hint.dimmed()
        )
    }

    /// Update the recording spinner
    pub fn update_recording_status(
        &self,
        bars: &[Bar; BAR_COUNT],
        elapsed_secs: u64,
        locked: bool,
        lock_available: bool,
    ) {
        self.update_spinner(&self.format_recording_status(bars, elapsed_secs, locked, lock_available));
    }

    /// Percent bar for one playing clip
    pub fn playback_bar(&self, label: &str, total: Option<Duration>) -> ProgressBar {
        let bar = ProgressBar::new(100);
        if let Ok(style) =
            ProgressStyle::with_template("{prefix} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
        {
            bar.set_style(style.progress_chars("█▓░"));
        }
        bar.set_prefix(label.to_string());
        if let Some(total) = total {
            bar.set_message(format_clock(total.as_secs()));
        }
        bar
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clip::ClipRef;
    use crate::domain::message::MessageId;
    use crate::domain::visualizer::bars_from_levels;

    fn message(text: &str, clip: bool) -> Message {
        Message {
            id: MessageId::new("abc"),
            text: text.to_string(),
            clip: clip.then(|| ClipRef::parse("clips/abc.flac").unwrap()),
            duration_secs: 65,
            author: "ana".to_string(),
            timestamp_ms: 1,
        }
    }

    #[test]
    fn silent_bars_render_lowest_glyph() {
        let presenter = Presenter::new();
        let bars = bars_from_levels(&[]);
        assert_eq!(presenter.format_bars(&bars), "▁".repeat(BAR_COUNT));
    }

    #[test]
    fn loud_bars_render_full_glyph() {
        let presenter = Presenter::new();
        let bars = bars_from_levels(&[255; BAR_COUNT]);
        assert_eq!(presenter.format_bars(&bars), "█".repeat(BAR_COUNT));
    }

    #[test]
    fn recording_status_shows_clock_and_hint() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let bars = bars_from_levels(&[]);
        let status = presenter.format_recording_status(&bars, 7, false, true);
        assert!(status.starts_with("0:07"));
        assert!(status.contains("l lock"));

        let locked = presenter.format_recording_status(&bars, 7, true, true);
        assert!(locked.contains("locked"));
    }

    #[test]
    fn message_line_includes_voice_label() {
        colored::control::set_override(false);
        let presenter = Presenter::new();
        let line = presenter.format_message(&message("hi", true));
        assert!(line.contains("[voice 1:05]"));
        assert!(line.ends_with("hi"));

        let text_only = presenter.format_message(&message("plain", false));
        assert!(!text_only.contains("voice"));
    }
}

//! Spinners shown while a registry or report file is being read or written

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Start a spinner labelled with the file it works on, e.g. `Loading avs_registry.csv...`
pub fn file_spinner(action: &str, path: &Path) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("    {spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(TICK_CHARS),
    );
    pb.set_message(file_message(action, path));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn file_message(action: &str, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("{} {}...", action, name)
}

/// `1 record`, `3 records`
pub fn record_count(n: usize) -> String {
    if n == 1 {
        "1 record".to_string()
    } else {
        format!("{} records", n)
    }
}

/// Finish with what was done and how many records it touched
pub fn finish_with_records(pb: &ProgressBar, action: &str, n: usize) {
    finish_with_success(pb, &format!("{} {}", action, record_count(n)));
}

pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("✅ {}", message));
}

pub fn finish_with_warning(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("⚠️  {}", message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_message_uses_file_name() {
        assert_eq!(
            file_message("Loading", Path::new("data/avs/avs_registry.csv")),
            "Loading avs_registry.csv..."
        );
    }

    #[test]
    fn test_record_count() {
        assert_eq!(record_count(0), "0 records");
        assert_eq!(record_count(1), "1 record");
        assert_eq!(record_count(12), "12 records");
    }

    #[test]
    fn test_finish_with_records() {
        let pb = ProgressBar::hidden();
        finish_with_records(&pb, "Exported", 1);
        assert_eq!(pb.message(), "✅ Exported 1 record");
        assert!(pb.is_finished());
    }
}

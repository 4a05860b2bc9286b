use std::path::Path;

use colored::Colorize;

use crate::error::RandimgError;

/// Terminal output for the end of a run
pub struct Render {
    verbose: bool,
}

impl Render {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Only shown with `--verbose`; a quiet successful run prints nothing.
    pub fn success_download(&self, path: &Path, bytes: usize, count: usize, limit: usize) {
        if !self.verbose {
            return;
        }
        println!(
            "\n {} Saved {} {}",
            "✔".green(),
            path.display().to_string().bold(),
            format!("({})", human_size(bytes)).dimmed()
        );
        println!(
            "   {}",
            format!("{count} of {limit} requests used this window").dimmed()
        );
    }

    pub fn rate_limited(&self, message: &str) {
        eprintln!("\n {} {}", "⚠".yellow(), message.yellow());
    }

    pub fn error(&self, err: &RandimgError) {
        eprintln!("\n {} {}", "✖".red(), err);
    }
}

fn human_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[0])
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output helpers shared by commands.

use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> OutputFormat {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Format elapsed seconds as a compact age ("5s", "2m", "1h", "3d").
pub fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

/// Relative age of an RFC 3339 timestamp, "-" when absent.
pub fn format_time_ago(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    match ts {
        Some(ts) => {
            let elapsed = chrono::Utc::now().signed_duration_since(ts);
            format_elapsed(elapsed.num_seconds().max(0) as u64)
        }
        None => "-".to_string(),
    }
}

/// Print a captured pane with distinct framing.
pub fn print_capture_frame(label: &str, output: &str) {
    println!("╭──── peek: {label} ────");
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    println!("╰──── end peek ────");
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

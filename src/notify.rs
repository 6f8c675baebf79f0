use std::fmt;

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Severity {
    #[default]
    Default,
    Success,
    Warning,
    Destructive,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Default => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Destructive => "error",
        })
    }
}

/// User-facing notification port, injected wherever an action can fail.
pub trait Notifier {
    fn notify(&self, title: &str, body: &str, severity: Severity);
}

/// Routes notifications into the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, title: &str, body: &str, severity: Severity) {
        match severity {
            Severity::Destructive => error!(%title, "{body}"),
            Severity::Warning => warn!(%title, "{body}"),
            Severity::Default | Severity::Success => info!(%title, %severity, "{body}"),
        }
    }
}

/// Human-readable size for the "File Selected" notice.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} bytes")
    } else if bytes < 1_048_576 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sizes_pick_the_right_unit() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(3 * 1_048_576), "3.0 MB");
    }
}

//! Countdown formatting utilities.
//!
//! All remaining-time display text goes through this module so the CLI and
//! any other renderer show the same annotation.

/// Format whole seconds remaining for compact display.
///
/// - Values >= 60s: `M:SS`
/// - Values < 60s: `Ns`
///
/// # Examples
/// ```
/// use marquee_types::formatting::format_remaining;
/// assert_eq!(format_remaining(5), "5s");
/// assert_eq!(format_remaining(59), "59s");
/// assert_eq!(format_remaining(60), "1:00");
/// assert_eq!(format_remaining(125), "2:05");
/// ```
pub fn format_remaining(secs: u32) -> String {
    if secs >= 60 {
        format!("{}:{:02}", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Format the auto-expiry annotation shown next to a timed banner.
///
/// # Examples
/// ```
/// use marquee_types::formatting::format_auto_close_label;
/// assert_eq!(format_auto_close_label(4), "Auto-closes in 4s");
/// assert_eq!(format_auto_close_label(90), "Auto-closes in 1:30");
/// ```
pub fn format_auto_close_label(secs: u32) -> String {
    format!("Auto-closes in {}", format_remaining(secs))
}

//! Shared CLI presentation utilities.
//!
//! Format-only helpers; nothing here touches the engine.

use std::io::{self, Write};
use std::time::Duration;

/// Truncate `s` to at most `max` characters, marking the cut with `…`.
#[must_use]
pub fn truncate_string(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Render a duration as seconds with one decimal (`"1.4s"`).
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}

/// Write a horizontal rule of `width` dashes.
pub fn write_separator(out: &mut impl Write, width: usize) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_are_untouched() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
    }

    #[test]
    fn long_strings_are_cut_on_char_boundaries() {
        assert_eq!(truncate_string("Ünïcödé text", 6), "Ünïcö…");
    }

    #[test]
    fn durations_render_in_seconds() {
        assert_eq!(format_duration(Duration::from_millis(1375)), "1.4s");
        assert_eq!(format_duration(Duration::from_millis(400)), "0.4s");
    }

    #[test]
    fn separator_has_requested_width() {
        let mut out = Vec::new();
        write_separator(&mut out, 4).unwrap();
        assert_eq!(out, b"----\n");
    }
}

//! Resolver for operator-authored input source descriptors.
//!
//! Descriptors are hand-typed into the device configuration, so common
//! variants are accepted: a leading `!` inverts polarity, a `gpio`/`pio`
//! prefix in any casing is dropped, and stray whitespace or `:` separators
//! are forgiven ("!GPIO 12", "! pio:12" and "!12" all name line "12").

use alloc::string::String;

use crate::services::{GpioBank, GpioError};

/// Longest line name kept after whitespace compaction; excess is truncated.
pub const MAX_LINE_NAME: usize = 63;

/// A descriptor reduced to a lookup key and an effective polarity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDescriptor {
    pub key: String,
    pub active_low: bool,
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let n = prefix.len();
    if s.len() >= n && s.is_char_boundary(n) && s[..n].eq_ignore_ascii_case(prefix) {
        Some(&s[n..])
    } else {
        None
    }
}

/// Normalize a raw descriptor. Pure; never touches hardware.
pub fn parse_descriptor(raw: &str, default_active_low: bool) -> ParsedDescriptor {
    let mut rest = raw.trim_start();
    let mut active_low = default_active_low;

    if let Some(stripped) = rest.strip_prefix('!') {
        active_low = !default_active_low;
        rest = stripped.trim_start();
    }

    let had_prefix = if let Some(stripped) = strip_prefix_ignore_case(rest, "gpio") {
        rest = stripped;
        true
    } else if let Some(stripped) = strip_prefix_ignore_case(rest, "pio") {
        rest = stripped;
        true
    } else {
        false
    };

    if had_prefix {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ':');
    }

    let key = if rest.chars().any(char::is_whitespace) {
        let compact: String = rest
            .chars()
            .filter(|c| !c.is_whitespace())
            .take(MAX_LINE_NAME)
            .collect();
        if compact.is_empty() {
            String::from(rest)
        } else {
            compact
        }
    } else {
        String::from(rest)
    };

    ParsedDescriptor { key, active_low }
}

/// Resolve a descriptor into a claimed, input-configured line.
///
/// The only side effect is the single claim; if input configuration fails
/// the line is released before the error is returned, so no handle leaks.
///
/// # Errors
/// `NotFound`/`Busy` from the claim, `ConfigFailed` from input setup.
pub fn resolve_gpio<G: GpioBank>(
    bank: &mut G,
    raw: &str,
    default_active_low: bool,
) -> Result<G::Line, GpioError> {
    let parsed = parse_descriptor(raw, default_active_low);
    let mut line = bank.acquire(&parsed.key)?;
    if let Err(err) = bank.configure_input(&mut line, parsed.active_low) {
        bank.release(line);
        return Err(err);
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_services::MockGpio;
    use crate::services::GpioErrorKind;

    #[test]
    fn plain_name_passes_through_verbatim() {
        let parsed = parse_descriptor("reset", true);
        assert_eq!(parsed.key, "reset");
        assert!(parsed.active_low);
    }

    #[test]
    fn leading_whitespace_is_stripped() {
        let parsed = parse_descriptor("  \treset", true);
        assert_eq!(parsed.key, "reset");
    }

    #[test]
    fn inversion_marker_flips_default_polarity() {
        for raw in ["!GPIO 12", "! pio:12", "!12"] {
            let parsed = parse_descriptor(raw, true);
            assert_eq!(parsed.key, "12", "descriptor {:?}", raw);
            assert!(!parsed.active_low, "descriptor {:?}", raw);

            let parsed = parse_descriptor(raw, false);
            assert_eq!(parsed.key, "12", "descriptor {:?}", raw);
            assert!(parsed.active_low, "descriptor {:?}", raw);
        }
    }

    #[test]
    fn gpio_prefix_is_case_insensitive() {
        assert_eq!(parse_descriptor("GpIo4", true).key, "4");
        assert_eq!(parse_descriptor("PIO:7", true).key, "7");
        assert_eq!(parse_descriptor("gpio: 18", true).key, "18");
    }

    #[test]
    fn prefix_only_consumed_at_the_front() {
        // No prefix, no whitespace: the key is the trimmed input itself.
        assert_eq!(parse_descriptor("mygpio", true).key, "mygpio");
    }

    #[test]
    fn embedded_whitespace_is_compacted() {
        assert_eq!(parse_descriptor("gpio 1 2", true).key, "12");
        assert_eq!(parse_descriptor("1\t2 3", true).key, "123");
    }

    #[test]
    fn compacted_key_is_truncated_to_max() {
        let raw: String = core::iter::repeat("a ").take(80).collect();
        let parsed = parse_descriptor(&raw, true);
        assert_eq!(parsed.key.len(), MAX_LINE_NAME);
    }

    #[test]
    fn resolve_claims_and_configures_line() {
        let mut gpio = MockGpio::new();
        gpio.add_line("12");

        let line = resolve_gpio(&mut gpio, "!gpio 12", true).unwrap();
        assert_eq!(gpio.outstanding(), 1);
        assert_eq!(gpio.configured_polarity("12"), Some(false));
        gpio.release(line);
        assert_eq!(gpio.outstanding(), 0);
    }

    #[test]
    fn resolve_unknown_name_reports_not_found() {
        let mut gpio = MockGpio::new();
        let err = resolve_gpio(&mut gpio, "nope", true).unwrap_err();
        assert_eq!(err.kind, GpioErrorKind::NotFound);
        assert_eq!(gpio.outstanding(), 0);
    }

    #[test]
    fn line_can_be_resolved_again_after_release() {
        let mut gpio = MockGpio::new();
        gpio.add_line("7");

        let line = resolve_gpio(&mut gpio, "7", true).unwrap();
        gpio.release(line);
        let line = resolve_gpio(&mut gpio, "7", true).unwrap();
        gpio.release(line);

        assert_eq!(gpio.release_count("7"), 2);
        assert_eq!(gpio.stray_releases(), 0);
        assert_eq!(gpio.outstanding(), 0);
    }

    #[test]
    fn resolve_releases_line_when_configuration_fails() {
        let mut gpio = MockGpio::new();
        gpio.add_line("9");
        gpio.fail_configure("9", -5);

        let err = resolve_gpio(&mut gpio, "9", true).unwrap_err();
        assert_eq!(err.kind, GpioErrorKind::ConfigFailed);
        assert_eq!(err.code, -5);
        assert_eq!(gpio.outstanding(), 0);
        assert_eq!(gpio.release_count("9"), 1);
    }
}

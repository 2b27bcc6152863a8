//! Tracking code generation.
//!
//! Codes look like `SHP-MGX3K2Q1-2S9`: a prefix, the creation time in
//! milliseconds and a small random number, both in upper-case base 36.

use chrono::{DateTime, Utc};
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "SHP";

/// Range of the short random component.
const SHORT_SUFFIX_RANGE: std::ops::Range<u32> = 1000..10_000;

/// Length of the random component of a fallback code.
const WIDE_SUFFIX_LEN: usize = 12;

const BASE36_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]{1,8}$").unwrap());

/// Encodes `value` in upper-case base 36.
pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8(digits).unwrap_or_default()
}

fn time_component(now: DateTime<Utc>) -> String {
    to_base36(u64::try_from(now.timestamp_millis()).unwrap_or(0))
}

/// Generates a compact tracking code: `<prefix>-<millis36>-<rand36>`.
///
/// The random component has only 9000 possible values, so callers must check
/// the result against the codes already in use.
pub fn generate_tracking_code(prefix: &str, now: DateTime<Utc>) -> String {
    let suffix = rand::rng().random_range(SHORT_SUFFIX_RANGE);
    format!("{prefix}-{}-{}", time_component(now), to_base36(suffix.into()))
}

/// Generates a tracking code with a 12-character random component.
///
/// Used once the compact form keeps colliding.
pub fn generate_wide_tracking_code(prefix: &str, now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..WIDE_SUFFIX_LEN)
        .map(|_| BASE36_ALPHABET[rng.random_range(0..BASE36_ALPHABET.len())] as char)
        .collect();
    format!("{prefix}-{}-{suffix}", time_component(now))
}

/// Source of candidate tracking codes for the registry.
#[cfg_attr(test, mockall::automock)]
pub trait CodeGenerator: Send + Sync {
    /// A code in the compact form.
    fn compact(&self, prefix: &str, now: DateTime<Utc>) -> String;

    /// A code with the wide random component.
    fn wide(&self, prefix: &str, now: DateTime<Utc>) -> String;
}

/// [`CodeGenerator`] backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn compact(&self, prefix: &str, now: DateTime<Utc>) -> String {
        generate_tracking_code(prefix, now)
    }

    fn wide(&self, prefix: &str, now: DateTime<Utc>) -> String {
        generate_wide_tracking_code(prefix, now)
    }
}

/// Returns true if `prefix` is 1-8 upper-case ASCII letters or digits.
pub fn is_valid_prefix(prefix: &str) -> bool {
    PREFIX_REGEX.is_match(prefix)
}

use thiserror::Error;

/// Configuration errors.
///
/// These are raised only at the configuration boundary. Once a generator is
/// built, stepping it never fails: overflow is dropped and degenerate
/// geometry falls back to a deterministic default.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A `[lo, hi]` remap range with `hi <= lo` or a negative bound.
    #[error("invalid range `{name}`: [{lo}, {hi}] (need 0 <= lo < hi)")]
    InvalidRange { name: &'static str, lo: f32, hi: f32 },

    /// A scalar outside its allowed interval.
    #[error("`{name}` = {value} is out of range ({expected})")]
    OutOfRange {
        name: &'static str,
        value: f32,
        expected: &'static str,
    },

    #[error("invalid capacity {0}: must be in 1..=i32::MAX")]
    InvalidCapacity(usize),

    #[error("`{0}` must be finite")]
    NonFinite(&'static str),

    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config serialize error: {0}")]
    Serialize(String),
}

pub type FoamResult<T> = Result<T, ConfigError>;

/*!
Small standalone helpers shared across the crate.
*/
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{CoreError, Result};

lazy_static! {
    static ref S3A: Regex = Regex::new("s3a://\\w*/").unwrap();
    static ref S3: Regex = Regex::new("s3://\\w*/").unwrap();
    static ref GS: Regex = Regex::new("gs://\\w*/").unwrap();
    static ref DURATION: Regex = Regex::new(r#"^(?P<n>\d+)\s*(?P<unit>ms|s|min|h|d)$"#).unwrap();
}

/// Strip a bucket-scheme prefix (`s3://`, `s3a://`, `gs://`) from a path.
pub fn strip_prefix(path: &str) -> String {
    if path.starts_with("s3a://") {
        S3A.replace(path, "").to_string()
    } else if path.starts_with("s3://") {
        S3.replace(path, "").to_string()
    } else if path.starts_with("gs://") {
        GS.replace(path, "").to_string()
    } else {
        path.to_owned()
    }
}

/// Parse a duration string such as `"2 d"`, `"1h"`, `"30min"` into a [`Duration`].
///
/// Recognised units: `ms`, `s`, `min`, `h`, `d`.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let trimmed: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let caps = DURATION
        .captures(&trimmed)
        .ok_or_else(|| CoreError::ConfigError(format!("invalid duration: {input}")))?;
    let n: u64 = caps["n"]
        .parse()
        .map_err(|_| CoreError::ConfigError(format!("invalid duration: {input}")))?;
    let duration = match &caps["unit"] {
        "ms" => Duration::from_millis(n),
        "s" => Duration::from_secs(n),
        "min" => Duration::from_secs(n * 60),
        "h" => Duration::from_secs(n * 3600),
        "d" => Duration::from_secs(n * 86400),
        _ => unreachable!(),
    };
    Ok(duration)
}

use crate::classifier::HeuristicConfig;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

/// Members enumerated per scan when the caller does not say otherwise.
pub const DEFAULT_CAP: usize = 200;

/// Upper bound accepted for a cap, to keep a single scan from walking huge rosters.
pub const MAX_CAP: usize = 100_000;

/// Parse heuristic thresholds from JSON. Missing fields take their defaults.
///
/// ```json
/// {"username_digit_run": 8, "fake_score": 3}
/// ```
pub fn parse_heuristics_str(s: &str) -> Result<HeuristicConfig> {
    let config: HeuristicConfig =
        serde_json::from_str(s).context("invalid heuristics JSON")?;
    config.validate()?;
    Ok(config)
}

/// Load heuristic thresholds from a file path. Errors if the file cannot be read or parsed.
pub fn load_heuristics_from_path(path: impl AsRef<Path>) -> Result<HeuristicConfig> {
    let content = fs::read_to_string(path.as_ref()).with_context(|| {
        format!("failed to read heuristics file: {}", path.as_ref().display())
    })?;
    parse_heuristics_str(&content)
        .with_context(|| format!("in heuristics file: {}", path.as_ref().display()))
}

/// Parse a member cap, accepting `1..=MAX_CAP`.
pub fn parse_cap(s: &str) -> Result<usize> {
    let cap: usize = s
        .trim()
        .parse()
        .with_context(|| format!("invalid cap: {s}"))?;
    if cap == 0 || cap > MAX_CAP {
        bail!("cap out of range (1..={MAX_CAP}): {cap}");
    }
    Ok(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let c = parse_heuristics_str(r#"{"username_digit_run": 8}"#).unwrap();
        assert_eq!(c.username_digit_run, 8);
        assert_eq!(c.fake_score, 3);
        assert_eq!(c.username_max_len, 25);
    }

    #[test]
    fn invalid_values_error() {
        assert!(parse_heuristics_str(r#"{"name_digit_run": 0}"#).is_err());
        assert!(parse_heuristics_str(r#"{"suspicious_score": 5}"#).is_err());
        assert!(parse_heuristics_str("not json").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"fake_score": 4}}"#).unwrap();
        let c = load_heuristics_from_path(f.path()).unwrap();
        assert_eq!(c.fake_score, 4);
    }

    #[test]
    fn cap_bounds() {
        assert_eq!(parse_cap(" 50 ").unwrap(), 50);
        assert!(parse_cap("0").is_err());
        assert!(parse_cap("-3").is_err());
        assert!(parse_cap("100001").is_err());
    }
}

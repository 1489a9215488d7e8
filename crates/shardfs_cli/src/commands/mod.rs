//! CLI command implementations.

pub mod status;
pub mod write;

/// Parses octal permission bits such as `644` or `0o644`.
pub fn parse_mode(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("0o").unwrap_or(s);
    let mode = u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode {s:?}: {e}"))?;
    if mode > 0o7777 {
        return Err(format!("mode {s} out of range"));
    }
    Ok(mode)
}

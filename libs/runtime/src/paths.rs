use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// Resolve the application home directory.
///
/// `explicit` comes from configuration and may start with `~`; an empty or
/// missing value falls back to `<user home>/<default_subdir>`. With `create`
/// the directory (and parents) are created when missing.
pub fn resolve_home_dir(
    explicit: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let resolved = match explicit {
        Some(raw) if !raw.trim().is_empty() => expand_user(raw.trim())?,
        _ => user_home()?.join(default_subdir),
    };

    if create {
        std::fs::create_dir_all(&resolved)
            .with_context(|| format!("failed to create home dir {}", resolved.display()))?;
    }
    Ok(resolved)
}

fn expand_user(raw: &str) -> Result<PathBuf> {
    if let Some(rest) = raw.strip_prefix('~') {
        let rest = rest.trim_start_matches(['/', '\\']);
        return Ok(user_home()?.join(rest));
    }
    Ok(PathBuf::from(raw))
}

fn user_home() -> Result<PathBuf> {
    // Windows: %APPDATA%; Unix/macOS: $HOME
    #[cfg(windows)]
    let var = "APPDATA";
    #[cfg(not(windows))]
    let var = "HOME";

    std::env::var_os(var)
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("{var} is not set; cannot resolve a home directory"))
}

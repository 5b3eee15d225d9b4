//! Version information with embedded git metadata.

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

const GIT_BRANCH: &str = match option_env!("VERGEN_GIT_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};

const GIT_SHA: &str = match option_env!("VERGEN_GIT_SHA") {
    Some(sha) => sha,
    None => "unknown",
};

/// Full version string for startup log lines and `--version` output:
/// `{version} ({branch}@{sha})`, with a `+` suffix when the working
/// tree was dirty at build time.
pub fn version_string() -> String {
    let dirty = if option_env!("VERGEN_GIT_DIRTY") == Some("true") {
        "+"
    } else {
        ""
    };
    let short_sha = &GIT_SHA[..7.min(GIT_SHA.len())];
    format!("{PKG_VERSION} ({GIT_BRANCH}@{short_sha}{dirty})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_contains_pkg_version() {
        assert!(version_string().starts_with(PKG_VERSION));
    }

    #[test]
    fn version_string_names_the_branch() {
        assert!(version_string().contains(GIT_BRANCH));
    }
}

pub const APP_NAME: &str = "Lot Value Scanner";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_TAG: Option<&str> = option_env!("GIT_TAG");

/// Release tag when built from a tagged checkout, otherwise the crate version.
pub fn version_label() -> String {
    if let Some(tag) = GIT_TAG {
        tag.to_string()
    } else {
        format!("v{}", APP_VERSION)
    }
}

/// User agent sent with outbound HTTP requests.
pub fn user_agent() -> String {
    format!("{}/{}", APP_NAME, version_label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_names_app_and_version() {
        let agent = user_agent();
        assert!(agent.starts_with("Lot Value Scanner/"));
        assert!(agent.ends_with(&version_label()));
        assert!(!agent.contains("github.com"));
    }
}

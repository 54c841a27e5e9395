/// Application-level constants
pub const APP_NAME: &str = "rxlens";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "rxlens=info"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_rxlens() {
        assert_eq!(APP_NAME, "rxlens");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_filter_targets_this_crate() {
        assert!(default_log_filter().starts_with(APP_NAME));
    }
}

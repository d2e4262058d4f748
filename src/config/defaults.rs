//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn title() -> String {
        "My Site".into()
    }

    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn email() -> String {
        "user@noreply.quire".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [content] Section Defaults
// ============================================================================

pub mod content {
    use std::path::PathBuf;

    pub fn dir() -> PathBuf {
        "content".into()
    }

    pub fn extensions() -> Vec<String> {
        ["md", "markdown", "mdown", "mkd"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn per_page() -> usize {
        crate::content::DEFAULT_PER_PAGE
    }
}

// ============================================================================
// [cache] Section Defaults
// ============================================================================

pub mod cache {
    /// One hour, in seconds.
    pub fn ttl() -> u64 {
        3600
    }
}

// ============================================================================
// [feed] Section Defaults
// ============================================================================

pub mod feed {
    pub fn limit() -> usize {
        20
    }

    pub fn path_prefix() -> String {
        "writing".into()
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        5277
    }

    pub fn workers() -> usize {
        4
    }
}

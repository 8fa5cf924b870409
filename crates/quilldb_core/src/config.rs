//! Store open configuration.

/// Configuration for opening a file-backed store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to error if the store already exists.
    pub error_if_exists: bool,

    /// Whether to open the store read-only.
    pub read_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            read_only: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to error if the store exists.
    #[must_use]
    pub const fn error_if_exists(mut self, value: bool) -> Self {
        self.error_if_exists = value;
        self
    }

    /// Sets whether to open read-only.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.create_if_missing);
        assert!(!config.error_if_exists);
        assert!(!config.read_only);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .create_if_missing(false)
            .error_if_exists(true)
            .read_only(true);

        assert!(!config.create_if_missing);
        assert!(config.error_if_exists);
        assert!(config.read_only);
    }
}

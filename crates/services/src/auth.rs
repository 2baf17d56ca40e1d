use std::env;

/// Default master password of existing installations.
pub const DEFAULT_MASTER_PASSWORD: &str = "admin";

/// Gate in front of the quiz; decides whether a secret unlocks it.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, secret: &str) -> bool;
}

/// Plain comparison against one shared secret.
///
/// A convenience lock for a shared machine, not access control.
#[derive(Clone)]
pub struct MasterPassword {
    secret: String,
}

impl MasterPassword {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Secret from `QUIZ_MASTER_PASSWORD`, falling back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let secret = env::var("QUIZ_MASTER_PASSWORD")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MASTER_PASSWORD.into());
        Self::new(secret)
    }
}

impl Default for MasterPassword {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_PASSWORD)
    }
}

impl Authenticator for MasterPassword {
    fn authenticate(&self, secret: &str) -> bool {
        secret == self.secret
    }
}

impl std::fmt::Debug for MasterPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterPassword").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_secret_unlocks() {
        let gate = MasterPassword::default();
        assert!(gate.authenticate("admin"));
        assert!(!gate.authenticate("Admin"));
        assert!(!gate.authenticate(""));
    }

    #[test]
    fn configured_secret_replaces_default() {
        let gate = MasterPassword::new("s3cret");
        assert!(gate.authenticate("s3cret"));
        assert!(!gate.authenticate("admin"));
        assert_eq!(format!("{gate:?}"), "MasterPassword { .. }");
    }
}

//! Named feature gates toggled from the command line.

/// Adds the `Docker-Content-Digest` response header to blob and manifest PUT
/// responses for clients that still expect it.
pub const SEND_LEGACY_DIGEST_HEADER: &str = "SendLegacyDigestHeader";

pub const KNOWN_FEATURES: &[&str] = &[SEND_LEGACY_DIGEST_HEADER];

#[derive(Clone, Debug, Default)]
pub struct FeatureGates {
    enabled: Vec<String>,
}

impl FeatureGates {
    pub fn new(enabled: Vec<String>) -> Self {
        for gate in &enabled {
            if !KNOWN_FEATURES.contains(&gate.as_str()) {
                tracing::warn!(feature = %gate, "ignoring unknown feature gate");
            }
        }
        FeatureGates { enabled }
    }

    pub fn enabled(&self, feature: &str) -> bool {
        self.enabled.iter().any(|gate| gate == feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_by_default() {
        let gates = FeatureGates::default();
        assert!(!gates.enabled(SEND_LEGACY_DIGEST_HEADER));
    }

    #[test]
    fn enabled_when_named() {
        let gates = FeatureGates::new(vec![SEND_LEGACY_DIGEST_HEADER.to_string()]);
        assert!(gates.enabled(SEND_LEGACY_DIGEST_HEADER));
        assert!(!gates.enabled("SomethingElse"));
    }
}

use std::path::PathBuf;

use clap::Parser;

use crate::features::FeatureGates;

pub const DEFAULT_MAX_MANIFEST_BYTES: u64 = 8 * 1024 * 1024;

#[derive(Parser, Debug)]
#[command(version, about = "Content-addressed OCI container image registry", long_about = None)]
pub struct Args {
    /// Host to bind to
    #[arg(long = "listen-host", default_value = "0.0.0.0")]
    pub listen_host: String,

    /// Port to bind to
    #[arg(long = "listen-port", short = 'p', default_value_t = 8080)]
    pub listen_port: u16,

    /// Directory for storing all data
    #[arg(long = "data-dir", default_value = "data")]
    pub data_dir: PathBuf,

    /// Certificate file for serving HTTPS
    #[arg(long = "tls-cert-file")]
    pub tls_cert_file: Option<PathBuf>,

    /// Key file for serving HTTPS
    #[arg(long = "tls-key-file")]
    pub tls_key_file: Option<PathBuf>,

    /// Number for the log level verbosity (higher is more verbose)
    #[arg(long, short = 'v', default_value_t = 0)]
    pub verbosity: u8,

    /// A set of feature gate names to enable
    #[arg(long = "feature-gates", value_delimiter = ',')]
    pub feature_gates: Vec<String>,

    /// Upper bound on accepted manifest body size in bytes
    #[arg(long = "max-manifest-bytes", default_value_t = DEFAULT_MAX_MANIFEST_BYTES)]
    pub max_manifest_bytes: u64,
}

/// The request-handling slice of the configuration. Bind address, data
/// directory and TLS material are consumed by `main` before the router is
/// built and never reach the handlers.
#[derive(Clone, Debug)]
pub struct Config {
    pub max_manifest_bytes: u64,
    pub features: FeatureGates,
}

impl Config {
    pub fn new(max_manifest_bytes: u64, features: FeatureGates) -> Self {
        Config {
            max_manifest_bytes,
            features,
        }
    }

    pub fn from_args(args: &Args) -> Self {
        Config::new(
            args.max_manifest_bytes,
            FeatureGates::new(args.feature_gates.clone()),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_MAX_MANIFEST_BYTES, FeatureGates::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["depot"]);
        assert_eq!(args.listen_host, "0.0.0.0");
        assert_eq!(args.listen_port, 8080);
        assert_eq!(args.data_dir, PathBuf::from("data"));
        assert_eq!(args.max_manifest_bytes, DEFAULT_MAX_MANIFEST_BYTES);
        assert!(args.feature_gates.is_empty());
    }

    #[test]
    fn feature_gates_parse_as_list() {
        let args = Args::parse_from(["depot", "--feature-gates", "SendLegacyDigestHeader"]);
        let config = Config::from_args(&args);
        assert!(config.features.enabled(crate::features::SEND_LEGACY_DIGEST_HEADER));
    }
}

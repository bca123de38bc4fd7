use std::fmt;
use std::str::FromStr;

use sha2::{Digest as _, Sha256, Sha512};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("unexpected digest format {0:?}")]
    Format(String),

    #[error("{0} is an unsupported algorithm")]
    UnsupportedAlgorithm(String),
}

/// Hash algorithms the registry accepts as blob identities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Sha256,
    Sha512,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Algorithm::Sha256),
            "sha512" => Ok(Algorithm::Sha512),
            other => Err(DigestError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// The content address of a blob, serialized as `algo:hex`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Digest {
    algo: Algorithm,
    encoded: String,
}

impl Digest {
    pub fn new(algo: Algorithm, encoded: impl Into<String>) -> Self {
        Digest {
            algo,
            encoded: encoded.into(),
        }
    }

    /// Splits on the first `:`. The encoded part is not checked beyond the
    /// algorithm prefix; lookups against the store decide existence.
    pub fn parse(s: &str) -> Result<Self, DigestError> {
        let (algo, encoded) = s
            .split_once(':')
            .ok_or_else(|| DigestError::Format(s.to_string()))?;
        Ok(Digest {
            algo: algo.parse()?,
            encoded: encoded.to_string(),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algo
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Hashes a byte slice already held in memory.
    pub fn of_bytes(algo: Algorithm, data: &[u8]) -> Self {
        let encoded = match algo {
            Algorithm::Sha256 => hex::encode(Sha256::digest(data)),
            Algorithm::Sha512 => hex::encode(Sha512::digest(data)),
        };
        Digest { algo, encoded }
    }

    /// Consumes the reader fully, hashing as it goes. Blobs never pass
    /// through memory whole.
    pub async fn from_reader<R>(algo: Algorithm, mut reader: R) -> std::io::Result<Self>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = vec![0u8; 32 * 1024];
        let encoded = match algo {
            Algorithm::Sha256 => {
                let mut hasher = Sha256::new();
                loop {
                    let n = reader.read(&mut buf).await?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                hex::encode(hasher.finalize())
            }
            Algorithm::Sha512 => {
                let mut hasher = Sha512::new();
                loop {
                    let n = reader.read(&mut buf).await?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                hex::encode(hasher.finalize())
            }
        };
        Ok(Digest { algo, encoded })
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algo, self.encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrip() {
        let dig = Digest::parse("sha256:7a38bf81f383f69433ad6e900d35b3e2385593f76a7b7ab5d4355b8ba41ee24b")
            .unwrap();
        assert_eq!(dig.algorithm(), Algorithm::Sha256);
        assert_eq!(
            dig.to_string(),
            "sha256:7a38bf81f383f69433ad6e900d35b3e2385593f76a7b7ab5d4355b8ba41ee24b"
        );
    }

    #[test]
    fn parse_rejects_missing_colon() {
        assert!(matches!(
            Digest::parse("sha256abcdef"),
            Err(DigestError::Format(_))
        ));
    }

    #[test]
    fn parse_rejects_unknown_algorithm() {
        assert!(matches!(
            Digest::parse("md5:abcdef"),
            Err(DigestError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn sha256_canonical_form() {
        // Canonical OCI digest of the empty input.
        assert_eq!(
            Digest::of_bytes(Algorithm::Sha256, b"").to_string(),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            Digest::of_bytes(Algorithm::Sha256, br#"{"foo":"bar"}"#).to_string(),
            "sha256:7a38bf81f383f69433ad6e900d35b3e2385593f76a7b7ab5d4355b8ba41ee24b"
        );
    }

    #[tokio::test]
    async fn from_reader_matches_of_bytes() {
        let data = br#"{"mediaType":"application/vnd.oci.image.manifest.v1+json"}"#;
        let streamed = Digest::from_reader(Algorithm::Sha256, &data[..]).await.unwrap();
        assert_eq!(streamed, Digest::of_bytes(Algorithm::Sha256, data));
        assert_eq!(
            streamed.to_string(),
            "sha256:0a1b17bf6d39f56897a7e8a056d930cf2bde38841a187aeb083d7487e2224573"
        );
    }

    #[tokio::test]
    async fn sha512_supported() {
        let dig = Digest::from_reader(Algorithm::Sha512, &b"depot"[..]).await.unwrap();
        assert_eq!(dig.algorithm(), Algorithm::Sha512);
        assert_eq!(dig.encoded().len(), 128);
    }
}

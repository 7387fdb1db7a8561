//! Content hashing for blob identifiers.

use crate::error::CodecError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

/// Default file extension for stored blobs.
pub const DEFAULT_EXTENSION: &str = "wav";

/// Digest function used to name blobs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    /// Raw digest of `data`.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Md5 => md5::Md5::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
            HashAlgorithm::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "blake3" => Ok(HashAlgorithm::Blake3),
            _ => Err(CodecError::InvalidConfig(format!(
                "unknown hash algorithm: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for HashAlgorithm {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Text encoding of the digest inside an identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DigestEncoding {
    #[default]
    Hex,
    UpperHex,
}

impl DigestEncoding {
    pub fn encode(self, digest: &[u8]) -> String {
        match self {
            DigestEncoding::Hex => hex::encode(digest),
            DigestEncoding::UpperHex => hex::encode_upper(digest),
        }
    }
}

impl FromStr for DigestEncoding {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(DigestEncoding::Hex),
            "upperhex" => Ok(DigestEncoding::UpperHex),
            _ => Err(CodecError::InvalidConfig(format!(
                "unknown digest encoding: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for DigestEncoding {
    type Error = CodecError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Derives `<digest>.<extension>` identifiers from blob content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobHasher {
    algorithm: HashAlgorithm,
    encoding: DigestEncoding,
    extension: String,
}

impl Default for BlobHasher {
    fn default() -> Self {
        Self::new(
            HashAlgorithm::default(),
            DigestEncoding::default(),
            DEFAULT_EXTENSION,
        )
    }
}

impl BlobHasher {
    pub fn new(
        algorithm: HashAlgorithm,
        encoding: DigestEncoding,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            algorithm,
            encoding,
            extension: extension.into(),
        }
    }

    /// Identifier for `content`. Depends on nothing but the bytes and the
    /// hasher settings.
    pub fn identify(&self, content: &[u8]) -> String {
        let digest = self.encoding.encode(&self.algorithm.digest(content));
        if self.extension.is_empty() {
            digest
        } else {
            format!("{}.{}", digest, self.extension)
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn encoding(&self) -> DigestEncoding {
        self.encoding
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_md5_hex_wav() {
        let hasher = BlobHasher::default();
        // md5("hello world")
        assert_eq!(
            hasher.identify(b"hello world"),
            "5eb63bbbe01eeed093cb22bb8f5acdc3.wav"
        );
    }

    #[test]
    fn test_empty_content() {
        let hasher = BlobHasher::default();
        assert_eq!(hasher.identify(b""), "d41d8cd98f00b204e9800998ecf8427e.wav");
    }

    #[test]
    fn test_sha256_digest() {
        let hasher = BlobHasher::new(HashAlgorithm::Sha256, DigestEncoding::Hex, "bin");
        assert_eq!(
            hasher.identify(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.bin"
        );
    }

    #[test]
    fn test_digest_lengths() {
        assert_eq!(HashAlgorithm::Md5.digest(b"x").len(), 16);
        assert_eq!(HashAlgorithm::Sha256.digest(b"x").len(), 32);
        assert_eq!(HashAlgorithm::Sha512.digest(b"x").len(), 64);
        assert_eq!(HashAlgorithm::Blake3.digest(b"x").len(), 32);
    }

    #[test]
    fn test_upper_hex_encoding() {
        let hasher = BlobHasher::new(HashAlgorithm::Md5, DigestEncoding::UpperHex, "wav");
        assert_eq!(
            hasher.identify(b"hello world"),
            "5EB63BBBE01EEED093CB22BB8F5ACDC3.wav"
        );
    }

    #[test]
    fn test_empty_extension_omits_dot() {
        let hasher = BlobHasher::new(HashAlgorithm::Md5, DigestEncoding::Hex, "");
        assert_eq!(hasher.identify(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("MD5".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Md5);
        assert_eq!("sha-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("blake3".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Blake3);
        assert!("crc32".parse::<HashAlgorithm>().is_err());

        assert_eq!("hex".parse::<DigestEncoding>().unwrap(), DigestEncoding::Hex);
        assert!("latin1".parse::<DigestEncoding>().is_err());
    }
}

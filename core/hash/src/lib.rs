//! Verify plaintext passwords against stored hashes.
//!
//! The [`CredentialVerifier`] trait is the only contract the decision engine relies on.
//! The [`Pbkdf2Verifier`] implementation understands hashes in the format:
//!
//! ```text
//! PBKDF2$<digest>$<iterations>$<salt>$<base64 key>
//! ```
//!
//! Where `digest` is one of `sha256` or `sha512` and the salt is used as is (not decoded).
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::Sha256;
use sha2::Sha512;

#[cfg(any(test, feature = "test-fixture"))]
mod fixture;
#[cfg(any(test, feature = "test-fixture"))]
pub use self::fixture::VerifierFixture;


/// Prefix identifying PBKDF2 hashes.
pub const PBKDF2_PREFIX: &str = "PBKDF2";

/// Default number of PBKDF2 iterations for new hashes.
pub const DEFAULT_ITERATIONS: u32 = 901;

/// Length, in bytes, of keys derived for new hashes.
pub const KEY_LENGTH: usize = 24;

/// Length, in bytes, of random salts for new hashes (before encoding).
pub const SALT_LENGTH: usize = 12;

/// Check a plaintext password against a stored hash.
pub trait CredentialVerifier: Send + Sync {
    /// Return `true` only if `password` matches `hash`.
    ///
    /// Hashes that can't be decoded never match.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Errors decoding or generating password hashes.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The derived key is not valid base64.
    #[error("the hash key is not valid base64")]
    InvalidKey(#[from] base64::DecodeError),

    /// The iteration count is not a positive integer.
    #[error("the hash iterations count '{0}' is not a positive integer")]
    // (iterations,)
    InvalidIterations(String),

    /// The hash does not have the expected number of `$` separated fields.
    #[error("the hash does not have the expected PBKDF2$digest$iterations$salt$key format")]
    Malformed,

    /// The derived key is empty.
    #[error("the hash key is empty")]
    EmptyKey,

    /// The hash does not start with the PBKDF2 prefix.
    #[error("the hash does not start with the '{}' prefix", PBKDF2_PREFIX)]
    UnsupportedScheme,

    /// The hash uses an unsupported digest.
    #[error("the hash digest '{0}' is not supported")]
    // (digest,)
    UnsupportedDigest(String),
}

/// Digest functions supported by PBKDF2 hashes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Digest {
    #[default]
    Sha256,
    Sha512,
}

impl Digest {
    /// Derive a key filling `output` from a password and salt.
    fn derive(self, password: &[u8], salt: &[u8], iterations: u32, output: &mut [u8]) {
        match self {
            Digest::Sha256 => pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, output),
            Digest::Sha512 => pbkdf2::pbkdf2_hmac::<Sha512>(password, salt, iterations, output),
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Digest::Sha256 => write!(f, "sha256"),
            Digest::Sha512 => write!(f, "sha512"),
        }
    }
}

impl FromStr for Digest {
    type Err = HashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sha256" => Ok(Digest::Sha256),
            "sha512" => Ok(Digest::Sha512),
            other => Err(HashError::UnsupportedDigest(other.to_string())),
        }
    }
}

/// Decoded PBKDF2 password hash.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pbkdf2Hash {
    pub digest: Digest,
    pub iterations: u32,
    pub salt: String,
    pub key: Vec<u8>,
}

impl Pbkdf2Hash {
    /// Hash a new password with a random salt.
    pub fn generate(password: &str, digest: Digest, iterations: u32) -> Result<Self, HashError> {
        if iterations == 0 {
            return Err(HashError::InvalidIterations(iterations.to_string()));
        }
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = BASE64.encode(salt);

        let mut key = vec![0u8; KEY_LENGTH];
        digest.derive(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
        Ok(Pbkdf2Hash {
            digest,
            iterations,
            salt,
            key,
        })
    }

    /// Check a password against this hash in constant time.
    pub fn check(&self, password: &str) -> bool {
        let mut derived = vec![0u8; self.key.len()];
        self.digest.derive(
            password.as_bytes(),
            self.salt.as_bytes(),
            self.iterations,
            &mut derived,
        );
        constant_time_eq(&derived, &self.key)
    }
}

impl fmt::Display for Pbkdf2Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}${}${}${}${}",
            PBKDF2_PREFIX,
            self.digest,
            self.iterations,
            self.salt,
            BASE64.encode(&self.key),
        )
    }
}

impl FromStr for Pbkdf2Hash {
    type Err = HashError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = value.split('$').collect();
        if fields.len() != 5 {
            return Err(HashError::Malformed);
        }
        if fields[0] != PBKDF2_PREFIX {
            return Err(HashError::UnsupportedScheme);
        }

        let digest = fields[1].parse()?;
        let iterations = match fields[2].parse::<u32>() {
            Ok(iterations) if iterations > 0 => iterations,
            _ => return Err(HashError::InvalidIterations(fields[2].to_string())),
        };
        let key = BASE64.decode(fields[4])?;
        if key.is_empty() {
            return Err(HashError::EmptyKey);
        }
        Ok(Pbkdf2Hash {
            digest,
            iterations,
            salt: fields[3].to_string(),
            key,
        })
    }
}

/// [`CredentialVerifier`] for [`Pbkdf2Hash`] encoded hashes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pbkdf2Verifier;

impl CredentialVerifier for Pbkdf2Verifier {
    fn verify(&self, password: &str, hash: &str) -> bool {
        match hash.parse::<Pbkdf2Hash>() {
            Ok(hash) => hash.check(password),
            Err(_) => false,
        }
    }
}

/// Hash a password with a random salt, returning the encoded hash.
pub fn hash_password(password: &str, digest: Digest, iterations: u32) -> Result<String, HashError> {
    let hash = Pbkdf2Hash::generate(password, digest, iterations)?;
    Ok(hash.to_string())
}

/// Compare two byte strings without short-circuiting on the first difference.
fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let diff = left
        .iter()
        .zip(right.iter())
        .fold(0u8, |diff, (left, right)| diff | (left ^ right));
    diff == 0
}

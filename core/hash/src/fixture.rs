//! Trivial [`CredentialVerifier`] for unit tests.
use super::CredentialVerifier;

/// Accepts a password only when the "hash" is the password itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct VerifierFixture;

impl CredentialVerifier for VerifierFixture {
    fn verify(&self, password: &str, hash: &str) -> bool {
        password == hash
    }
}

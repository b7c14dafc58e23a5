//! Ed25519 vote signing and verification.
//!
//! Signatures are deterministic (nonce derived from key and message), so a
//! validator re-signing the same claim always produces the same vote.

use crate::domain::{Vote, VoteClaim};
use crate::ports::outbound::{VoteSigner, VoteVerifier};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, VerifyingKey};
use shared_types::{Hash, PublicKey, Signature, ValidatorId};

/// Signs votes with a validator's Ed25519 key.
pub struct Ed25519VoteSigner {
    signing_key: SigningKey,
    validator_id: ValidatorId,
}

impl Ed25519VoteSigner {
    /// Create from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&seed);
        let validator_id = ValidatorId::from_public_key(&signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            validator_id,
        }
    }
}

impl VoteSigner for Ed25519VoteSigner {
    fn validator_id(&self) -> ValidatorId {
        self.validator_id
    }

    fn public_key(&self) -> PublicKey {
        self.signing_key.verifying_key().to_bytes()
    }

    fn sign(&self, claim: &VoteClaim) -> Vote {
        let signature = self.signing_key.sign(&claim.signing_message());
        Vote::new(*claim, self.validator_id, signature.to_bytes())
    }
}

/// Strict Ed25519 verification.
///
/// Rejects malformed keys, non-canonical signatures and small-order
/// points, so acceptance does not depend on library leniency.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519VoteVerifier;

impl VoteVerifier for Ed25519VoteVerifier {
    fn verify(&self, public_key: &PublicKey, message: &Hash, signature: &Signature) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(public_key) else {
            return false;
        };
        let signature = DalekSignature::from_bytes(signature);
        key.verify_strict(message, &signature).is_ok()
    }
}

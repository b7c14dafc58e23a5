//! # Network Configuration
//!
//! Static description of the attested network: which source chains are
//! observed and which validators attest to them. Loaded once at startup from
//! a JSON file; every validator must load an identical file.
//!
//! ```json
//! {
//!   "name": "devnet",
//!   "chains": [
//!     { "id": 7, "name": "mock_l1", "deploy_height": 1, "conf_level": "finalized" }
//!   ],
//!   "validators": [
//!     { "public_key": "d75a98...", "power": 30 }
//!   ]
//! }
//! ```

use crate::entities::{ChainId, ConfLevel, PublicKey, ValidatorId};
use crate::errors::NetworkError;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use std::collections::BTreeSet;
use std::path::Path;

/// A source chain observed by the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub id: ChainId,
    pub name: String,
    /// First height that carries cross-chain content; streaming never starts below it.
    #[serde(default)]
    pub deploy_height: u64,
    /// Confidence tier attestations for this chain satisfy.
    #[serde(default)]
    pub conf_level: ConfLevel,
}

/// A validator entry in the network file.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSpec {
    #[serde_as(as = "Hex")]
    pub public_key: PublicKey,
    pub power: u64,
}

impl ValidatorSpec {
    pub fn id(&self) -> ValidatorId {
        ValidatorId::from_public_key(&self.public_key)
    }
}

/// The full network description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub name: String,
    pub chains: Vec<ChainSpec>,
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,
}

impl NetworkSpec {
    /// Load and validate a network file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| NetworkError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let network: NetworkSpec =
            serde_json::from_str(&raw).map_err(|e| NetworkError::Parse(e.to_string()))?;
        network.validate()?;

        tracing::info!(
            network = %network.name,
            chains = network.chains.len(),
            validators = network.validators.len(),
            "Loaded network configuration"
        );
        Ok(network)
    }

    /// Reject configurations that cannot be attested.
    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.chains.is_empty() {
            return Err(NetworkError::NoChains);
        }

        let mut ids = BTreeSet::new();
        let mut names = BTreeSet::new();
        for chain in &self.chains {
            if !ids.insert(chain.id) {
                return Err(NetworkError::DuplicateChainId(chain.id));
            }
            if chain.name.is_empty() {
                return Err(NetworkError::EmptyChainName(chain.id));
            }
            if !names.insert(chain.name.as_str()) {
                return Err(NetworkError::DuplicateChainName(chain.name.clone()));
            }
        }

        let mut validators = BTreeSet::new();
        for validator in &self.validators {
            if !validators.insert(validator.public_key) {
                return Err(NetworkError::DuplicateValidator(validator.id()));
            }
        }
        if !self.validators.is_empty() && self.total_power() == 0 {
            return Err(NetworkError::ZeroTotalPower);
        }

        Ok(())
    }

    /// Look up a chain by id.
    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainSpec> {
        self.chains.iter().find(|c| c.id == chain_id)
    }

    /// Name of a chain, or its numeric id when unknown.
    pub fn chain_name(&self, chain_id: ChainId) -> String {
        self.chain(chain_id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| chain_id.to_string())
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chains.iter().map(|c| c.id)
    }

    pub fn total_power(&self) -> u128 {
        self.validators.iter().map(|v| u128::from(v.power)).sum()
    }
}

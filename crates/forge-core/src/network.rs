//! Network definitions and constants.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::params::{ConsensusParams, GenesisConfig};

/// Network type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Bitcoin mainnet
    Mainnet,
    /// Local regression-test network with trivial difficulty
    #[default]
    Regtest,
}

impl Network {
    /// Get the Bech32 human-readable part for this network.
    pub fn bech32_hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Regtest => "bcrt",
        }
    }

    /// Get the version byte for P2PKH addresses.
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Regtest => 0x6f,
        }
    }

    /// Get the version byte for P2SH addresses.
    pub fn p2sh_version(&self) -> u8 {
        match self {
            Network::Mainnet => 0x05,
            Network::Regtest => 0xc4,
        }
    }

    /// Consensus rules for this network.
    pub fn consensus_params(&self) -> ConsensusParams {
        match self {
            Network::Mainnet => ConsensusParams {
                subsidy_halving_interval: 210_000,
                initial_subsidy: 50 * COIN,
                pow_limit_bits: 0x1d00ffff,
            },
            Network::Regtest => ConsensusParams {
                subsidy_halving_interval: 150,
                initial_subsidy: 50 * COIN,
                pow_limit_bits: 0x207fffff,
            },
        }
    }

    /// Header fields and reward of this network's genesis block.
    pub fn genesis_config(&self) -> GenesisConfig {
        match self {
            Network::Mainnet => GenesisConfig {
                time: 1231006505,
                nonce: 2083236893,
                bits: 0x1d00ffff,
                version: 1,
                reward: 50 * COIN,
            },
            Network::Regtest => GenesisConfig {
                time: 1296688602,
                nonce: 2,
                bits: 0x207fffff,
                version: 1,
                reward: 50 * COIN,
            },
        }
    }

    /// Get network name as string.
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Regtest => "regtest",
        }
    }
}

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(Network::Mainnet),
            "regtest" | "reg" => Ok(Network::Regtest),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

/// Returned when parsing an unrecognised network name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);

impl core::fmt::Display for Network {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Number of base units in one coin.
pub const COIN: u64 = 100_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_str() {
        assert_eq!("mainnet".parse(), Ok(Network::Mainnet));
        assert_eq!("MAINNET".parse(), Ok(Network::Mainnet));
        assert_eq!("regtest".parse(), Ok(Network::Regtest));
        assert_eq!(
            "invalid".parse::<Network>(),
            Err(UnknownNetwork("invalid".into()))
        );
    }

    #[test]
    fn test_regtest_is_trivial_difficulty() {
        let params = Network::Regtest.consensus_params();

        assert_eq!(params.pow_limit_bits, Network::Regtest.genesis_config().bits);
    }

    #[test]
    fn test_network_serde_names() {
        let network: Network = serde_json::from_str("\"regtest\"").unwrap();
        assert_eq!(network, Network::Regtest);
        assert_eq!(serde_json::to_string(&Network::Mainnet).unwrap(), "\"mainnet\"");
    }
}

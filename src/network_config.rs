// Per-network deployment parameters
use solana_program::pubkey::Pubkey;

use crate::raffle_error::RaffleError;
use crate::raffle_state::RaffleConfig;
use crate::utils::WEI_PER_ETHER;

/// Networks where the VRF coordinator is mocked
pub const DEVELOPMENT_CHAINS: &[&str] = &["hardhat", "localhost"];
/// Confirmations to wait for before verifying a deployment on a live network
pub const VERIFICATION_BLOCK_CONFIRMATIONS: u64 = 6;

/// Shared by the in-process `hardhat` network and a `localhost` node
pub const HARDHAT_CHAIN_ID: u64 = 31337;
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
pub const MAINNET_CHAIN_ID: u64 = 1;

// 30 gwei key hash: 0x474e34a077df58807dbe9c96d3c009b23b3c6d0cce433e59bbf5b34f823bc56c
const GAS_LANE_30_GWEI: [u8; 32] = [
    71, 78, 52, 160, 119, 223, 88, 128, 125, 190, 156, 150, 211, 192, 9, 178, 59, 60, 109, 12,
    206, 67, 62, 89, 187, 245, 179, 79, 130, 59, 197, 108,
];

// Sepolia VRF coordinator 0x447Fd5eC2D383091C22B8549cb231a3bAD6d3fAf, left padded
const SEPOLIA_VRF_COORDINATOR: [u8; 32] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 68, 127, 213, 236, 45, 56, 48, 145, 194, 43, 133, 73, 203,
    35, 26, 59, 173, 109, 63, 175,
];

/// 0.01 ETH
const DEFAULT_ENTRANCE_FEE: u128 = WEI_PER_ETHER / 100;
const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;
const DEFAULT_KEEPERS_UPDATE_INTERVAL: u64 = 30;

/// Raffle parameters known for a network. Absent values must be supplied
/// by the deployment (the mocked coordinator on development chains).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: &'static str,
    pub subscription_id: Option<u64>,
    pub gas_lane: Option<[u8; 32]>,
    pub keepers_update_interval: u64,
    pub entrance_fee: Option<u128>,
    pub callback_gas_limit: Option<u32>,
    pub vrf_coordinator: Option<Pubkey>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "hardhat",
            subscription_id: None,
            gas_lane: None,
            keepers_update_interval: DEFAULT_KEEPERS_UPDATE_INTERVAL,
            entrance_fee: None,
            callback_gas_limit: None,
            vrf_coordinator: None,
        }
    }
}

impl NetworkConfig {
    pub fn is_development_chain(&self) -> bool {
        DEVELOPMENT_CHAINS.contains(&self.name)
    }
}

/// Look up the parameters for `chain_id`
pub fn network_config(chain_id: u64) -> Option<NetworkConfig> {
    match chain_id {
        HARDHAT_CHAIN_ID => Some(NetworkConfig {
            name: "localhost",
            subscription_id: Some(588),
            gas_lane: Some(GAS_LANE_30_GWEI),
            keepers_update_interval: DEFAULT_KEEPERS_UPDATE_INTERVAL,
            entrance_fee: Some(DEFAULT_ENTRANCE_FEE),
            callback_gas_limit: Some(DEFAULT_CALLBACK_GAS_LIMIT),
            vrf_coordinator: None,
        }),
        SEPOLIA_CHAIN_ID => Some(NetworkConfig {
            name: "sepolia",
            subscription_id: Some(6926),
            gas_lane: Some(GAS_LANE_30_GWEI),
            keepers_update_interval: DEFAULT_KEEPERS_UPDATE_INTERVAL,
            entrance_fee: Some(DEFAULT_ENTRANCE_FEE),
            callback_gas_limit: Some(DEFAULT_CALLBACK_GAS_LIMIT),
            vrf_coordinator: Some(Pubkey::new_from_array(SEPOLIA_VRF_COORDINATOR)),
        }),
        MAINNET_CHAIN_ID => Some(NetworkConfig {
            name: "mainnet",
            ..NetworkConfig::default()
        }),
        _ => None,
    }
}

/// Look up the parameters by network name. `hardhat` has no table entry of
/// its own and resolves to the defaults.
pub fn network_config_by_name(name: &str) -> Option<NetworkConfig> {
    if name == NetworkConfig::default().name {
        return Some(NetworkConfig::default());
    }

    [HARDHAT_CHAIN_ID, SEPOLIA_CHAIN_ID, MAINNET_CHAIN_ID]
        .iter()
        .filter_map(|&chain_id| network_config(chain_id))
        .find(|network| network.name == name)
}

/// Resolve the raffle construction arguments for `chain_id`.
///
/// `coordinator` supplies the coordinator address and subscription when the
/// coordinator was deployed alongside the raffle; it wins over the table.
pub fn raffle_config(
    chain_id: u64,
    coordinator: Option<(Pubkey, u64)>,
) -> Result<RaffleConfig, RaffleError> {
    let network = network_config(chain_id)
        .ok_or_else(|| RaffleError::UnsupportedNetwork(chain_id.to_string()))?;

    let (vrf_coordinator, subscription_id) = match coordinator {
        Some(deployed) => deployed,
        None => (
            network
                .vrf_coordinator
                .ok_or(RaffleError::MissingNetworkParameter("vrfCoordinatorV2"))?,
            network
                .subscription_id
                .ok_or(RaffleError::MissingNetworkParameter("subscriptionId"))?,
        ),
    };

    Ok(RaffleConfig {
        vrf_coordinator,
        subscription_id,
        entrance_fee: network
            .entrance_fee
            .ok_or(RaffleError::MissingNetworkParameter("entranceFee"))?,
        gas_lane: network
            .gas_lane
            .ok_or(RaffleError::MissingNetworkParameter("gasLane"))?,
        callback_gas_limit: network
            .callback_gas_limit
            .ok_or(RaffleError::MissingNetworkParameter("callbackGasLimit"))?,
        interval: network.keepers_update_interval,
    })
}

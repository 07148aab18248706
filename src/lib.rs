// Raffle Upkeep
// An interval-driven raffle whose winner is picked with verifiable randomness

// Core modules
pub mod bank;
pub mod error;
pub mod events;
pub mod utils;

// Raffle modules
pub mod raffle_state;
pub mod raffle_instruction;
pub mod raffle_processor;
pub mod raffle_error;

// VRF modules for randomness
pub mod vrf;
pub mod vrf_coordinator_mock;

// Deployment and automation
pub mod network_config;
pub mod local_network;
pub mod keeper;

pub use keeper::{Keeper, Upkeep};
pub use local_network::{LocalNetwork, TransactionReceipt};
pub use raffle_error::RaffleError;
pub use raffle_state::{Raffle, RaffleConfig, RaffleState, UpkeepCheck};

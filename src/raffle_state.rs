use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::collections::BTreeMap;
use std::convert::TryFrom;

use crate::raffle_error::RaffleError;
use crate::vrf::RequestId;

/// Confirmations the oracle waits for before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words requested per draw
pub const NUM_WORDS: u32 = 1;

/// Lifecycle state of a raffle
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Raffle is open for entries
    Open,
    /// Randomness requested, waiting for the oracle to pick a winner
    Calculating,
}

impl Default for RaffleState {
    fn default() -> Self {
        RaffleState::Open
    }
}

impl TryFrom<u8> for RaffleState {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RaffleState::Open),
            1 => Ok(RaffleState::Calculating),
            _ => Err("Invalid raffle state"),
        }
    }
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// Construction arguments of a raffle
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Oracle allowed to deliver random words
    pub vrf_coordinator: Pubkey,
    /// Oracle subscription paying for requests
    pub subscription_id: u64,
    /// Minimum value of a single entry
    pub entrance_fee: u128,
    /// Gas lane (key hash) passed to the oracle
    pub gas_lane: [u8; 32],
    /// Resource limit for the fulfillment callback
    pub callback_gas_limit: u32,
    /// Seconds that must elapse after a round starts before a draw
    pub interval: u64,
}

impl Sealed for RaffleConfig {}

impl Pack for RaffleConfig {
    const LEN: usize = 32 + 8 + 16 + 32 + 4 + 8;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, RaffleConfig::LEN];
        let (vrf_coordinator, subscription_id, entrance_fee, gas_lane, callback_gas_limit, interval) =
            array_refs![src, 32, 8, 16, 32, 4, 8];

        Ok(RaffleConfig {
            vrf_coordinator: Pubkey::new_from_array(*vrf_coordinator),
            subscription_id: u64::from_le_bytes(*subscription_id),
            entrance_fee: u128::from_le_bytes(*entrance_fee),
            gas_lane: *gas_lane,
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            interval: u64::from_le_bytes(*interval),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, RaffleConfig::LEN];
        let (
            vrf_coordinator_dst,
            subscription_id_dst,
            entrance_fee_dst,
            gas_lane_dst,
            callback_gas_limit_dst,
            interval_dst,
        ) = mut_array_refs![dst, 32, 8, 16, 32, 4, 8];

        vrf_coordinator_dst.copy_from_slice(self.vrf_coordinator.as_ref());
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *gas_lane_dst = self.gas_lane;
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
    }
}

/// A randomness request that has not been answered yet
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingDraw {
    /// Round the request will close
    pub round: u64,
    /// When the request was issued
    pub requested_at: UnixTimestamp,
}

/// Result of the read-only upkeep probe. Every condition is exposed so a
/// caller can see which one is holding the draw back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepCheck {
    pub fn upkeep_needed(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }
}

/// Raffle account data
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Parameters fixed at construction
    pub config: RaffleConfig,
    /// Current lifecycle state
    pub state: RaffleState,
    /// Entrants of the current round, in entry order
    pub players: Vec<Pubkey>,
    /// Value collected in the current round
    pub pot: u128,
    /// Start of the current round
    pub last_timestamp: UnixTimestamp,
    /// Outstanding randomness requests keyed by request id
    pub pending_requests: BTreeMap<RequestId, PendingDraw>,
    /// Winner of the last completed round
    pub recent_winner: Option<Pubkey>,
    /// Number of completed rounds
    pub round: u64,
    /// Highest request id issued so far, 0 before the first draw
    pub last_request_id: RequestId,
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Raffle {
    /// Create an open raffle whose first round starts at `now`
    pub fn new(config: RaffleConfig, now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            config,
            state: RaffleState::Open,
            players: Vec::new(),
            pot: 0,
            last_timestamp: now,
            pending_requests: BTreeMap::new(),
            recent_winner: None,
            round: 0,
            last_request_id: 0,
        }
    }

    /// Evaluate the draw preconditions at `now` without touching state
    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck {
        let elapsed = now.saturating_sub(self.last_timestamp);
        UpkeepCheck {
            is_open: self.state == RaffleState::Open,
            time_passed: elapsed >= 0 && elapsed as u64 >= self.config.interval,
            has_players: !self.players.is_empty(),
            has_balance: self.pot > 0,
        }
    }

    pub fn entrance_fee(&self) -> u128 {
        self.config.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.config.interval
    }

    pub fn player(&self, index: u64) -> Result<Pubkey, RaffleError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.players.get(i))
            .copied()
            .ok_or(RaffleError::PlayerIndexOutOfBounds(index))
    }

    pub fn number_of_players(&self) -> u64 {
        self.players.len() as u64
    }

    pub fn latest_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn raffle_state(&self) -> RaffleState {
        self.state
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }

    pub fn request_confirmations(&self) -> u16 {
        REQUEST_CONFIRMATIONS
    }

    /// Id of the request the raffle is waiting on, if any
    pub fn pending_request_id(&self) -> Option<RequestId> {
        self.pending_requests.keys().next().copied()
    }
}

use solana_program::pubkey::Pubkey;

use crate::vrf::RequestId;

/// Notifications emitted by the raffle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A player entered the current round
    EnteredRaffle { player: Pubkey },
    /// A draw started and randomness was requested
    RandomnessRequested { request_id: RequestId },
    /// The round closed and the pot went to `winner`
    WinnerPicked { winner: Pubkey },
}

/// Notifications emitted by the VRF coordinator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorEvent {
    SubscriptionCreated {
        subscription_id: u64,
        owner: Pubkey,
    },
    SubscriptionFunded {
        subscription_id: u64,
        old_balance: u128,
        new_balance: u128,
    },
    ConsumerAdded {
        subscription_id: u64,
        consumer: Pubkey,
    },
    ConsumerRemoved {
        subscription_id: u64,
        consumer: Pubkey,
    },
    RandomWordsRequested {
        key_hash: [u8; 32],
        request_id: RequestId,
        subscription_id: u64,
        minimum_request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
        sender: Pubkey,
    },
    RandomWordsFulfilled {
        request_id: RequestId,
        payment: u128,
        success: bool,
    },
}

/// Any event recorded in a transaction receipt, in emission order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Raffle(RaffleEvent),
    Coordinator(CoordinatorEvent),
}

impl From<RaffleEvent> for Event {
    fn from(event: RaffleEvent) -> Self {
        Event::Raffle(event)
    }
}

impl From<CoordinatorEvent> for Event {
    fn from(event: CoordinatorEvent) -> Self {
        Event::Coordinator(event)
    }
}

// Raffle Upkeep - VRF coordinator errors
use solana_program::pubkey::Pubkey;
use thiserror::Error;

/// Failures raised by the VRF coordinator while managing subscriptions
/// and randomness requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("Invalid subscription {0}")]
    InvalidSubscription(u64),

    #[error("Must be subscription owner")]
    MustBeSubOwner,

    #[error("Too many consumers on subscription {0}")]
    TooManyConsumers(u64),

    #[error("Consumer {consumer} is not registered on subscription {subscription_id}")]
    InvalidConsumer {
        subscription_id: u64,
        consumer: Pubkey,
    },

    #[error("Requested {have} words, maximum is {want}")]
    NumWordsTooBig { have: u32, want: u32 },

    #[error("nonexistent request")]
    NonexistentRequest(u64),

    #[error("Random words override must contain exactly {expected} words")]
    InvalidRandomWords { expected: u32 },

    #[error("Insufficient subscription balance: {balance} < {payment}")]
    InsufficientBalance { balance: u128, payment: u128 },

    #[error("Subscription balance overflow")]
    Overflow,
}

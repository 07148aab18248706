// VRF integration for the raffle: request side, callback correlation, winner index
use arrayref::array_ref;
use solana_program::{keccak, pubkey::Pubkey};

use crate::error::CoordinatorError;

/// Identifier the oracle assigns to a randomness request
pub type RequestId = u64;

/// Parameters passed through to the oracle when requesting random words
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomWordsRequest {
    /// Gas lane (key hash) selecting the oracle's price tier
    pub key_hash: [u8; 32],
    /// Subscription paying for the request
    pub subscription_id: u64,
    /// Confirmations the oracle waits for before responding
    pub request_confirmations: u16,
    /// Resource limit for the consumer callback
    pub callback_gas_limit: u32,
    /// Number of random words to deliver
    pub num_words: u32,
}

/// The randomness provider seen from the consumer side.
///
/// A request returns immediately with an id. The random words arrive later
/// through the consumer's fulfillment entry point, keyed by that id. Ids
/// strictly increase from one request to the next.
pub trait RandomnessOracle {
    fn request_random_words(
        &mut self,
        consumer: &Pubkey,
        request: &RandomWordsRequest,
    ) -> Result<RequestId, CoordinatorError>;
}

/// Derive `num_words` pseudo random words from a request id.
///
/// Each word is the first 8 bytes (little endian) of
/// `keccak(request_id || index)`.
pub fn expand_random_words(request_id: RequestId, num_words: u32) -> Vec<u64> {
    (0..num_words)
        .map(|index| {
            let hash = keccak::hashv(&[&request_id.to_le_bytes(), &index.to_le_bytes()]);
            let bytes = hash.to_bytes();
            u64::from_le_bytes(*array_ref![bytes, 0, 8])
        })
        .collect()
}

// Get a random winner index from a VRF word
pub fn get_random_winner_index(random_word: u64, player_count: u64) -> u64 {
    if player_count == 0 {
        return 0;
    }

    random_word % player_count
}

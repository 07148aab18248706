use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_pack::Pack,
    pubkey::Pubkey,
};
use std::convert::TryInto;

use crate::raffle_error::RaffleError;
use crate::raffle_state::RaffleConfig;
use crate::vrf::RequestId;

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Initialize the raffle with its construction arguments
    ///
    /// Accounts expected:
    /// 0. `[signer]` The deployer
    /// 1. `[writable]` The raffle account, must be uninitialized
    Initialize {
        config: RaffleConfig,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player, pays `amount`
    /// 1. `[writable]` The raffle account
    EnterRaffle {
        /// Value sent with the entry, at least the entrance fee
        amount: u128,
    },

    /// Close entries and request randomness (keeper entry point)
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any caller
    /// 1. `[writable]` The raffle account
    PerformUpkeep {},

    /// Deliver random words for a pending request (oracle callback)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The VRF coordinator
    /// 1. `[writable]` The raffle account
    FulfillRandomWords {
        request_id: RequestId,
        random_words: Vec<u64>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, RaffleError> {
        let (&tag, rest) = input.split_first().ok_or(RaffleError::InvalidInstruction)?;

        Ok(match tag {
            0 => {
                let config_bytes = rest
                    .get(..RaffleConfig::LEN)
                    .ok_or(RaffleError::InvalidInstruction)?;
                let config = RaffleConfig::unpack_from_slice(config_bytes)
                    .map_err(|_| RaffleError::InvalidInstruction)?;
                Self::Initialize { config }
            }
            1 => {
                let (amount, _) = Self::unpack_u128(rest)?;
                Self::EnterRaffle { amount }
            }
            2 => Self::PerformUpkeep {},
            3 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (count, mut rest) = Self::unpack_u32(rest)?;
                let mut random_words = Vec::with_capacity(count.min(64) as usize);
                for _ in 0..count {
                    let (word, next) = Self::unpack_u64(rest)?;
                    random_words.push(word);
                    rest = next;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(RaffleError::InvalidInstruction),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Initialize { config } => {
                buf.push(0);
                let mut config_bytes = [0u8; RaffleConfig::LEN];
                config.pack_into_slice(&mut config_bytes);
                buf.extend_from_slice(&config_bytes);
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::PerformUpkeep {} => buf.push(2),
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf.push(3);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(random_words.len() as u32).to_le_bytes());
                for word in random_words {
                    buf.extend_from_slice(&word.to_le_bytes());
                }
            }
        }
        buf
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), RaffleError> {
        let value = input
            .get(..4)
            .and_then(|slice| slice.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or(RaffleError::InvalidInstruction)?;
        Ok((value, &input[4..]))
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), RaffleError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(RaffleError::InvalidInstruction)?;
        Ok((value, &input[8..]))
    }

    fn unpack_u128(input: &[u8]) -> Result<(u128, &[u8]), RaffleError> {
        let value = input
            .get(..16)
            .and_then(|slice| slice.try_into().ok())
            .map(u128::from_le_bytes)
            .ok_or(RaffleError::InvalidInstruction)?;
        Ok((value, &input[16..]))
    }
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    deployer: &Pubkey,
    raffle_account: &Pubkey,
    config: RaffleConfig,
) -> Instruction {
    let data = RaffleInstruction::Initialize { config }.pack();

    let accounts = vec![
        AccountMeta::new(*deployer, true),
        AccountMeta::new(*raffle_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle_account: &Pubkey,
    amount: u128,
) -> Instruction {
    let data = RaffleInstruction::EnterRaffle { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*raffle_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey, caller: &Pubkey, raffle_account: &Pubkey) -> Instruction {
    let data = RaffleInstruction::PerformUpkeep {}.pack();

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*raffle_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator: &Pubkey,
    raffle_account: &Pubkey,
    request_id: RequestId,
    random_words: Vec<u64>,
) -> Instruction {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*coordinator, true),
        AccountMeta::new(*raffle_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

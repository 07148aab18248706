use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
    pubkey::Pubkey,
};
use thiserror::Error;

use crate::error::CoordinatorError;
use crate::raffle_state::RaffleState;
use crate::vrf::RequestId;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RaffleError {
    /// Entry payment is below the entrance fee
    #[error("Not enough value entered: required {required}, provided {provided}")]
    InsufficientPayment { required: u128, provided: u128 },

    /// Entries are only accepted while the raffle is open
    #[error("Raffle is not open")]
    RaffleNotOpen,

    /// performUpkeep was called while checkUpkeep is false
    #[error("Upkeep not needed: balance {balance}, players {players}, state {state:?}")]
    UpkeepNotNeeded {
        balance: u128,
        players: u64,
        state: RaffleState,
    },

    /// Fulfillment for a request id that is not pending
    #[error("Unrecognized randomness request {0}")]
    UnrecognizedRequest(RequestId),

    /// Recipient refused the payment (a winner rejecting the pot)
    #[error("Transfer of {amount} to {recipient} failed")]
    TransferFailed { recipient: Pubkey, amount: u128 },

    /// Randomness delivered by someone other than the configured coordinator
    #[error("Only coordinator can fulfill: have {have}, want {want}")]
    OnlyCoordinatorCanFulfill { have: Pubkey, want: Pubkey },

    #[error("Fulfillment carried no random words")]
    MissingRandomWords,

    /// Payer cannot cover the amount sent
    #[error("Insufficient funds: balance {balance}, needed {needed}")]
    InsufficientFunds { balance: u128, needed: u128 },

    #[error("No player at index {0}")]
    PlayerIndexOutOfBounds(u64),

    #[error("Invalid instruction data")]
    InvalidInstruction,

    #[error("Instruction does not target this raffle account")]
    InvalidRaffleAccount,

    #[error("Caller must sign the instruction")]
    MissingSignature,

    #[error("Raffle not initialized")]
    NotInitialized,

    #[error("Raffle already initialized")]
    AlreadyInitialized,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Missing network parameter: {0}")]
    MissingNetworkParameter(&'static str),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),
}

impl RaffleError {
    /// Stable numeric code used when surfacing the error as a `ProgramError`
    pub fn code(&self) -> u32 {
        match self {
            RaffleError::InsufficientPayment { .. } => 0,
            RaffleError::RaffleNotOpen => 1,
            RaffleError::UpkeepNotNeeded { .. } => 2,
            RaffleError::UnrecognizedRequest(_) => 3,
            RaffleError::TransferFailed { .. } => 4,
            RaffleError::OnlyCoordinatorCanFulfill { .. } => 5,
            RaffleError::MissingRandomWords => 6,
            RaffleError::InsufficientFunds { .. } => 7,
            RaffleError::PlayerIndexOutOfBounds(_) => 8,
            RaffleError::InvalidInstruction => 9,
            RaffleError::InvalidRaffleAccount => 10,
            RaffleError::MissingSignature => 11,
            RaffleError::NotInitialized => 12,
            RaffleError::AlreadyInitialized => 13,
            RaffleError::Overflow => 14,
            RaffleError::InvalidAmount(_) => 15,
            RaffleError::UnsupportedNetwork(_) => 16,
            RaffleError::MissingNetworkParameter(_) => 17,
            RaffleError::Coordinator(_) => 18,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e.code())
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

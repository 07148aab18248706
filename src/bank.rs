// Value ledger backing entries and payouts
use solana_program::{msg, pubkey::Pubkey};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BankError {
    #[error("Insufficient funds: balance {balance}, needed {needed}")]
    InsufficientFunds { balance: u128, needed: u128 },

    #[error("Recipient {0} rejected the payment")]
    RecipientRejected(Pubkey),

    #[error("Account {0} cannot pay itself")]
    SelfTransfer(Pubkey),

    #[error("Balance overflow")]
    Overflow,
}

/// Moves value between accounts
pub trait Transfer {
    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), BankError>;
}

/// In-memory balances keyed by account
#[derive(Clone, Debug, Default)]
pub struct Bank {
    balances: HashMap<Pubkey, u128>,
    rejecting: BTreeSet<Pubkey>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, account: &Pubkey) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Credit freshly minted value to an account
    pub fn airdrop(&mut self, account: &Pubkey, amount: u128) -> Result<(), BankError> {
        let balance = self.balance(account);
        let new_balance = balance.checked_add(amount).ok_or(BankError::Overflow)?;
        self.balances.insert(*account, new_balance);
        Ok(())
    }

    /// Make `account` refuse (or accept again) incoming transfers
    pub fn set_rejects_payments(&mut self, account: &Pubkey, rejects: bool) {
        if rejects {
            self.rejecting.insert(*account);
        } else {
            self.rejecting.remove(account);
        }
    }
}

impl Transfer for Bank {
    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u128) -> Result<(), BankError> {
        if from == to {
            return Err(BankError::SelfTransfer(*from));
        }
        if self.rejecting.contains(to) {
            msg!("Transfer rejected by recipient {}", to);
            return Err(BankError::RecipientRejected(*to));
        }

        let from_balance = self.balance(from);
        let new_from_balance = from_balance
            .checked_sub(amount)
            .ok_or(BankError::InsufficientFunds {
                balance: from_balance,
                needed: amount,
            })?;

        let new_to_balance = self
            .balance(to)
            .checked_add(amount)
            .ok_or(BankError::Overflow)?;

        self.balances.insert(*from, new_from_balance);
        self.balances.insert(*to, new_to_balance);
        Ok(())
    }
}

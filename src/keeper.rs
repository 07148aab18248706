// Upkeep automation: polls the raffle and starts draws when they are due
use solana_program::{msg, pubkey::Pubkey};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

use crate::local_network::LocalNetwork;
use crate::raffle_error::RaffleError;
use crate::raffle_state::UpkeepCheck;
use crate::vrf::RequestId;

/// Something a keeper can maintain
pub trait Upkeep {
    /// Side-effect free probe
    fn check_upkeep(&self) -> UpkeepCheck;

    /// Start the draw. Returns the randomness request id when one was issued.
    fn perform_upkeep(&mut self, caller: &Pubkey) -> Result<Option<RequestId>, RaffleError>;
}

impl Upkeep for LocalNetwork {
    fn check_upkeep(&self) -> UpkeepCheck {
        LocalNetwork::check_upkeep(self)
    }

    fn perform_upkeep(&mut self, caller: &Pubkey) -> Result<Option<RequestId>, RaffleError> {
        LocalNetwork::perform_upkeep(self, caller).map(|receipt| receipt.request_id())
    }
}

pub struct Keeper {
    address: Pubkey,
    poll_interval: Duration,
}

impl Keeper {
    pub fn new(address: Pubkey, poll_interval: Duration) -> Self {
        Self {
            address,
            poll_interval,
        }
    }

    pub fn address(&self) -> Pubkey {
        self.address
    }

    /// One check-then-perform cycle
    pub fn poll<U: Upkeep + ?Sized>(&self, target: &mut U) -> Result<Option<RequestId>, RaffleError> {
        let check = target.check_upkeep();
        if !check.upkeep_needed() {
            return Ok(None);
        }

        msg!("Keeper {}: upkeep needed, performing", self.address);
        target.perform_upkeep(&self.address)
    }

    /// Poll `target` every `poll_interval` until `shutdown` changes or its
    /// sender goes away. Failed upkeeps are logged and retried on the next
    /// tick. Returns how many upkeeps were performed.
    pub async fn run<U>(self, target: Arc<Mutex<U>>, mut shutdown: watch::Receiver<bool>) -> u64
    where
        U: Upkeep + Send + 'static,
    {
        let mut performed = 0;
        if *shutdown.borrow() {
            return performed;
        }

        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let mut target = target.lock().await;
                    match self.poll(&mut *target) {
                        Ok(Some(request_id)) => {
                            performed += 1;
                            msg!("Keeper {}: draw started, request {}", self.address, request_id);
                        }
                        Ok(None) => {}
                        Err(e) => msg!("Keeper {}: upkeep failed: {}", self.address, e),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        msg!("Keeper {} stopped after {} upkeeps", self.address, performed);
        performed
    }
}

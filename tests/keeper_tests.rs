use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

use raffle_upkeep::{
    network_config::HARDHAT_CHAIN_ID, Keeper, LocalNetwork, RaffleError, RaffleState, Upkeep,
    UpkeepCheck,
};

fn deploy_with_entry() -> LocalNetwork {
    let mut local = LocalNetwork::deploy(HARDHAT_CHAIN_ID).unwrap();
    let player = local.create_funded_account().unwrap();
    let fee = local.raffle().entrance_fee();
    local.enter_raffle(&player, fee).unwrap();
    local
}

// Fails the first upkeep, succeeds on the second, then reports nothing to do
struct FlakyUpkeep {
    attempts: u32,
    done: bool,
}

impl Upkeep for FlakyUpkeep {
    fn check_upkeep(&self) -> UpkeepCheck {
        UpkeepCheck {
            is_open: !self.done,
            time_passed: true,
            has_players: true,
            has_balance: true,
        }
    }

    fn perform_upkeep(&mut self, _caller: &Pubkey) -> Result<Option<u64>, RaffleError> {
        self.attempts += 1;
        if self.attempts == 1 {
            return Err(RaffleError::Overflow);
        }
        self.done = true;
        Ok(Some(7))
    }
}

#[test]
fn test_poll_waits_for_interval() {
    let mut local = deploy_with_entry();
    let keeper = Keeper::new(Pubkey::new_unique(), Duration::from_secs(10));

    assert_eq!(keeper.poll(&mut local), Ok(None));
    assert_eq!(local.raffle().raffle_state(), RaffleState::Open);

    local.increase_time(local.raffle().interval() as i64 + 1);
    let request_id = keeper.poll(&mut local).unwrap();
    assert_eq!(request_id, local.raffle().pending_request_id());
    assert!(request_id.is_some());
    assert_eq!(local.raffle().raffle_state(), RaffleState::Calculating);

    // Nothing more to do until the draw completes
    assert_eq!(keeper.poll(&mut local), Ok(None));
}

#[tokio::test(start_paused = true)]
async fn test_keeper_performs_one_upkeep_per_round() {
    let mut local = deploy_with_entry();
    local.increase_time(local.raffle().interval() as i64 + 1);
    let network = Arc::new(Mutex::new(local));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let keeper = Keeper::new(Pubkey::new_unique(), Duration::from_secs(10));
    let handle = tokio::spawn(keeper.run(network.clone(), shutdown_rx));

    tokio::time::sleep(Duration::from_secs(15)).await;
    {
        let mut local = network.lock().await;
        assert_eq!(local.raffle().raffle_state(), RaffleState::Calculating);

        let request_id = local.raffle().pending_request_id().unwrap();
        local.fulfill_random_words(request_id).unwrap();
        assert_eq!(local.raffle().raffle_state(), RaffleState::Open);

        let player = local.create_funded_account().unwrap();
        let fee = local.raffle().entrance_fee();
        local.enter_raffle(&player, fee).unwrap();
        let interval = local.raffle().interval() as i64;
        local.increase_time(interval + 1);
    }

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(
        network.lock().await.raffle().raffle_state(),
        RaffleState::Calculating
    );

    shutdown_tx.send(true).unwrap();
    assert_eq!(handle.await.unwrap(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_keeper_retries_after_failure() {
    let target = Arc::new(Mutex::new(FlakyUpkeep {
        attempts: 0,
        done: false,
    }));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let keeper = Keeper::new(Pubkey::new_unique(), Duration::from_secs(10));
    let handle = tokio::spawn(keeper.run(target.clone(), shutdown_rx));

    tokio::time::sleep(Duration::from_secs(35)).await;
    shutdown_tx.send(true).unwrap();

    assert_eq!(handle.await.unwrap(), 1);
    let target = target.lock().await;
    assert_eq!(target.attempts, 2);
    assert!(target.done);
}

#[tokio::test]
async fn test_keeper_stops_when_already_shut_down() {
    let network = Arc::new(Mutex::new(deploy_with_entry()));
    let (_shutdown_tx, shutdown_rx) = watch::channel(true);
    let keeper = Keeper::new(Pubkey::new_unique(), Duration::from_secs(10));

    assert_eq!(keeper.run(network.clone(), shutdown_rx).await, 0);
    assert_eq!(
        network.lock().await.raffle().raffle_state(),
        RaffleState::Open
    );
}

#[tokio::test(start_paused = true)]
async fn test_keeper_stops_when_sender_dropped() {
    let network = Arc::new(Mutex::new(deploy_with_entry()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let keeper = Keeper::new(Pubkey::new_unique(), Duration::from_secs(10));
    let handle = tokio::spawn(keeper.run(network, shutdown_rx));

    drop(shutdown_tx);
    assert_eq!(handle.await.unwrap(), 0);
}

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

use raffle_upkeep::{
    error::CoordinatorError,
    events::CoordinatorEvent,
    local_network::{LocalNetwork, BASE_FEE, FUND_AMOUNT, GAS_PRICE_LINK},
    network_config::HARDHAT_CHAIN_ID,
    raffle_error::RaffleError,
    raffle_state::RaffleState,
    vrf::{expand_random_words, get_random_winner_index, RandomWordsRequest, RandomnessOracle},
    vrf_coordinator_mock::{VrfCoordinatorV2Mock, MAX_NUM_WORDS},
};

fn request(subscription_id: u64, num_words: u32) -> RandomWordsRequest {
    RandomWordsRequest {
        key_hash: [7u8; 32],
        subscription_id,
        request_confirmations: 3,
        callback_gas_limit: 500_000,
        num_words,
    }
}

// Coordinator with one funded subscription and one registered consumer
fn coordinator_with_consumer(owner: &Pubkey, consumer: &Pubkey) -> (VrfCoordinatorV2Mock, u64) {
    let mut coordinator = VrfCoordinatorV2Mock::new(BASE_FEE, GAS_PRICE_LINK);
    let subscription_id = coordinator.create_subscription(owner);
    coordinator
        .fund_subscription(subscription_id, FUND_AMOUNT)
        .unwrap();
    coordinator
        .add_consumer(owner, subscription_id, consumer)
        .unwrap();
    (coordinator, subscription_id)
}

#[test]
fn test_subscriptions_are_numbered_from_one() {
    let owner = Keypair::new();
    let mut coordinator = VrfCoordinatorV2Mock::new(BASE_FEE, GAS_PRICE_LINK);

    assert_eq!(coordinator.create_subscription(&owner.pubkey()), 1);
    assert_eq!(coordinator.create_subscription(&owner.pubkey()), 2);
    assert_eq!(
        coordinator.subscription(3).err(),
        Some(CoordinatorError::InvalidSubscription(3))
    );

    coordinator.fund_subscription(2, FUND_AMOUNT).unwrap();
    assert_eq!(coordinator.subscription(2).unwrap().balance, FUND_AMOUNT);
    assert_eq!(coordinator.subscription(1).unwrap().balance, 0);

    let events = coordinator.take_events();
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[2],
        CoordinatorEvent::SubscriptionFunded {
            subscription_id: 2,
            old_balance: 0,
            new_balance: FUND_AMOUNT
        }
    );
    assert!(coordinator.take_events().is_empty());
}

#[test]
fn test_only_owner_manages_consumers() {
    let owner = Keypair::new();
    let stranger = Keypair::new();
    let consumer = Pubkey::new_unique();
    let mut coordinator = VrfCoordinatorV2Mock::new(BASE_FEE, GAS_PRICE_LINK);
    let subscription_id = coordinator.create_subscription(&owner.pubkey());

    assert_eq!(
        coordinator
            .add_consumer(&stranger.pubkey(), subscription_id, &consumer)
            .err(),
        Some(CoordinatorError::MustBeSubOwner)
    );

    coordinator
        .add_consumer(&owner.pubkey(), subscription_id, &consumer)
        .unwrap();
    // Adding twice is a no-op
    coordinator
        .add_consumer(&owner.pubkey(), subscription_id, &consumer)
        .unwrap();
    assert_eq!(
        coordinator.subscription(subscription_id).unwrap().consumers,
        vec![consumer]
    );

    coordinator
        .remove_consumer(&owner.pubkey(), subscription_id, &consumer)
        .unwrap();
    assert_eq!(
        coordinator
            .remove_consumer(&owner.pubkey(), subscription_id, &consumer)
            .err(),
        Some(CoordinatorError::InvalidConsumer {
            subscription_id,
            consumer
        })
    );
}

#[test]
fn test_request_validation() {
    let owner = Keypair::new();
    let consumer = Pubkey::new_unique();
    let outsider = Pubkey::new_unique();
    let (mut coordinator, subscription_id) = coordinator_with_consumer(&owner.pubkey(), &consumer);

    assert_eq!(
        coordinator
            .request_random_words(&outsider, &request(subscription_id, 1))
            .err(),
        Some(CoordinatorError::InvalidConsumer {
            subscription_id,
            consumer: outsider
        })
    );
    assert_eq!(
        coordinator
            .request_random_words(&consumer, &request(subscription_id + 1, 1))
            .err(),
        Some(CoordinatorError::InvalidSubscription(subscription_id + 1))
    );
    assert_eq!(
        coordinator
            .request_random_words(&consumer, &request(subscription_id, MAX_NUM_WORDS + 1))
            .err(),
        Some(CoordinatorError::NumWordsTooBig {
            have: MAX_NUM_WORDS + 1,
            want: MAX_NUM_WORDS
        })
    );

    let first = coordinator
        .request_random_words(&consumer, &request(subscription_id, 1))
        .unwrap();
    let second = coordinator
        .request_random_words(&consumer, &request(subscription_id, 2))
        .unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert_eq!(coordinator.pending_request(second).unwrap().num_words, 2);
}

#[test]
fn test_fulfillment_lifecycle() {
    let owner = Keypair::new();
    let consumer = Pubkey::new_unique();
    let (mut coordinator, subscription_id) = coordinator_with_consumer(&owner.pubkey(), &consumer);
    let request_id = coordinator
        .request_random_words(&consumer, &request(subscription_id, 2))
        .unwrap();

    assert_eq!(
        coordinator
            .prepare_fulfillment(request_id, Some(vec![1]))
            .err(),
        Some(CoordinatorError::InvalidRandomWords { expected: 2 })
    );

    let fulfillment = coordinator.prepare_fulfillment(request_id, None).unwrap();
    assert_eq!(fulfillment.consumer, consumer);
    assert_eq!(fulfillment.random_words, expand_random_words(request_id, 2));
    assert_eq!(fulfillment.payment, BASE_FEE + GAS_PRICE_LINK * 500_000);
    // Preparing has no side effects
    assert!(coordinator.pending_request(request_id).is_some());

    coordinator.complete_fulfillment(&fulfillment).unwrap();
    assert!(coordinator.pending_request(request_id).is_none());
    assert_eq!(
        coordinator.subscription(subscription_id).unwrap().balance,
        FUND_AMOUNT - fulfillment.payment
    );
    assert_eq!(
        coordinator.prepare_fulfillment(request_id, None).err(),
        Some(CoordinatorError::NonexistentRequest(request_id))
    );
    assert_eq!(
        CoordinatorError::NonexistentRequest(request_id).to_string(),
        "nonexistent request"
    );
}

#[test]
fn test_unfunded_subscription_cannot_pay() {
    let owner = Keypair::new();
    let consumer = Pubkey::new_unique();
    let mut coordinator = VrfCoordinatorV2Mock::new(BASE_FEE, GAS_PRICE_LINK);
    let subscription_id = coordinator.create_subscription(&owner.pubkey());
    coordinator
        .add_consumer(&owner.pubkey(), subscription_id, &consumer)
        .unwrap();

    let request_id = coordinator
        .request_random_words(&consumer, &request(subscription_id, 1))
        .unwrap();
    let payment = coordinator.calculate_payment(500_000).unwrap();
    assert_eq!(
        coordinator.prepare_fulfillment(request_id, None).err(),
        Some(CoordinatorError::InsufficientBalance {
            balance: 0,
            payment
        })
    );
}

#[test]
fn test_random_words_are_deterministic_per_request() {
    let words = expand_random_words(9, 3);
    assert_eq!(words.len(), 3);
    assert_eq!(words, expand_random_words(9, 3));
    assert_ne!(words[0], words[1]);
    assert_ne!(expand_random_words(10, 1)[0], words[0]);
    assert!(expand_random_words(9, 0).is_empty());
}

#[test]
fn test_winner_index_is_word_modulo_players() {
    assert_eq!(get_random_winner_index(42, 1), 0);
    assert_eq!(get_random_winner_index(7, 4), 3);
    assert_eq!(get_random_winner_index(u64::MAX, 10), 5);
    assert_eq!(get_random_winner_index(5, 0), 0);
}

#[test]
fn test_removed_consumer_cannot_start_draw() {
    let mut local = LocalNetwork::deploy(HARDHAT_CHAIN_ID).unwrap();
    let player = local.create_funded_account().unwrap();
    let fee = local.raffle().entrance_fee();
    local.enter_raffle(&player, fee).unwrap();
    local.increase_time(local.raffle().interval() as i64 + 1);

    let deployer = local.deployer();
    let subscription_id = local.subscription_id();
    let raffle_address = local.raffle_address();
    local
        .coordinator_mut()
        .remove_consumer(&deployer, subscription_id, &raffle_address)
        .unwrap();

    assert_eq!(
        local.perform_upkeep(&player).err(),
        Some(RaffleError::Coordinator(CoordinatorError::InvalidConsumer {
            subscription_id,
            consumer: raffle_address
        }))
    );
    assert_eq!(local.raffle().raffle_state(), RaffleState::Open);
    assert_eq!(local.raffle().pending_request_id(), None);
    assert!(local.check_upkeep().upkeep_needed());
}

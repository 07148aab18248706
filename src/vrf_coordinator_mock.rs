// In-process VRF coordinator for local networks and tests
use solana_program::{msg, pubkey::Pubkey};
use std::collections::BTreeMap;

use crate::error::CoordinatorError;
use crate::events::CoordinatorEvent;
use crate::vrf::{expand_random_words, RandomWordsRequest, RandomnessOracle, RequestId};

/// Consumers allowed per subscription
pub const MAX_CONSUMERS: usize = 100;
/// Random words allowed per request
pub const MAX_NUM_WORDS: u32 = 500;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subscription {
    pub owner: Pubkey,
    pub balance: u128,
    pub consumers: Vec<Pubkey>,
}

/// A request waiting for fulfillment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRequest {
    pub subscription_id: u64,
    pub consumer: Pubkey,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

/// Words and payment prepared for delivery to a consumer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fulfillment {
    pub request_id: RequestId,
    pub consumer: Pubkey,
    pub random_words: Vec<u64>,
    pub payment: u128,
}

/// Coordinator that answers requests on demand.
///
/// Delivery is split in two so the host can run the consumer callback in
/// between: [`prepare_fulfillment`](Self::prepare_fulfillment) computes the
/// words without side effects, [`complete_fulfillment`](Self::complete_fulfillment)
/// charges the subscription and forgets the request once the consumer
/// accepted it.
#[derive(Clone, Debug)]
pub struct VrfCoordinatorV2Mock {
    base_fee: u128,
    gas_price_link: u128,
    current_subscription_id: u64,
    next_request_id: RequestId,
    subscriptions: BTreeMap<u64, Subscription>,
    requests: BTreeMap<RequestId, PendingRequest>,
    events: Vec<CoordinatorEvent>,
}

impl VrfCoordinatorV2Mock {
    pub fn new(base_fee: u128, gas_price_link: u128) -> Self {
        msg!(
            "VRF coordinator mock deployed: base fee {}, gas price {}",
            base_fee,
            gas_price_link
        );
        Self {
            base_fee,
            gas_price_link,
            current_subscription_id: 0,
            next_request_id: 1,
            subscriptions: BTreeMap::new(),
            requests: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn base_fee(&self) -> u128 {
        self.base_fee
    }

    pub fn gas_price_link(&self) -> u128 {
        self.gas_price_link
    }

    pub fn create_subscription(&mut self, owner: &Pubkey) -> u64 {
        self.current_subscription_id += 1;
        let subscription_id = self.current_subscription_id;
        self.subscriptions.insert(
            subscription_id,
            Subscription {
                owner: *owner,
                balance: 0,
                consumers: Vec::new(),
            },
        );

        msg!("Subscription {} created by {}", subscription_id, owner);
        self.events.push(CoordinatorEvent::SubscriptionCreated {
            subscription_id,
            owner: *owner,
        });
        subscription_id
    }

    pub fn fund_subscription(
        &mut self,
        subscription_id: u64,
        amount: u128,
    ) -> Result<(), CoordinatorError> {
        let subscription = self.subscription_mut(subscription_id)?;
        let old_balance = subscription.balance;
        let new_balance = old_balance
            .checked_add(amount)
            .ok_or(CoordinatorError::Overflow)?;
        subscription.balance = new_balance;

        msg!(
            "Subscription {} funded: {} -> {}",
            subscription_id,
            old_balance,
            new_balance
        );
        self.events.push(CoordinatorEvent::SubscriptionFunded {
            subscription_id,
            old_balance,
            new_balance,
        });
        Ok(())
    }

    pub fn add_consumer(
        &mut self,
        owner: &Pubkey,
        subscription_id: u64,
        consumer: &Pubkey,
    ) -> Result<(), CoordinatorError> {
        let subscription = self.owned_subscription_mut(owner, subscription_id)?;
        if subscription.consumers.contains(consumer) {
            return Ok(());
        }
        if subscription.consumers.len() >= MAX_CONSUMERS {
            return Err(CoordinatorError::TooManyConsumers(subscription_id));
        }
        subscription.consumers.push(*consumer);

        msg!("Consumer {} added to subscription {}", consumer, subscription_id);
        self.events.push(CoordinatorEvent::ConsumerAdded {
            subscription_id,
            consumer: *consumer,
        });
        Ok(())
    }

    pub fn remove_consumer(
        &mut self,
        owner: &Pubkey,
        subscription_id: u64,
        consumer: &Pubkey,
    ) -> Result<(), CoordinatorError> {
        let subscription = self.owned_subscription_mut(owner, subscription_id)?;
        let position = subscription
            .consumers
            .iter()
            .position(|c| c == consumer)
            .ok_or(CoordinatorError::InvalidConsumer {
                subscription_id,
                consumer: *consumer,
            })?;
        subscription.consumers.remove(position);

        msg!("Consumer {} removed from subscription {}", consumer, subscription_id);
        self.events.push(CoordinatorEvent::ConsumerRemoved {
            subscription_id,
            consumer: *consumer,
        });
        Ok(())
    }

    pub fn subscription(&self, subscription_id: u64) -> Result<&Subscription, CoordinatorError> {
        self.subscriptions
            .get(&subscription_id)
            .ok_or(CoordinatorError::InvalidSubscription(subscription_id))
    }

    pub fn pending_request(&self, request_id: RequestId) -> Option<&PendingRequest> {
        self.requests.get(&request_id)
    }

    /// Fee charged for delivering a request with the given callback limit
    pub fn calculate_payment(&self, callback_gas_limit: u32) -> Result<u128, CoordinatorError> {
        self.gas_price_link
            .checked_mul(u128::from(callback_gas_limit))
            .and_then(|gas_cost| gas_cost.checked_add(self.base_fee))
            .ok_or(CoordinatorError::Overflow)
    }

    /// Compute the words and payment for `request_id` without side effects.
    /// `words_override` replaces the derived words and must match the
    /// requested count.
    pub fn prepare_fulfillment(
        &self,
        request_id: RequestId,
        words_override: Option<Vec<u64>>,
    ) -> Result<Fulfillment, CoordinatorError> {
        let request = self
            .requests
            .get(&request_id)
            .ok_or(CoordinatorError::NonexistentRequest(request_id))?;

        let random_words = match words_override {
            Some(words) if words.len() != request.num_words as usize => {
                return Err(CoordinatorError::InvalidRandomWords {
                    expected: request.num_words,
                });
            }
            Some(words) => words,
            None => expand_random_words(request_id, request.num_words),
        };

        let payment = self.calculate_payment(request.callback_gas_limit)?;
        let balance = self.subscription(request.subscription_id)?.balance;
        if balance < payment {
            return Err(CoordinatorError::InsufficientBalance { balance, payment });
        }

        Ok(Fulfillment {
            request_id,
            consumer: request.consumer,
            random_words,
            payment,
        })
    }

    /// Charge the subscription and drop the request after the consumer
    /// accepted the words
    pub fn complete_fulfillment(&mut self, fulfillment: &Fulfillment) -> Result<(), CoordinatorError> {
        let request = self
            .requests
            .get(&fulfillment.request_id)
            .cloned()
            .ok_or(CoordinatorError::NonexistentRequest(fulfillment.request_id))?;

        let subscription = self.subscription_mut(request.subscription_id)?;
        subscription.balance = subscription.balance.checked_sub(fulfillment.payment).ok_or(
            CoordinatorError::InsufficientBalance {
                balance: subscription.balance,
                payment: fulfillment.payment,
            },
        )?;
        self.requests.remove(&fulfillment.request_id);

        msg!(
            "Request {} fulfilled for {}, payment {}",
            fulfillment.request_id,
            fulfillment.consumer,
            fulfillment.payment
        );
        self.events.push(CoordinatorEvent::RandomWordsFulfilled {
            request_id: fulfillment.request_id,
            payment: fulfillment.payment,
            success: true,
        });
        Ok(())
    }

    /// Drain the events emitted since the last call
    pub fn take_events(&mut self) -> Vec<CoordinatorEvent> {
        std::mem::take(&mut self.events)
    }

    fn subscription_mut(&mut self, subscription_id: u64) -> Result<&mut Subscription, CoordinatorError> {
        self.subscriptions
            .get_mut(&subscription_id)
            .ok_or(CoordinatorError::InvalidSubscription(subscription_id))
    }

    fn owned_subscription_mut(
        &mut self,
        owner: &Pubkey,
        subscription_id: u64,
    ) -> Result<&mut Subscription, CoordinatorError> {
        let subscription = self.subscription_mut(subscription_id)?;
        if subscription.owner != *owner {
            return Err(CoordinatorError::MustBeSubOwner);
        }
        Ok(subscription)
    }
}

impl RandomnessOracle for VrfCoordinatorV2Mock {
    fn request_random_words(
        &mut self,
        consumer: &Pubkey,
        request: &RandomWordsRequest,
    ) -> Result<RequestId, CoordinatorError> {
        let subscription = self.subscription(request.subscription_id)?;
        if !subscription.consumers.contains(consumer) {
            return Err(CoordinatorError::InvalidConsumer {
                subscription_id: request.subscription_id,
                consumer: *consumer,
            });
        }
        if request.num_words > MAX_NUM_WORDS {
            return Err(CoordinatorError::NumWordsTooBig {
                have: request.num_words,
                want: MAX_NUM_WORDS,
            });
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.requests.insert(
            request_id,
            PendingRequest {
                subscription_id: request.subscription_id,
                consumer: *consumer,
                callback_gas_limit: request.callback_gas_limit,
                num_words: request.num_words,
            },
        );

        msg!(
            "Random words requested: request {} by {} on subscription {}",
            request_id,
            consumer,
            request.subscription_id
        );
        self.events.push(CoordinatorEvent::RandomWordsRequested {
            key_hash: request.key_hash,
            request_id,
            subscription_id: request.subscription_id,
            minimum_request_confirmations: request.request_confirmations,
            callback_gas_limit: request.callback_gas_limit,
            num_words: request.num_words,
            sender: *consumer,
        });
        Ok(request_id)
    }
}

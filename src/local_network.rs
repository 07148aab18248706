// Local execution host: deploys the raffle against a mocked coordinator and
// runs transactions one at a time
use solana_program::{
    clock::{Clock, UnixTimestamp},
    instruction::Instruction,
    msg,
    pubkey::Pubkey,
};

use borsh::BorshSerialize;

use crate::bank::{Bank, BankError, Transfer};
use crate::events::{Event, RaffleEvent};
use crate::network_config::{network_config, raffle_config, NetworkConfig};
use crate::raffle_error::RaffleError;
use crate::raffle_instruction;
use crate::raffle_processor::{InvokeContext, Processor};
use crate::raffle_state::{Raffle, UpkeepCheck};
use crate::utils::WEI_PER_ETHER;
use crate::vrf::RequestId;
use crate::vrf_coordinator_mock::VrfCoordinatorV2Mock;

/// Premium per fulfillment charged by the coordinator mock (0.25 LINK)
pub const BASE_FEE: u128 = 250_000_000_000_000_000;
/// LINK per gas, 0.000000001 LINK per gas
pub const GAS_PRICE_LINK: u128 = 1_000_000_000;
/// Initial subscription funding (1 ether)
pub const FUND_AMOUNT: u128 = WEI_PER_ETHER;
/// Balance of every account created by the host
pub const DEFAULT_ACCOUNT_BALANCE: u128 = 10_000 * WEI_PER_ETHER;
/// Wall clock at genesis
pub const GENESIS_TIMESTAMP: UnixTimestamp = 1_700_000_000;

/// Outcome of a committed transaction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionReceipt {
    /// Slot the transaction landed in
    pub slot: u64,
    /// Events in emission order
    pub events: Vec<Event>,
}

impl TransactionReceipt {
    /// Request id announced by the raffle in this transaction
    pub fn request_id(&self) -> Option<RequestId> {
        self.raffle_events().find_map(|event| match event {
            RaffleEvent::RandomnessRequested { request_id } => Some(*request_id),
            _ => None,
        })
    }

    pub fn raffle_events(&self) -> impl Iterator<Item = &RaffleEvent> {
        self.events.iter().filter_map(|event| match event {
            Event::Raffle(raffle_event) => Some(raffle_event),
            Event::Coordinator(_) => None,
        })
    }
}

struct Snapshot {
    raffle: Raffle,
    bank: Bank,
    coordinator: VrfCoordinatorV2Mock,
}

/// A development chain hosting one raffle and its coordinator.
///
/// Every state-mutating call runs to completion before the next one and
/// is all-or-nothing: on error the raffle, balances and coordinator are
/// restored to what they were before the call.
pub struct LocalNetwork {
    chain_id: u64,
    network: NetworkConfig,
    clock: Clock,
    bank: Bank,
    coordinator: VrfCoordinatorV2Mock,
    coordinator_address: Pubkey,
    program_id: Pubkey,
    raffle_address: Pubkey,
    raffle: Raffle,
    deployer: Pubkey,
    subscription_id: u64,
}

impl LocalNetwork {
    /// Deploy the coordinator mock and the raffle on a development chain.
    ///
    /// Creates and funds a subscription, initializes the raffle with the
    /// network's parameters and registers it as a consumer.
    pub fn deploy(chain_id: u64) -> Result<Self, RaffleError> {
        let network = network_config(chain_id)
            .ok_or_else(|| RaffleError::UnsupportedNetwork(chain_id.to_string()))?;
        if !network.is_development_chain() {
            msg!("{} is not a development chain, refusing to deploy mocks", network.name);
            return Err(RaffleError::UnsupportedNetwork(network.name.to_string()));
        }

        msg!("Local network detected! Deploying mocks...");
        let clock = Clock {
            unix_timestamp: GENESIS_TIMESTAMP,
            ..Clock::default()
        };

        let deployer = Pubkey::new_unique();
        let mut bank = Bank::new();
        bank.airdrop(&deployer, DEFAULT_ACCOUNT_BALANCE)
            .map_err(|_| RaffleError::Overflow)?;

        let mut coordinator = VrfCoordinatorV2Mock::new(BASE_FEE, GAS_PRICE_LINK);
        let coordinator_address = Pubkey::new_unique();
        let subscription_id = coordinator.create_subscription(&deployer);
        coordinator.fund_subscription(subscription_id, FUND_AMOUNT)?;
        msg!("Mocks deployed!");

        let config = raffle_config(chain_id, Some((coordinator_address, subscription_id)))?;
        let program_id = Pubkey::new_unique();
        let raffle_address = Pubkey::new_unique();

        let mut local = Self {
            chain_id,
            network,
            clock,
            bank,
            coordinator,
            coordinator_address,
            program_id,
            raffle_address,
            raffle: Raffle::default(),
            deployer,
            subscription_id,
        };

        let initialize =
            raffle_instruction::initialize(&program_id, &deployer, &raffle_address, config);
        local.process_transaction(&initialize)?;
        local
            .coordinator
            .add_consumer(&deployer, subscription_id, &raffle_address)?;
        local.coordinator.take_events();

        msg!("Raffle deployed at {} on {}", raffle_address, local.network.name);
        Ok(local)
    }

    /// Run a raffle instruction as one atomic transaction
    pub fn process_transaction(
        &mut self,
        instruction: &Instruction,
    ) -> Result<TransactionReceipt, RaffleError> {
        if instruction.program_id != self.program_id {
            msg!("Unknown program {}", instruction.program_id);
            return Err(RaffleError::InvalidInstruction);
        }

        self.atomically(|local| local.invoke(instruction))
    }

    pub fn enter_raffle(
        &mut self,
        player: &Pubkey,
        amount: u128,
    ) -> Result<TransactionReceipt, RaffleError> {
        let instruction =
            raffle_instruction::enter_raffle(&self.program_id, player, &self.raffle_address, amount);
        self.process_transaction(&instruction)
    }

    /// Read-only probe, the equivalent of a simulated call
    pub fn check_upkeep(&self) -> UpkeepCheck {
        self.raffle.check_upkeep(self.clock.unix_timestamp)
    }

    pub fn perform_upkeep(&mut self, caller: &Pubkey) -> Result<TransactionReceipt, RaffleError> {
        let instruction =
            raffle_instruction::perform_upkeep(&self.program_id, caller, &self.raffle_address);
        self.process_transaction(&instruction)
    }

    /// Let the coordinator answer `request_id` with derived random words
    pub fn fulfill_random_words(
        &mut self,
        request_id: RequestId,
    ) -> Result<TransactionReceipt, RaffleError> {
        self.atomically(|local| local.deliver(request_id, None))
    }

    /// Let the coordinator answer `request_id` with the given words
    pub fn fulfill_random_words_with_override(
        &mut self,
        request_id: RequestId,
        random_words: Vec<u64>,
    ) -> Result<TransactionReceipt, RaffleError> {
        self.atomically(|local| local.deliver(request_id, Some(random_words)))
    }

    /// New account holding the default balance
    pub fn create_funded_account(&mut self) -> Result<Pubkey, RaffleError> {
        let account = Pubkey::new_unique();
        self.airdrop(&account, DEFAULT_ACCOUNT_BALANCE)?;
        Ok(account)
    }

    pub fn airdrop(&mut self, account: &Pubkey, amount: u128) -> Result<(), RaffleError> {
        self.bank
            .airdrop(account, amount)
            .map_err(|_| RaffleError::Overflow)
    }

    pub fn balance_of(&self, account: &Pubkey) -> u128 {
        self.bank.balance(account)
    }

    /// Make `account` refuse incoming payments, or accept them again
    pub fn reject_payments_to(&mut self, account: &Pubkey, rejects: bool) {
        self.bank.set_rejects_payments(account, rejects);
    }

    /// Move the wall clock forward
    pub fn increase_time(&mut self, seconds: i64) {
        self.clock.unix_timestamp = self.clock.unix_timestamp.saturating_add(seconds);
    }

    /// Produce an empty slot
    pub fn mine(&mut self) {
        self.clock.slot += 1;
    }

    pub fn now(&self) -> UnixTimestamp {
        self.clock.unix_timestamp
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn raffle(&self) -> &Raffle {
        &self.raffle
    }

    /// Borsh encoding of the raffle account
    pub fn raffle_account_data(&self) -> std::io::Result<Vec<u8>> {
        self.raffle.try_to_vec()
    }

    pub fn coordinator(&self) -> &VrfCoordinatorV2Mock {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut VrfCoordinatorV2Mock {
        &mut self.coordinator
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn program_id(&self) -> Pubkey {
        self.program_id
    }

    pub fn raffle_address(&self) -> Pubkey {
        self.raffle_address
    }

    pub fn coordinator_address(&self) -> Pubkey {
        self.coordinator_address
    }

    pub fn deployer(&self) -> Pubkey {
        self.deployer
    }

    pub fn subscription_id(&self) -> u64 {
        self.subscription_id
    }

    fn atomically<F>(&mut self, f: F) -> Result<TransactionReceipt, RaffleError>
    where
        F: FnOnce(&mut Self) -> Result<Vec<Event>, RaffleError>,
    {
        let snapshot = Snapshot {
            raffle: self.raffle.clone(),
            bank: self.bank.clone(),
            coordinator: self.coordinator.clone(),
        };

        match f(self) {
            Ok(events) => {
                self.clock.slot += 1;
                Ok(TransactionReceipt {
                    slot: self.clock.slot,
                    events,
                })
            }
            Err(e) => {
                msg!("Transaction reverted: {}", e);
                self.raffle = snapshot.raffle;
                self.bank = snapshot.bank;
                self.coordinator = snapshot.coordinator;
                Err(e)
            }
        }
    }

    fn invoke(&mut self, instruction: &Instruction) -> Result<Vec<Event>, RaffleError> {
        let mut ctx = InvokeContext {
            raffle_address: self.raffle_address,
            clock: &self.clock,
            bank: &mut self.bank,
            oracle: &mut self.coordinator,
        };
        let raffle_events = Processor::process(
            &mut self.raffle,
            &instruction.accounts,
            &instruction.data,
            &mut ctx,
        )?;

        let mut events: Vec<Event> = self
            .coordinator
            .take_events()
            .into_iter()
            .map(Event::from)
            .collect();
        events.extend(raffle_events.into_iter().map(Event::from));
        Ok(events)
    }

    fn deliver(
        &mut self,
        request_id: RequestId,
        words_override: Option<Vec<u64>>,
    ) -> Result<Vec<Event>, RaffleError> {
        let fulfillment = self
            .coordinator
            .prepare_fulfillment(request_id, words_override)?;
        if fulfillment.consumer != self.raffle_address {
            msg!("Request {} belongs to unknown consumer {}", request_id, fulfillment.consumer);
            return Err(RaffleError::InvalidRaffleAccount);
        }

        let callback = raffle_instruction::fulfill_random_words(
            &self.program_id,
            &self.coordinator_address,
            &self.raffle_address,
            request_id,
            fulfillment.random_words.clone(),
        );
        let mut events = self.invoke(&callback)?;

        self.coordinator.complete_fulfillment(&fulfillment)?;
        events.extend(self.coordinator.take_events().into_iter().map(Event::from));
        Ok(events)
    }
}

/// Plain value transfers between accounts, outside of the raffle
impl Transfer for LocalNetwork {
    fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        amount: u128,
    ) -> Result<(), BankError> {
        self.bank.transfer(from, to, amount)
    }
}

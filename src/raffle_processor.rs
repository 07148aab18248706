use solana_program::{
    clock::{Clock, UnixTimestamp},
    instruction::AccountMeta,
    msg,
    pubkey::Pubkey,
};

use crate::bank::{BankError, Transfer};
use crate::events::RaffleEvent;
use crate::raffle_error::RaffleError;
use crate::raffle_instruction::RaffleInstruction;
use crate::raffle_state::{
    PendingDraw, Raffle, RaffleConfig, RaffleState, NUM_WORDS, REQUEST_CONFIRMATIONS,
};
use crate::utils::format_ether;
use crate::vrf::{self, RandomWordsRequest, RandomnessOracle, RequestId};

/// Everything the host hands to the processor for one instruction
pub struct InvokeContext<'a> {
    /// Address holding the raffle's funds
    pub raffle_address: Pubkey,
    pub clock: &'a Clock,
    pub bank: &'a mut dyn Transfer,
    pub oracle: &'a mut dyn RandomnessOracle,
}

pub struct Processor;

impl Processor {
    pub fn process(
        raffle: &mut Raffle,
        accounts: &[AccountMeta],
        instruction_data: &[u8],
        ctx: &mut InvokeContext<'_>,
    ) -> Result<Vec<RaffleEvent>, RaffleError> {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        let account_iter = &mut accounts.iter();
        let caller = next_account_meta(account_iter)?;
        let raffle_account = next_account_meta(account_iter)?;

        if !caller.is_signer {
            msg!("Caller must sign the transaction");
            return Err(RaffleError::MissingSignature);
        }
        if raffle_account.pubkey != ctx.raffle_address {
            msg!("Invalid raffle account {}", raffle_account.pubkey);
            return Err(RaffleError::InvalidRaffleAccount);
        }
        if !raffle.is_initialized && !matches!(instruction, RaffleInstruction::Initialize { .. }) {
            msg!("Raffle account is not initialized");
            return Err(RaffleError::NotInitialized);
        }

        let now = ctx.clock.unix_timestamp;
        match instruction {
            RaffleInstruction::Initialize { config } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(raffle, config, now)?;
                Ok(Vec::new())
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                if caller.pubkey == ctx.raffle_address {
                    msg!("Raffle account cannot enter its own raffle");
                    return Err(RaffleError::InvalidRaffleAccount);
                }
                Self::check_entry(raffle, amount)?;
                ctx.bank
                    .transfer(&caller.pubkey, &ctx.raffle_address, amount)
                    .map_err(|e| match e {
                        BankError::InsufficientFunds { balance, needed } => {
                            msg!("Insufficient funds: needed {}, had {}", needed, balance);
                            RaffleError::InsufficientFunds { balance, needed }
                        }
                        BankError::RecipientRejected(recipient)
                        | BankError::SelfTransfer(recipient) => {
                            RaffleError::TransferFailed { recipient, amount }
                        }
                        BankError::Overflow => RaffleError::Overflow,
                    })?;
                let event = Self::process_enter_raffle(raffle, caller.pubkey, amount)?;
                Ok(vec![event])
            }
            RaffleInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                let event =
                    Self::process_perform_upkeep(raffle, now, &ctx.raffle_address, &mut *ctx.oracle)?;
                Ok(vec![event])
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                let event = Self::process_fulfill_random_words(
                    raffle,
                    &caller.pubkey,
                    request_id,
                    &random_words,
                    now,
                    &ctx.raffle_address,
                    &mut *ctx.bank,
                )?;
                Ok(vec![event])
            }
        }
    }

    fn process_initialize(
        raffle: &mut Raffle,
        config: RaffleConfig,
        now: UnixTimestamp,
    ) -> Result<(), RaffleError> {
        if raffle.is_initialized {
            msg!("Raffle account is already initialized");
            return Err(RaffleError::AlreadyInitialized);
        }

        *raffle = Raffle::new(config, now);

        msg!(
            "Raffle initialized: Coordinator={}, Subscription={}, EntranceFee={} ETH, Interval={}s",
            config.vrf_coordinator,
            config.subscription_id,
            format_ether(config.entrance_fee),
            config.interval
        );
        Ok(())
    }

    /// Validate an entry of `amount` without changing anything
    pub fn check_entry(raffle: &Raffle, amount: u128) -> Result<(), RaffleError> {
        if amount < raffle.config.entrance_fee {
            msg!(
                "Not enough value entered: required {}, provided {}",
                raffle.config.entrance_fee,
                amount
            );
            return Err(RaffleError::InsufficientPayment {
                required: raffle.config.entrance_fee,
                provided: amount,
            });
        }
        if raffle.state != RaffleState::Open {
            msg!("Raffle is not open");
            return Err(RaffleError::RaffleNotOpen);
        }
        raffle.pot.checked_add(amount).ok_or(RaffleError::Overflow)?;
        Ok(())
    }

    /// Record an entry. The value is expected to be with the raffle already.
    pub fn process_enter_raffle(
        raffle: &mut Raffle,
        player: Pubkey,
        amount: u128,
    ) -> Result<RaffleEvent, RaffleError> {
        Self::check_entry(raffle, amount)?;

        raffle.players.push(player);
        raffle.pot += amount;

        msg!(
            "Player {} entered with {} wei, {} players in round {}",
            player,
            amount,
            raffle.players.len(),
            raffle.round
        );
        Ok(RaffleEvent::EnteredRaffle { player })
    }

    /// OPEN -> CALCULATING. Requests randomness for `consumer` when the
    /// upkeep conditions hold at `now`. The oracle must hand out strictly
    /// increasing ids; a reused id fails with `UnrecognizedRequest`.
    pub fn process_perform_upkeep(
        raffle: &mut Raffle,
        now: UnixTimestamp,
        consumer: &Pubkey,
        oracle: &mut dyn RandomnessOracle,
    ) -> Result<RaffleEvent, RaffleError> {
        let check = raffle.check_upkeep(now);
        if !check.upkeep_needed() {
            msg!("Upkeep not needed: {:?}", check);
            return Err(RaffleError::UpkeepNotNeeded {
                balance: raffle.pot,
                players: raffle.number_of_players(),
                state: raffle.state,
            });
        }

        let request = RandomWordsRequest {
            key_hash: raffle.config.gas_lane,
            subscription_id: raffle.config.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: raffle.config.callback_gas_limit,
            num_words: NUM_WORDS,
        };
        let request_id = oracle.request_random_words(consumer, &request)?;
        if request_id <= raffle.last_request_id {
            msg!(
                "Oracle reused request id {}, last issued {}",
                request_id,
                raffle.last_request_id
            );
            return Err(RaffleError::UnrecognizedRequest(request_id));
        }

        raffle.state = RaffleState::Calculating;
        raffle.last_request_id = request_id;
        raffle.pending_requests.insert(
            request_id,
            PendingDraw {
                round: raffle.round,
                requested_at: now,
            },
        );

        msg!(
            "Requested raffle winner: request {} for round {} with {} players",
            request_id,
            raffle.round,
            raffle.players.len()
        );
        Ok(RaffleEvent::RandomnessRequested { request_id })
    }

    /// CALCULATING -> OPEN. Picks the winner for a pending request, pays
    /// out the pot and starts the next round. Nothing changes unless the
    /// payout succeeds.
    pub fn process_fulfill_random_words(
        raffle: &mut Raffle,
        caller: &Pubkey,
        request_id: RequestId,
        random_words: &[u64],
        now: UnixTimestamp,
        raffle_address: &Pubkey,
        bank: &mut dyn Transfer,
    ) -> Result<RaffleEvent, RaffleError> {
        if *caller != raffle.config.vrf_coordinator {
            msg!("Only the coordinator can fulfill, got {}", caller);
            return Err(RaffleError::OnlyCoordinatorCanFulfill {
                have: *caller,
                want: raffle.config.vrf_coordinator,
            });
        }

        let pending = raffle
            .pending_requests
            .get(&request_id)
            .copied()
            .ok_or_else(|| {
                msg!("Rejecting fulfillment for unrecognized request {}", request_id);
                RaffleError::UnrecognizedRequest(request_id)
            })?;

        let random_word = *random_words.first().ok_or(RaffleError::MissingRandomWords)?;
        let winner_index = vrf::get_random_winner_index(random_word, raffle.number_of_players());
        let winner = raffle.player(winner_index)?;
        let prize = raffle.pot;
        let next_round = raffle.round.checked_add(1).ok_or(RaffleError::Overflow)?;

        msg!(
            "Random winner index {} of {} for request {}",
            winner_index,
            raffle.players.len(),
            request_id
        );

        bank.transfer(raffle_address, &winner, prize).map_err(|e| {
            msg!("Payout of {} to {} failed: {}", prize, winner, e);
            RaffleError::TransferFailed {
                recipient: winner,
                amount: prize,
            }
        })?;

        raffle.recent_winner = Some(winner);
        raffle.players.clear();
        raffle.pot = 0;
        raffle.last_timestamp = now;
        raffle.state = RaffleState::Open;
        raffle.pending_requests.remove(&request_id);
        raffle.round = next_round;

        msg!(
            "Winner picked for round {}: {} receives {} ETH",
            pending.round,
            winner,
            format_ether(prize)
        );
        Ok(RaffleEvent::WinnerPicked { winner })
    }
}

fn next_account_meta<'a, I: Iterator<Item = &'a AccountMeta>>(
    iter: &mut I,
) -> Result<&'a AccountMeta, RaffleError> {
    iter.next().ok_or(RaffleError::InvalidInstruction)
}

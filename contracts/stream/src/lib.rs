#![no_std]

mod accrual;
pub mod events;
mod guard;
mod storage;
mod transfer;

use soroban_sdk::{contract, contractimpl, contracttype, log, Address, Env, String};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Global configuration, written once by `init`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Stellar Asset Contract of the network's native currency.
    pub native_token: Address,
    pub owner: Address,
}

/// Selects the registry a stream lives in. Stream ids are shared across
/// registries, so an id is only meaningful together with its asset key.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AssetKey {
    Native,
    Token(Address),
}

#[soroban_sdk::contracterror]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    StreamNotFound = 1,
    InvalidState = 2,
    InvalidRecipient = 3,
    InvalidStartTime = 4,
    InvalidStopTime = 5,
    DepositTooSmall = 6,
    DepositMustBeGreaterThanZero = 7,
    InvalidTokenAddress = 8,
    InvalidMetadata = 9,
    InvalidRecurringPeriod = 10,
    OnlyRecipientCanWithdraw = 11,
    StreamNotStarted = 12,
    NothingToWithdraw = 13,
    TransferFailed = 14,
    Unauthorized = 15,
    ContractPaused = 16,
    ReentrantCall = 17,
}

/// Display metadata supplied at creation. Every field must be non-empty.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamMetadata {
    pub name: String,
    pub description: String,
    pub image_url: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stream {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub deposit: i128,
    pub rate_per_second: i128,
    pub remaining_balance: i128,
    pub start_time: u64,
    pub stop_time: u64,
    pub recipient: Address,
    pub is_recurring: bool,
    pub recurring_period: u64,
}

/// Read-only view of a stream. An absent stream reads as the zeroed record
/// (empty strings, zero amounts and times, no recipient); use
/// `stream_exists` to tell the two apart.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamDetails {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub deposit: i128,
    pub rate_per_second: i128,
    pub remaining_balance: i128,
    pub start_time: u64,
    pub stop_time: u64,
    pub recipient: Option<Address>,
    pub is_recurring: bool,
    pub recurring_period: u64,
}

impl StreamDetails {
    fn zeroed(env: &Env) -> Self {
        let empty = String::from_str(env, "");
        StreamDetails {
            name: empty.clone(),
            description: empty.clone(),
            image_url: empty,
            deposit: 0,
            rate_per_second: 0,
            remaining_balance: 0,
            start_time: 0,
            stop_time: 0,
            recipient: None,
            is_recurring: false,
            recurring_period: 0,
        }
    }
}

impl From<Stream> for StreamDetails {
    fn from(stream: Stream) -> Self {
        StreamDetails {
            name: stream.name,
            description: stream.description,
            image_url: stream.image_url,
            deposit: stream.deposit,
            rate_per_second: stream.rate_per_second,
            remaining_balance: stream.remaining_balance,
            start_time: stream.start_time,
            stop_time: stream.stop_time,
            recipient: Some(stream.recipient),
            is_recurring: stream.is_recurring,
            recurring_period: stream.recurring_period,
        }
    }
}

/// Namespace for all contract storage keys.
#[contracttype]
pub enum DataKey {
    Config,                     // Instance: native token and owner.
    NextStreamId,               // Instance: last issued id, shared by both registries.
    UnallocatedBalance,         // Instance: running total of native deposits.
    Paused,                     // Instance: gates token-stream creation.
    WithdrawLock,               // Instance: set while a withdraw is in flight.
    NativeStream(u64),          // Persistent: native registry.
    TokenStream(Address, u64),  // Persistent: token registry keyed by (token, id).
}

// ---------------------------------------------------------------------------
// Internal Helpers
// ---------------------------------------------------------------------------

impl StreamLedger {
    #[allow(clippy::too_many_arguments)]
    fn validate_stream_params(
        env: &Env,
        metadata: &StreamMetadata,
        recipient: &Address,
        deposit: i128,
        start_time: u64,
        stop_time: u64,
        is_recurring: bool,
        recurring_period: u64,
    ) -> Result<(), ContractError> {
        // The ledger itself plays the role of the null address.
        if *recipient == env.current_contract_address() {
            return Err(ContractError::InvalidRecipient);
        }

        if start_time == 0 || start_time < env.ledger().timestamp() {
            return Err(ContractError::InvalidStartTime);
        }
        if stop_time <= start_time {
            return Err(ContractError::InvalidStopTime);
        }

        if deposit <= 0 {
            return Err(ContractError::DepositMustBeGreaterThanZero);
        }
        if accrual::rate_for(deposit, start_time, stop_time) == 0 {
            return Err(ContractError::DepositTooSmall);
        }

        if metadata.name.len() == 0
            || metadata.description.len() == 0
            || metadata.image_url.len() == 0
        {
            return Err(ContractError::InvalidMetadata);
        }

        if is_recurring && recurring_period == 0 {
            return Err(ContractError::InvalidRecurringPeriod);
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn persist_new_stream(
        env: &Env,
        asset: AssetKey,
        metadata: StreamMetadata,
        recipient: Address,
        deposit: i128,
        start_time: u64,
        stop_time: u64,
        is_recurring: bool,
        recurring_period: u64,
    ) -> u64 {
        let stream_id = storage::next_stream_id(env);

        let stream = Stream {
            name: metadata.name,
            description: metadata.description,
            image_url: metadata.image_url,
            deposit,
            rate_per_second: accrual::rate_for(deposit, start_time, stop_time),
            remaining_balance: deposit,
            start_time,
            stop_time,
            recipient: recipient.clone(),
            is_recurring,
            recurring_period,
        };
        storage::insert_stream(env, &asset, stream_id, &stream);

        events::stream_created(
            env,
            stream_id,
            events::StreamCreated {
                asset,
                recipient,
                deposit,
                start_time,
                stop_time,
                is_recurring,
            },
        );

        stream_id
    }

    /// Roll an expired recurring stream into its next window.
    ///
    /// Only one window is opened per call, even if several periods have
    /// passed since `stop_time`.
    fn renew(
        env: &Env,
        asset: &AssetKey,
        stream_id: u64,
        stream: &mut Stream,
    ) -> Result<(), ContractError> {
        let start_time = stream.stop_time;
        let stop_time = start_time
            .checked_add(stream.recurring_period)
            .ok_or(ContractError::InvalidRecurringPeriod)?;

        stream.start_time = start_time;
        stream.stop_time = stop_time;
        stream.remaining_balance = stream.deposit;

        log!(env, "stream renewed", stream_id, start_time, stop_time);
        events::stream_renewed(
            env,
            stream_id,
            events::StreamRenewed {
                asset: asset.clone(),
                start_time,
                stop_time,
                remaining_balance: stream.remaining_balance,
            },
        );
        Ok(())
    }

    /// Shared withdraw path. Must run under the withdraw lock.
    ///
    /// Registry state is written before the outbound transfer. A failed
    /// transfer returns an error, which makes the host discard those writes.
    fn withdraw_stream(
        env: &Env,
        asset: AssetKey,
        stream_id: u64,
        caller: &Address,
    ) -> Result<i128, ContractError> {
        let stream = storage::load_stream(env, &asset, stream_id)?;

        if *caller != stream.recipient {
            return Err(ContractError::OnlyRecipientCanWithdraw);
        }

        let now = env.ledger().timestamp();
        if now < stream.start_time {
            return Err(ContractError::StreamNotStarted);
        }

        let amount = accrual::withdrawable_amount(&stream, now);
        if amount == 0 {
            return Err(ContractError::NothingToWithdraw);
        }

        if now >= stream.stop_time && !stream.is_recurring {
            storage::remove_stream(env, &asset, stream_id);
            log!(env, "stream closed", stream_id, stream.remaining_balance - amount);
        } else {
            storage::update_stream(env, &asset, stream_id, |s| {
                s.remaining_balance -= amount;
                if now >= s.stop_time {
                    Self::renew(env, &asset, stream_id, s)?;
                }
                Ok(())
            })?;
        }

        match &asset {
            AssetKey::Native => {
                let native_token = storage::get_config(env).native_token;
                transfer::push_native(env, &native_token, &stream.recipient, amount)?;
            }
            AssetKey::Token(token) => {
                transfer::push_token(env, token, &stream.recipient, amount)?;
            }
        }

        events::withdrawal(
            env,
            stream_id,
            events::Withdrawal {
                asset,
                recipient: stream.recipient,
                amount,
            },
        );
        Ok(amount)
    }
}

// ---------------------------------------------------------------------------
// Contract Implementation
// ---------------------------------------------------------------------------

#[contract]
pub struct StreamLedger;

#[contractimpl]
impl StreamLedger {
    /// Initialise the ledger with the native asset contract and the owner.
    ///
    /// Must be called exactly once. The owner is fixed from here on; there is
    /// no rotation entry point.
    ///
    /// # Panics
    /// - If called more than once (contract already initialised)
    pub fn init(env: Env, native_token: Address, owner: Address) {
        if storage::has_config(&env) {
            panic!("already initialised");
        }
        storage::set_config(&env, &Config { native_token, owner });
    }

    /// Create a stream funded with the native currency.
    ///
    /// Pulls `deposit` from `sender` into custody and opens a window over
    /// `[start_time, stop_time)` paying `deposit / (stop_time - start_time)`
    /// per second (floor division) to `recipient`.
    ///
    /// # Authorization
    /// - Requires authorization from `sender`
    ///
    /// # Errors (checked in this order)
    /// - `InvalidRecipient`: `recipient` is the ledger itself
    /// - `InvalidStartTime`: `start_time` is zero or in the past
    /// - `InvalidStopTime`: `stop_time <= start_time`
    /// - `DepositMustBeGreaterThanZero`: `deposit <= 0`
    /// - `DepositTooSmall`: the rate would floor to zero
    /// - `InvalidMetadata`: any metadata field is empty
    /// - `InvalidRecurringPeriod`: recurring with a zero period
    /// - `TransferFailed`: the deposit could not be pulled
    ///
    /// # State Changes
    /// - Allocates the next id from the shared counter
    /// - Inserts the stream in the native registry
    /// - Adds `deposit` to `unallocated_balance`
    ///
    /// Native creation is not gated by `pause`.
    ///
    /// # Events
    /// - `("created", stream_id)` with a `StreamCreated` payload
    ///
    /// # Examples
    /// - `deposit = 1000`, `start = t`, `stop = t + 100` → rate 10/s
    /// - `deposit = 5`, window of 10s → rejected with `DepositTooSmall`
    #[allow(clippy::too_many_arguments)]
    pub fn create_native_stream(
        env: Env,
        sender: Address,
        metadata: StreamMetadata,
        recipient: Address,
        deposit: i128,
        start_time: u64,
        stop_time: u64,
        is_recurring: bool,
        recurring_period: u64,
    ) -> Result<u64, ContractError> {
        sender.require_auth();

        Self::validate_stream_params(
            &env,
            &metadata,
            &recipient,
            deposit,
            start_time,
            stop_time,
            is_recurring,
            recurring_period,
        )?;

        let native_token = storage::get_config(&env).native_token;
        transfer::pull_native(&env, &native_token, &sender, deposit)?;

        let stream_id = Self::persist_new_stream(
            &env,
            AssetKey::Native,
            metadata,
            recipient,
            deposit,
            start_time,
            stop_time,
            is_recurring,
            recurring_period,
        );
        storage::add_unallocated_balance(&env, deposit);

        Ok(stream_id)
    }

    /// Create a stream funded with `token`.
    ///
    /// Same validation and accounting as `create_native_stream`, plus:
    /// - `ContractPaused` while the ledger is paused
    /// - `InvalidTokenAddress` if `token` is the ledger itself
    ///
    /// The deposit is pulled with a raw `transfer` call; tokens that return
    /// `false` are treated as a failed pull. `unallocated_balance` is not
    /// touched on this path.
    #[allow(clippy::too_many_arguments)]
    pub fn create_token_stream(
        env: Env,
        sender: Address,
        metadata: StreamMetadata,
        token: Address,
        recipient: Address,
        deposit: i128,
        start_time: u64,
        stop_time: u64,
        is_recurring: bool,
        recurring_period: u64,
    ) -> Result<u64, ContractError> {
        sender.require_auth();
        guard::require_not_paused(&env)?;

        if token == env.current_contract_address() {
            return Err(ContractError::InvalidTokenAddress);
        }

        Self::validate_stream_params(
            &env,
            &metadata,
            &recipient,
            deposit,
            start_time,
            stop_time,
            is_recurring,
            recurring_period,
        )?;

        transfer::pull_token(&env, &token, &sender, deposit)?;

        Ok(Self::persist_new_stream(
            &env,
            AssetKey::Token(token),
            metadata,
            recipient,
            deposit,
            start_time,
            stop_time,
            is_recurring,
            recurring_period,
        ))
    }

    /// Withdraw everything currently vested from a native stream.
    ///
    /// # Parameters
    /// - `caller`: must be the stream's recipient and authorize the call
    /// - `stream_id`: id in the native registry
    ///
    /// # Returns
    /// - The amount paid out
    ///
    /// # Errors
    /// - `ReentrantCall`: another withdraw is still in flight
    /// - `StreamNotFound`: no native stream with this id
    /// - `OnlyRecipientCanWithdraw`: `caller` is not the recipient
    /// - `StreamNotStarted`: ledger time is before `start_time`
    /// - `NothingToWithdraw`: nothing has vested since the last withdrawal
    /// - `TransferFailed`: the payout failed; no state change is kept
    ///
    /// # State Changes
    /// - `remaining_balance -= amount`
    /// - At/after `stop_time`: a recurring stream renews into its next
    ///   window, any other stream is deleted
    ///
    /// # Events
    /// - `("renewed", stream_id)` when the stream rolls over
    /// - `("withdrew", stream_id)` with the realized amount
    ///
    /// # Examples
    /// - 1000 over 100s, withdraw at `start + 50` → 500
    /// - then at `start + 150` → 500 and the stream is removed
    pub fn withdraw_from_native_stream(
        env: Env,
        caller: Address,
        stream_id: u64,
    ) -> Result<i128, ContractError> {
        caller.require_auth();
        guard::with_withdraw_lock(&env, || {
            Self::withdraw_stream(&env, AssetKey::Native, stream_id, &caller)
        })
    }

    /// Token counterpart of `withdraw_from_native_stream`. `token` selects
    /// the registry; the payout goes through the token's own `transfer`.
    pub fn withdraw_from_token_stream(
        env: Env,
        caller: Address,
        token: Address,
        stream_id: u64,
    ) -> Result<i128, ContractError> {
        caller.require_auth();
        guard::with_withdraw_lock(&env, || {
            Self::withdraw_stream(&env, AssetKey::Token(token), stream_id, &caller)
        })
    }

    /// Retrieve a stream record.
    ///
    /// Never fails: an absent id (never created, or already drained and
    /// deleted) returns the zeroed record. Check `stream_exists` before
    /// trusting a zeroed result.
    pub fn get_stream_details(env: Env, asset: AssetKey, stream_id: u64) -> StreamDetails {
        match storage::get_stream(&env, &asset, stream_id) {
            Some(stream) => stream.into(),
            None => StreamDetails::zeroed(&env),
        }
    }

    pub fn stream_exists(env: Env, asset: AssetKey, stream_id: u64) -> bool {
        storage::has_stream(&env, &asset, stream_id)
    }

    /// Amount the recipient could withdraw at the current ledger time.
    ///
    /// Pure view over the stored stream; renewal is not simulated, so for an
    /// expired recurring stream this reports what the next withdraw pays
    /// before it rolls over.
    pub fn withdrawable_amount_of(
        env: Env,
        asset: AssetKey,
        stream_id: u64,
    ) -> Result<i128, ContractError> {
        let stream = storage::load_stream(&env, &asset, stream_id)?;
        Ok(accrual::withdrawable_amount(&stream, env.ledger().timestamp()))
    }

    /// Last stream id issued across both registries (0 before the first).
    pub fn get_stream_count(env: Env) -> u64 {
        storage::get_stream_count(&env)
    }

    /// Running total of native deposits taken at creation. Diagnostic only:
    /// it is never decremented and does not track custody.
    pub fn get_unallocated_balance(env: Env) -> i128 {
        storage::get_unallocated_balance(&env)
    }

    pub fn get_config(env: Env) -> Config {
        storage::get_config(&env)
    }

    pub fn is_paused(env: Env) -> bool {
        guard::is_paused(&env)
    }

    /// Block token-stream creation. Owner only.
    ///
    /// # Errors
    /// - `Unauthorized`: `caller` is not the owner
    /// - `InvalidState`: already paused
    pub fn pause(env: Env, caller: Address) -> Result<(), ContractError> {
        guard::require_owner(&env, &caller)?;
        guard::set_paused(&env, true)?;
        events::paused(&env, caller);
        Ok(())
    }

    /// Lift the pause. Owner only; `InvalidState` if not paused.
    pub fn unpause(env: Env, caller: Address) -> Result<(), ContractError> {
        guard::require_owner(&env, &caller)?;
        guard::set_paused(&env, false)?;
        events::unpaused(&env, caller);
        Ok(())
    }

    /// Move native funds into custody without opening a stream.
    ///
    /// Funds deposited this way back no stream and are only reachable
    /// through the administrative withdraw.
    pub fn deposit_to_custody(env: Env, from: Address, amount: i128) -> Result<(), ContractError> {
        from.require_auth();
        if amount <= 0 {
            return Err(ContractError::DepositMustBeGreaterThanZero);
        }

        let native_token = storage::get_config(&env).native_token;
        transfer::pull_native(&env, &native_token, &from, amount)?;

        events::custody_deposit(&env, events::CustodyDeposit { from, amount });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Administrative escape hatch
// ---------------------------------------------------------------------------

// SECURITY: these entry points move funds out of the ledger's total custody
// with no regard for stream accounting. A call can leave live streams
// unbacked, after which their withdrawals fail with `TransferFailed`.
// Production deployments should strip them or put the owner behind a
// multisig and timelock.
#[contractimpl]
impl StreamLedger {
    /// Pay `amount` of the native asset out of custody to `to`.
    ///
    /// # Errors
    /// - `Unauthorized`: `caller` is not the owner
    /// - `InvalidRecipient`: `to` is the ledger itself
    /// - `DepositMustBeGreaterThanZero`: `amount <= 0`
    /// - `TransferFailed`: custody could not cover the payout
    pub fn admin_withdraw_native(
        env: Env,
        caller: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        guard::require_owner(&env, &caller)?;

        if to == env.current_contract_address() {
            return Err(ContractError::InvalidRecipient);
        }
        if amount <= 0 {
            return Err(ContractError::DepositMustBeGreaterThanZero);
        }

        let native_token = storage::get_config(&env).native_token;
        transfer::push_native(&env, &native_token, &to, amount)?;

        events::admin_withdrawal_native(&env, events::AdminWithdrawal { to, amount });
        Ok(())
    }

    /// Pay `amount` of `token` out of custody to `to`. Same checks as
    /// `admin_withdraw_native`, plus `InvalidTokenAddress` when `token` is
    /// the ledger itself.
    pub fn admin_withdraw_token(
        env: Env,
        caller: Address,
        token: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), ContractError> {
        guard::require_owner(&env, &caller)?;

        if token == env.current_contract_address() {
            return Err(ContractError::InvalidTokenAddress);
        }
        if to == env.current_contract_address() {
            return Err(ContractError::InvalidRecipient);
        }
        if amount <= 0 {
            return Err(ContractError::DepositMustBeGreaterThanZero);
        }

        transfer::push_token(&env, &token, &to, amount)?;

        events::admin_withdrawal_token(&env, token, events::AdminWithdrawal { to, amount });
        Ok(())
    }
}

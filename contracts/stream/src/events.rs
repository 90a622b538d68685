//! Audit events published on the host event log.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use crate::AssetKey;

/// Payload of `("created", stream_id)`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamCreated {
    pub asset: AssetKey,
    pub recipient: Address,
    pub deposit: i128,
    pub start_time: u64,
    pub stop_time: u64,
    pub is_recurring: bool,
}

/// Payload of `("withdrew", stream_id)`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdrawal {
    pub asset: AssetKey,
    pub recipient: Address,
    pub amount: i128,
}

/// Payload of `("renewed", stream_id)`; times are the new window.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StreamRenewed {
    pub asset: AssetKey,
    pub start_time: u64,
    pub stop_time: u64,
    pub remaining_balance: i128,
}

/// Payload of `("adm_wd",)` and `("adm_wdt", token)`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminWithdrawal {
    pub to: Address,
    pub amount: i128,
}

/// Payload of `("deposit",)`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CustodyDeposit {
    pub from: Address,
    pub amount: i128,
}

/// Topics `("created", stream_id)`.
pub fn stream_created(env: &Env, stream_id: u64, event: StreamCreated) {
    env.events()
        .publish((symbol_short!("created"), stream_id), event);
}

/// Topics `("withdrew", stream_id)`, emitted after a successful payout.
pub fn withdrawal(env: &Env, stream_id: u64, event: Withdrawal) {
    env.events()
        .publish((symbol_short!("withdrew"), stream_id), event);
}

/// Topics `("renewed", stream_id)`.
pub fn stream_renewed(env: &Env, stream_id: u64, event: StreamRenewed) {
    env.events()
        .publish((symbol_short!("renewed"), stream_id), event);
}

/// Topics `("paused",)`, data is the owner.
pub fn paused(env: &Env, owner: Address) {
    env.events().publish((symbol_short!("paused"),), owner);
}

/// Topics `("unpaused",)`, data is the owner.
pub fn unpaused(env: &Env, owner: Address) {
    env.events().publish((symbol_short!("unpaused"),), owner);
}

/// Topics `("adm_wd",)`.
pub fn admin_withdrawal_native(env: &Env, event: AdminWithdrawal) {
    env.events().publish((symbol_short!("adm_wd"),), event);
}

/// Topics `("adm_wdt", token)`.
pub fn admin_withdrawal_token(env: &Env, token: Address, event: AdminWithdrawal) {
    env.events()
        .publish((symbol_short!("adm_wdt"), token), event);
}

/// Topics `("deposit",)`.
pub fn custody_deposit(env: &Env, event: CustodyDeposit) {
    env.events().publish((symbol_short!("deposit"),), event);
}

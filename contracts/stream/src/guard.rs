use soroban_sdk::{Address, Env};

use crate::{storage, ContractError, DataKey};

/// Require `caller` to authorize the invocation and to be the configured owner.
pub fn require_owner(env: &Env, caller: &Address) -> Result<(), ContractError> {
    caller.require_auth();
    if *caller != storage::get_config(env).owner {
        return Err(ContractError::Unauthorized);
    }
    Ok(())
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) -> Result<(), ContractError> {
    if is_paused(env) == paused {
        return Err(ContractError::InvalidState);
    }
    env.storage().instance().set(&DataKey::Paused, &paused);
    Ok(())
}

pub fn require_not_paused(env: &Env) -> Result<(), ContractError> {
    if is_paused(env) {
        return Err(ContractError::ContractPaused);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Withdraw lock
// ---------------------------------------------------------------------------

/// Engage the withdraw lock. Fails while any withdraw, on any stream or
/// asset, is still in flight.
pub fn acquire_withdraw_lock(env: &Env) -> Result<(), ContractError> {
    if is_withdraw_locked(env) {
        return Err(ContractError::ReentrantCall);
    }
    env.storage().instance().set(&DataKey::WithdrawLock, &true);
    Ok(())
}

pub fn release_withdraw_lock(env: &Env) {
    env.storage().instance().remove(&DataKey::WithdrawLock);
}

pub fn is_withdraw_locked(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::WithdrawLock)
        .unwrap_or(false)
}

/// Run `f` with the withdraw lock held. The lock is released whether `f`
/// succeeds or fails.
pub fn with_withdraw_lock<T, F>(env: &Env, f: F) -> Result<T, ContractError>
where
    F: FnOnce() -> Result<T, ContractError>,
{
    acquire_withdraw_lock(env)?;
    let result = f();
    release_withdraw_lock(env);
    result
}

#[cfg(test)]
mod tests {
    use soroban_sdk::Env;

    use super::*;
    use crate::StreamLedger;

    #[test]
    fn nested_acquire_is_rejected() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamLedger);

        env.as_contract(&contract_id, || {
            let outer = with_withdraw_lock(&env, || {
                assert!(is_withdraw_locked(&env));
                let nested = with_withdraw_lock(&env, || Ok(1u32));
                assert_eq!(nested, Err(ContractError::ReentrantCall));
                Ok(2u32)
            });
            assert_eq!(outer, Ok(2));
            assert!(!is_withdraw_locked(&env));
        });
    }

    #[test]
    fn lock_released_after_failure() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamLedger);

        env.as_contract(&contract_id, || {
            let res: Result<(), ContractError> =
                with_withdraw_lock(&env, || Err(ContractError::TransferFailed));
            assert_eq!(res, Err(ContractError::TransferFailed));
            assert!(!is_withdraw_locked(&env));
            assert_eq!(acquire_withdraw_lock(&env), Ok(()));
        });
    }

    #[test]
    fn pause_toggle_rejects_no_op() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamLedger);

        env.as_contract(&contract_id, || {
            assert!(!is_paused(&env));
            assert_eq!(set_paused(&env, false), Err(ContractError::InvalidState));
            assert_eq!(set_paused(&env, true), Ok(()));
            assert_eq!(require_not_paused(&env), Err(ContractError::ContractPaused));
            assert_eq!(set_paused(&env, true), Err(ContractError::InvalidState));
            assert_eq!(set_paused(&env, false), Ok(()));
            assert_eq!(require_not_paused(&env), Ok(()));
        });
    }
}

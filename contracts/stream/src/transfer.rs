//! Value movement for the two asset kinds.
//!
//! The native asset is moved through its Stellar Asset Contract with the
//! standard token client. Arbitrary tokens are invoked directly so that both
//! void-returning and bool-returning `transfer` implementations are accepted.

use soroban_sdk::{log, token, Address, Env, IntoVal, Symbol, TryFromVal, Val, Vec};

use crate::ContractError;

/// Pull `amount` of the native asset from `from` into the ledger's custody.
pub fn pull_native(
    env: &Env,
    native_token: &Address,
    from: &Address,
    amount: i128,
) -> Result<(), ContractError> {
    native_transfer(env, native_token, from, &env.current_contract_address(), amount)
}

/// Pay `amount` of the native asset out of custody to `to`.
pub fn push_native(
    env: &Env,
    native_token: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), ContractError> {
    native_transfer(env, native_token, &env.current_contract_address(), to, amount)
}

/// Pull `amount` of `token` from `from` into the ledger's custody.
pub fn pull_token(
    env: &Env,
    token: &Address,
    from: &Address,
    amount: i128,
) -> Result<(), ContractError> {
    token_transfer(env, token, from, &env.current_contract_address(), amount)
}

/// Pay `amount` of `token` out of custody to `to`.
pub fn push_token(
    env: &Env,
    token: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), ContractError> {
    token_transfer(env, token, &env.current_contract_address(), to, amount)
}

fn native_transfer(
    env: &Env,
    native_token: &Address,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), ContractError> {
    let client = token::Client::new(env, native_token);
    match client.try_transfer(from, to, &amount) {
        Ok(Ok(())) => Ok(()),
        _ => {
            log!(env, "native transfer failed", to.clone(), amount);
            Err(ContractError::TransferFailed)
        }
    }
}

fn token_transfer(
    env: &Env,
    token: &Address,
    from: &Address,
    to: &Address,
    amount: i128,
) -> Result<(), ContractError> {
    let args: Vec<Val> = (from.clone(), to.clone(), amount).into_val(env);
    let outcome = env.try_invoke_contract::<Val, soroban_sdk::Error>(
        token,
        &Symbol::new(env, "transfer"),
        args,
    );

    match outcome {
        Ok(Ok(returned)) if transfer_succeeded(env, returned) => Ok(()),
        _ => {
            log!(env, "token transfer failed", token.clone(), to.clone(), amount);
            Err(ContractError::TransferFailed)
        }
    }
}

/// A token reports success by returning nothing or `true`.
fn transfer_succeeded(env: &Env, returned: Val) -> bool {
    returned.is_void() || matches!(bool::try_from_val(env, &returned), Ok(true))
}

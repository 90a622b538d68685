use soroban_sdk::Env;

use crate::{AssetKey, Config, ContractError, DataKey, Stream};

/// TTL bump applied whenever an entry is written (~1 day threshold, ~7 days max).
pub const TTL_THRESHOLD: u32 = 17280;
pub const TTL_EXTEND_TO: u32 = 120960;

// ---------------------------------------------------------------------------
// Instance storage: configuration and counters
// ---------------------------------------------------------------------------

pub fn has_config(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Config {
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .expect("contract not initialised: missing config")
}

pub fn set_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

/// Last id handed out; 0 means no stream was ever created.
pub fn get_stream_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::NextStreamId)
        .unwrap_or(0u64)
}

/// Allocate the next id from the counter shared by both registries.
pub fn next_stream_id(env: &Env) -> u64 {
    let stream_id = get_stream_count(env) + 1;
    env.storage()
        .instance()
        .set(&DataKey::NextStreamId, &stream_id);
    stream_id
}

pub fn get_unallocated_balance(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::UnallocatedBalance)
        .unwrap_or(0i128)
}

pub fn add_unallocated_balance(env: &Env, amount: i128) {
    let total = get_unallocated_balance(env).saturating_add(amount);
    env.storage()
        .instance()
        .set(&DataKey::UnallocatedBalance, &total);
}

// ---------------------------------------------------------------------------
// Stream registries
// ---------------------------------------------------------------------------

fn stream_key(asset: &AssetKey, stream_id: u64) -> DataKey {
    match asset {
        AssetKey::Native => DataKey::NativeStream(stream_id),
        AssetKey::Token(token) => DataKey::TokenStream(token.clone(), stream_id),
    }
}

pub fn insert_stream(env: &Env, asset: &AssetKey, stream_id: u64, stream: &Stream) {
    let key = stream_key(asset, stream_id);
    env.storage().persistent().set(&key, stream);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub fn get_stream(env: &Env, asset: &AssetKey, stream_id: u64) -> Option<Stream> {
    env.storage().persistent().get(&stream_key(asset, stream_id))
}

pub fn has_stream(env: &Env, asset: &AssetKey, stream_id: u64) -> bool {
    env.storage().persistent().has(&stream_key(asset, stream_id))
}

pub fn load_stream(env: &Env, asset: &AssetKey, stream_id: u64) -> Result<Stream, ContractError> {
    get_stream(env, asset, stream_id).ok_or(ContractError::StreamNotFound)
}

/// Apply `mutate` to a stored stream and write it back.
pub fn update_stream<F>(
    env: &Env,
    asset: &AssetKey,
    stream_id: u64,
    mutate: F,
) -> Result<Stream, ContractError>
where
    F: FnOnce(&mut Stream) -> Result<(), ContractError>,
{
    let mut stream = load_stream(env, asset, stream_id)?;
    mutate(&mut stream)?;
    insert_stream(env, asset, stream_id, &stream);
    Ok(stream)
}

pub fn remove_stream(env: &Env, asset: &AssetKey, stream_id: u64) {
    env.storage().persistent().remove(&stream_key(asset, stream_id));
}

#[cfg(test)]
mod tests {
    use soroban_sdk::{testutils::Address as _, Address, Env, String};

    use super::*;
    use crate::StreamLedger;

    fn sample_stream(env: &Env) -> Stream {
        Stream {
            name: String::from_str(env, "payroll"),
            description: String::from_str(env, "monthly salary"),
            image_url: String::from_str(env, "https://example.org/p.png"),
            deposit: 1000,
            rate_per_second: 10,
            remaining_balance: 1000,
            start_time: 100,
            stop_time: 200,
            recipient: Address::generate(env),
            is_recurring: false,
            recurring_period: 0,
        }
    }

    #[test]
    fn registries_are_partitioned_by_asset() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamLedger);
        let token_a = Address::generate(&env);
        let token_b = Address::generate(&env);

        env.as_contract(&contract_id, || {
            let stream = sample_stream(&env);
            insert_stream(&env, &AssetKey::Token(token_a.clone()), 1, &stream);

            assert!(has_stream(&env, &AssetKey::Token(token_a.clone()), 1));
            assert!(!has_stream(&env, &AssetKey::Token(token_b.clone()), 1));
            assert!(!has_stream(&env, &AssetKey::Native, 1));
        });
    }

    #[test]
    fn update_and_remove() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamLedger);

        env.as_contract(&contract_id, || {
            insert_stream(&env, &AssetKey::Native, 7, &sample_stream(&env));

            let updated = update_stream(&env, &AssetKey::Native, 7, |s| {
                s.remaining_balance -= 400;
                Ok(())
            })
            .unwrap();
            assert_eq!(updated.remaining_balance, 600);
            assert_eq!(
                get_stream(&env, &AssetKey::Native, 7)
                    .unwrap()
                    .remaining_balance,
                600
            );

            remove_stream(&env, &AssetKey::Native, 7);
            assert!(get_stream(&env, &AssetKey::Native, 7).is_none());
            assert_eq!(
                update_stream(&env, &AssetKey::Native, 7, |_| Ok(())),
                Err(ContractError::StreamNotFound)
            );
        });
    }

    #[test]
    fn failed_mutation_leaves_record_untouched() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamLedger);

        env.as_contract(&contract_id, || {
            insert_stream(&env, &AssetKey::Native, 3, &sample_stream(&env));
            let res = update_stream(&env, &AssetKey::Native, 3, |s| {
                s.remaining_balance = 0;
                Err(ContractError::NothingToWithdraw)
            });
            assert_eq!(res, Err(ContractError::NothingToWithdraw));
            assert_eq!(
                get_stream(&env, &AssetKey::Native, 3)
                    .unwrap()
                    .remaining_balance,
                1000
            );
        });
    }

    #[test]
    fn counter_starts_at_one_and_is_shared() {
        let env = Env::default();
        let contract_id = env.register_contract(None, StreamLedger);

        env.as_contract(&contract_id, || {
            assert_eq!(get_stream_count(&env), 0);
            assert_eq!(next_stream_id(&env), 1);
            assert_eq!(next_stream_id(&env), 2);
            assert_eq!(get_stream_count(&env), 2);
        });
    }
}

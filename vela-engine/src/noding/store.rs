use super::types::*;
use crate::errors::*;
use crate::system::system_api::*;
use crate::types::*;

pub const NODING_NODE: &[u8] = b"noding";
pub const VALIDATORS_PARTITION: DbPartitionNum = 0;
pub const INDEX_PARTITION: DbPartitionNum = 1;

pub const CONSENSUS_ADDRESS_PREFIX: u8 = 0x01;
pub const PROPOSER_PREFIX: u8 = 0x02;
pub const LOTTERY_PREFIX: u8 = 0x03;
pub const LOTTERY_COUNTER_KEY: u8 = 0x04;

pub fn validators_partition() -> DbPartitionKey {
    DbPartitionKey::new(NODING_NODE, VALIDATORS_PARTITION)
}

pub fn index_partition() -> DbPartitionKey {
    DbPartitionKey::new(NODING_NODE, INDEX_PARTITION)
}

pub fn prefixed_key(prefix: u8, bytes: &[u8]) -> DbSortKey {
    let mut key = Vec::with_capacity(1 + bytes.len());
    key.push(prefix);
    key.extend_from_slice(bytes);
    DbSortKey(key)
}

fn decode_account(bytes: &[u8]) -> Result<AccountAddress, RuntimeError> {
    AccountAddress::try_from_slice(bytes)
        .ok_or_else(|| invariant_violation(format!("malformed account in noding index: {:?}", bytes)))
}

pub fn get_validator<Y: SystemApi>(
    api: &Y,
    account: &AccountAddress,
) -> Result<Option<ValidatorInfo>, RuntimeError> {
    api.get_typed(&validators_partition(), &DbSortKey(account.as_bytes().to_vec()))
}

pub fn must_get_validator<Y: SystemApi>(
    api: &Y,
    account: &AccountAddress,
) -> Result<ValidatorInfo, RuntimeError> {
    get_validator(api, account)?.ok_or_else(|| NodingError::NotFound(*account).into())
}

pub fn set_validator<Y: SystemApi>(
    api: &mut Y,
    account: &AccountAddress,
    info: &ValidatorInfo,
) -> Result<(), RuntimeError> {
    api.set_typed(
        &validators_partition(),
        DbSortKey(account.as_bytes().to_vec()),
        info,
    )
}

/// Every validator record, in ascending account order.
pub fn list_validators<Y: SystemApi>(
    api: &Y,
) -> Result<Vec<(AccountAddress, ValidatorInfo)>, RuntimeError> {
    let mut validators = Vec::new();
    for (key, value) in api.list_all(&validators_partition()) {
        validators.push((decode_account(&key.0)?, vela_decode(&value)?));
    }
    Ok(validators)
}

pub fn get_account_by_consensus_address<Y: SystemApi>(
    api: &Y,
    cons_address: &ConsensusAddress,
) -> Result<Option<AccountAddress>, RuntimeError> {
    api.get_substate(
        &index_partition(),
        &prefixed_key(CONSENSUS_ADDRESS_PREFIX, cons_address.as_bytes()),
    )
    .map(|bytes| decode_account(&bytes))
    .transpose()
}

/// Every consensus-address index entry, in ascending address order.
pub fn list_consensus_addresses<Y: SystemApi>(
    api: &Y,
) -> Result<Vec<(ConsensusAddress, AccountAddress)>, RuntimeError> {
    let entries = api.scan_range(
        &index_partition(),
        Some(&DbSortKey(vec![CONSENSUS_ADDRESS_PREFIX])),
        &DbSortKey(vec![CONSENSUS_ADDRESS_PREFIX + 1]),
    );
    let mut index = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let cons_address = ConsensusAddress::try_from_slice(&key.0[1..])
            .ok_or_else(|| invariant_violation(format!("malformed index key {:?}", key)))?;
        index.push((cons_address, decode_account(&value)?));
    }
    Ok(index)
}

pub fn set_consensus_address<Y: SystemApi>(
    api: &mut Y,
    cons_address: &ConsensusAddress,
    account: &AccountAddress,
) {
    api.set_substate(
        &index_partition(),
        prefixed_key(CONSENSUS_ADDRESS_PREFIX, cons_address.as_bytes()),
        account.as_bytes().to_vec(),
    );
}

pub fn remove_consensus_address<Y: SystemApi>(api: &mut Y, cons_address: &ConsensusAddress) {
    api.remove_substate(
        &index_partition(),
        &prefixed_key(CONSENSUS_ADDRESS_PREFIX, cons_address.as_bytes()),
    );
}

pub fn set_block_proposer<Y: SystemApi>(api: &mut Y, height: i64, account: &AccountAddress) {
    api.set_substate(
        &index_partition(),
        prefixed_key(PROPOSER_PREFIX, &height.to_be_bytes()),
        account.as_bytes().to_vec(),
    );
}

pub fn get_block_proposer<Y: SystemApi>(
    api: &Y,
    height: i64,
) -> Result<Option<AccountAddress>, RuntimeError> {
    api.get_substate(
        &index_partition(),
        &prefixed_key(PROPOSER_PREFIX, &height.to_be_bytes()),
    )
    .map(|bytes| decode_account(&bytes))
    .transpose()
}

/// Heights of the blocks proposed by `account`, ascending.
pub fn blocks_proposed_by<Y: SystemApi>(
    api: &Y,
    account: &AccountAddress,
) -> Result<Vec<i64>, RuntimeError> {
    let entries = api.scan_range(
        &index_partition(),
        Some(&DbSortKey(vec![PROPOSER_PREFIX])),
        &DbSortKey(vec![PROPOSER_PREFIX + 1]),
    );
    let mut heights = Vec::new();
    for (key, value) in entries {
        if decode_account(&value)? != *account {
            continue;
        }
        let bytes: [u8; 8] = key.0[1..]
            .try_into()
            .map_err(|_| invariant_violation(format!("malformed proposer key {:?}", key)))?;
        heights.push(i64::from_be_bytes(bytes));
    }
    Ok(heights)
}

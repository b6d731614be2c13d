use super::lottery::LotteryQueue;
use super::noding::NodingBlueprint;
use super::store;
use super::types::*;
use crate::errors::*;
use crate::system::system_api::*;
use crate::types::*;

impl NodingBlueprint {
    pub fn get_validator<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
    ) -> Result<Option<ValidatorInfo>, RuntimeError> {
        store::get_validator(api, account)
    }

    pub fn get_validator_by_consensus_address<Y: SystemApi>(
        api: &Y,
        cons_address: &ConsensusAddress,
    ) -> Result<Option<(AccountAddress, ValidatorInfo)>, RuntimeError> {
        let Some(account) = store::get_account_by_consensus_address(api, cons_address)? else {
            return Ok(None);
        };
        Ok(store::get_validator(api, &account)?.map(|info| (account, info)))
    }

    pub fn get_validator_state<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
    ) -> Result<ValidatorState, RuntimeError> {
        let Some(info) = store::get_validator(api, account)? else {
            return Ok(ValidatorState::Off);
        };
        let state = if info.banned_for_life {
            ValidatorState::Ban
        } else if info.jailed {
            ValidatorState::Jail
        } else if !info.is_active() {
            ValidatorState::Off
        } else if LotteryQueue::is_lucky(api, &info)? {
            ValidatorState::Lucky
        } else if info.lottery_no != 0 {
            ValidatorState::Spare
        } else {
            ValidatorState::Top
        };
        Ok(state)
    }

    pub fn get_active_validators<Y: SystemApi>(
        api: &Y,
    ) -> Result<Vec<(AccountAddress, ValidatorInfo)>, RuntimeError> {
        Ok(store::list_validators(api)?
            .into_iter()
            .filter(|(_, info)| info.is_active())
            .collect())
    }

    pub fn get_non_active_validators<Y: SystemApi>(
        api: &Y,
    ) -> Result<Vec<(AccountAddress, ValidatorInfo)>, RuntimeError> {
        Ok(store::list_validators(api)?
            .into_iter()
            .filter(|(_, info)| !info.is_active())
            .collect())
    }

    pub fn get_consensus_index<Y: SystemApi>(
        api: &Y,
    ) -> Result<Vec<(ConsensusAddress, AccountAddress)>, RuntimeError> {
        store::list_consensus_addresses(api)
    }

    pub fn get_block_proposer<Y: SystemApi>(
        api: &Y,
        height: i64,
    ) -> Result<Option<AccountAddress>, RuntimeError> {
        store::get_block_proposer(api, height)
    }

    pub fn get_blocks_proposed_by<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
    ) -> Result<Vec<i64>, RuntimeError> {
        store::blocks_proposed_by(api, account)
    }

    pub fn lottery_queue<Y: SystemApi>(api: &Y) -> Result<Vec<(u64, AccountAddress)>, RuntimeError> {
        LotteryQueue::queue(api)
    }

    pub fn is_validator<Y: SystemApi>(api: &Y, account: &AccountAddress) -> Result<bool, RuntimeError> {
        Ok(store::get_validator(api, account)?
            .map(|info| info.switched_on)
            .unwrap_or(false))
    }

    pub fn is_banned<Y: SystemApi>(api: &Y, account: &AccountAddress) -> Result<bool, RuntimeError> {
        Ok(store::get_validator(api, account)?
            .map(|info| info.banned_for_life)
            .unwrap_or(false))
    }
}

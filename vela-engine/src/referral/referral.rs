use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::system::system_api::*;
use crate::types::*;

pub const REFERRAL_NODE: &[u8] = b"referral";
pub const INFOS_PARTITION: DbPartitionNum = 0;

fn infos_partition() -> DbPartitionKey {
    DbPartitionKey::new(REFERRAL_NODE, INFOS_PARTITION)
}

fn account_key(account: &AccountAddress) -> DbSortKey {
    DbSortKey(account.as_bytes().to_vec())
}

/// Membership status of an account in the referral network, in ascending rank.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Encode, Decode, Serialize, Deserialize,
)]
pub enum Status {
    #[default]
    Lucky = 1,
    Leader = 2,
    Master = 3,
    Champion = 4,
    Businessman = 5,
    Professional = 6,
    TopLeader = 7,
    Hero = 8,
    AbsoluteChampion = 9,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ReferralInfo {
    pub status: Status,
    /// Coins delegated by the account and its whole referral subtree.
    pub delegated: Amount,
    pub active: bool,
    pub banished: bool,
}

impl Default for ReferralInfo {
    fn default() -> Self {
        Self {
            status: Status::Lucky,
            delegated: 0,
            active: true,
            banished: false,
        }
    }
}

/// Receives notifications about referral changes that may affect other modules.
pub trait ReferralObserver {
    fn on_status_update<Y: SystemApi>(
        &self,
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError>;

    fn on_stake_changed<Y: SystemApi>(
        &self,
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError>;
}

/// Ignores every notification.
impl ReferralObserver for () {
    fn on_status_update<Y: SystemApi>(&self, _: &mut Y, _: &AccountAddress) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn on_stake_changed<Y: SystemApi>(&self, _: &mut Y, _: &AccountAddress) -> Result<(), RuntimeError> {
        Ok(())
    }
}

pub struct ReferralBlueprint;

impl ReferralBlueprint {
    pub fn get_info<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
    ) -> Result<ReferralInfo, RuntimeError> {
        Ok(api
            .get_typed(&infos_partition(), &account_key(account))?
            .unwrap_or_default())
    }

    fn set_info<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        info: &ReferralInfo,
    ) -> Result<(), RuntimeError> {
        api.set_typed(&infos_partition(), account_key(account), info)
    }

    pub fn get_status<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
    ) -> Result<Status, RuntimeError> {
        Ok(Self::get_info(api, account)?.status)
    }

    pub fn get_delegated_in_network<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
    ) -> Result<Amount, RuntimeError> {
        Ok(Self::get_info(api, account)?.delegated)
    }

    pub fn must_set_active<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        active: bool,
    ) -> Result<(), RuntimeError> {
        let mut info = Self::get_info(api, account)?;
        if info.active != active {
            info.active = active;
            Self::set_info(api, account, &info)?;
        }
        Ok(())
    }

    pub fn banish<Y: SystemApi>(api: &mut Y, account: &AccountAddress) -> Result<(), RuntimeError> {
        let mut info = Self::get_info(api, account)?;
        info.banished = true;
        info.active = false;
        Self::set_info(api, account, &info)
    }

    /// Returns a banished account to the network.
    pub fn come_back<Y: SystemApi>(api: &mut Y, account: &AccountAddress) -> Result<(), RuntimeError> {
        let mut info = Self::get_info(api, account)?;
        if info.banished {
            info.banished = false;
            info.active = true;
            Self::set_info(api, account, &info)?;
        }
        Ok(())
    }

    pub fn set_status<Y: SystemApi, O: ReferralObserver>(
        api: &mut Y,
        account: &AccountAddress,
        status: Status,
        observer: &O,
    ) -> Result<(), RuntimeError> {
        let mut info = Self::get_info(api, account)?;
        if info.status == status {
            return Ok(());
        }
        info.status = status;
        Self::set_info(api, account, &info)?;
        observer.on_status_update(api, account)
    }

    pub fn set_delegated<Y: SystemApi, O: ReferralObserver>(
        api: &mut Y,
        account: &AccountAddress,
        delegated: Amount,
        observer: &O,
    ) -> Result<(), RuntimeError> {
        let mut info = Self::get_info(api, account)?;
        if info.delegated == delegated {
            return Ok(());
        }
        info.delegated = delegated;
        Self::set_info(api, account, &info)?;
        observer.on_stake_changed(api, account)
    }

    pub fn init_genesis<Y: SystemApi>(
        api: &mut Y,
        accounts: &[(AccountAddress, Status, Amount)],
    ) -> Result<(), RuntimeError> {
        for (account, status, delegated) in accounts {
            let info = ReferralInfo {
                status: *status,
                delegated: *delegated,
                ..Default::default()
            };
            Self::set_info(api, account, &info)?;
        }
        Ok(())
    }
}

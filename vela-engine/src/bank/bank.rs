use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::system::events::ApplicationEvent;
use crate::system::system_api::*;
use crate::types::*;

pub const BANK_NODE: &[u8] = b"bank";
pub const BALANCES_PARTITION: DbPartitionNum = 0;
pub const BLOCKED_SENDERS_PARTITION: DbPartitionNum = 1;

/// Module receiving transaction fees. Its whole balance goes to the proposer of the next block.
pub const FEE_COLLECTOR: &str = "fee_collector";
pub const VPN_COLLECTOR: &str = "vpn";
pub const STORAGE_COLLECTOR: &str = "storage";
pub const EARNING_POOL: &str = "earning";

pub fn module_account_address(name: &str) -> AccountAddress {
    AccountAddress::module(name)
}

fn balances_partition() -> DbPartitionKey {
    DbPartitionKey::new(BANK_NODE, BALANCES_PARTITION)
}

fn blocked_senders_partition() -> DbPartitionKey {
    DbPartitionKey::new(BANK_NODE, BLOCKED_SENDERS_PARTITION)
}

fn account_key(account: &AccountAddress) -> DbSortKey {
    DbSortKey(account.as_bytes().to_vec())
}

#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
pub enum BankError {
    InsufficientFunds {
        account: AccountAddress,
        balance: Amount,
        required: Amount,
    },
    BlockedSender(AccountAddress),
    Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankParams {
    /// Accounts that may not send coins with [`BankBlueprint::send_coins`].
    pub blocked_senders: Vec<AccountAddress>,
}

pub struct BankBlueprint;

impl BankBlueprint {
    pub fn get_balance<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
    ) -> Result<Amount, RuntimeError> {
        Ok(api
            .get_typed::<Amount>(&balances_partition(), &account_key(account))?
            .unwrap_or_default())
    }

    pub fn get_module_balance<Y: SystemApi>(api: &Y, module: &str) -> Result<Amount, RuntimeError> {
        Self::get_balance(api, &module_account_address(module))
    }

    fn set_balance<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        balance: Amount,
    ) -> Result<(), RuntimeError> {
        if balance == 0 {
            api.remove_substate(&balances_partition(), &account_key(account));
            Ok(())
        } else {
            api.set_typed(&balances_partition(), account_key(account), &balance)
        }
    }

    fn debit<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        amount: Amount,
    ) -> Result<(), RuntimeError> {
        let balance = Self::get_balance(api, account)?;
        let Some(remaining) = balance.checked_sub(amount) else {
            return Err(BankError::InsufficientFunds {
                account: *account,
                balance,
                required: amount,
            }
            .into());
        };
        Self::set_balance(api, account, remaining)
    }

    fn credit<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        amount: Amount,
    ) -> Result<(), RuntimeError> {
        let balance = Self::get_balance(api, account)?;
        let updated = balance.checked_add(amount).ok_or(BankError::Overflow)?;
        Self::set_balance(api, account, updated)
    }

    fn transfer<Y: SystemApi>(
        api: &mut Y,
        from: &AccountAddress,
        to: &AccountAddress,
        amount: Amount,
    ) -> Result<(), RuntimeError> {
        if amount == 0 {
            return Ok(());
        }
        Self::debit(api, from, amount)?;
        Self::credit(api, to, amount)?;
        api.emit_event(ApplicationEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }

    /// Moves coins between two accounts. Fails for blocked senders.
    pub fn send_coins<Y: SystemApi>(
        api: &mut Y,
        from: &AccountAddress,
        to: &AccountAddress,
        amount: Amount,
    ) -> Result<(), RuntimeError> {
        if Self::is_blocked_sender(api, from) {
            return Err(BankError::BlockedSender(*from).into());
        }
        Self::transfer(api, from, to, amount)
    }

    pub fn send_coins_from_module_to_module<Y: SystemApi>(
        api: &mut Y,
        from_module: &str,
        to_module: &str,
        amount: Amount,
    ) -> Result<(), RuntimeError> {
        Self::transfer(
            api,
            &module_account_address(from_module),
            &module_account_address(to_module),
            amount,
        )
    }

    pub fn send_coins_from_module_to_account<Y: SystemApi>(
        api: &mut Y,
        from_module: &str,
        to: &AccountAddress,
        amount: Amount,
    ) -> Result<(), RuntimeError> {
        Self::transfer(api, &module_account_address(from_module), to, amount)
    }

    pub fn send_coins_from_account_to_module<Y: SystemApi>(
        api: &mut Y,
        from: &AccountAddress,
        to_module: &str,
        amount: Amount,
    ) -> Result<(), RuntimeError> {
        Self::transfer(api, from, &module_account_address(to_module), amount)
    }

    pub fn mint_coins<Y: SystemApi>(
        api: &mut Y,
        module: &str,
        amount: Amount,
    ) -> Result<(), RuntimeError> {
        Self::credit(api, &module_account_address(module), amount)
    }

    pub fn add_blocked_sender<Y: SystemApi>(api: &mut Y, account: &AccountAddress) {
        api.set_substate(&blocked_senders_partition(), account_key(account), Vec::new());
    }

    pub fn remove_blocked_sender<Y: SystemApi>(api: &mut Y, account: &AccountAddress) {
        api.remove_substate(&blocked_senders_partition(), &account_key(account));
    }

    pub fn is_blocked_sender<Y: SystemApi>(api: &Y, account: &AccountAddress) -> bool {
        api.get_substate(&blocked_senders_partition(), &account_key(account))
            .is_some()
    }

    /// Seeds balances and the blocked-sender set.
    pub fn init_genesis<Y: SystemApi>(
        api: &mut Y,
        params: &BankParams,
        balances: &[(AccountAddress, Amount)],
    ) -> Result<(), RuntimeError> {
        for (account, amount) in balances {
            Self::credit(api, account, *amount)?;
        }
        for account in &params.blocked_senders {
            Self::add_blocked_sender(api, account);
        }
        Ok(())
    }
}

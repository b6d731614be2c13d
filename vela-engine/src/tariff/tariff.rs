use serde::{Deserialize, Serialize};

use crate::bank::*;
use crate::errors::*;
use crate::referral::ReferralBlueprint;
use crate::scheduler::{HandlerRegistry, SchedulerBlueprint};
use crate::system::events::ApplicationEvent;
use crate::system::system_api::*;
use crate::types::*;

pub const TARIFF_NODE: &[u8] = b"tariff";
pub const PROFILES_PARTITION: DbPartitionNum = 0;

pub const TARIFF_RENEW_HANDLER: &str = "tariff/renew";

pub const GB: u64 = 1 << 30;

/// Share of a subscription payment taken as transaction fee, in permille.
const FEE_PERMILLE: u64 = 3;
const MAX_FEE: Amount = 10 * MINOR_UNITS_PER_COIN;

fn profiles_partition() -> DbPartitionKey {
    DbPartitionKey::new(TARIFF_NODE, PROFILES_PARTITION)
}

fn account_key(account: &AccountAddress) -> DbSortKey {
    DbSortKey(account.as_bytes().to_vec())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffParams {
    pub subscription_price: Amount,
    pub vpn_gb_price: Amount,
    pub storage_gb_price: Amount,
    pub base_storage_gb: u64,
    pub base_vpn_gb: u64,
}

impl Default for TariffParams {
    fn default() -> Self {
        Self {
            subscription_price: 5 * MINOR_UNITS_PER_COIN,
            vpn_gb_price: MINOR_UNITS_PER_COIN / 10,
            storage_gb_price: MINOR_UNITS_PER_COIN / 10,
            base_storage_gb: 5,
            base_vpn_gb: 21,
        }
    }
}

/// A subscription. Limits are in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Profile {
    pub active_until: Option<Instant>,
    pub vpn_limit: u64,
    pub storage_limit: u64,
}

impl Profile {
    pub fn is_active(&self, now: Instant) -> bool {
        self.active_until.map_or(false, |until| until > now)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
pub enum TariffError {
    NotActive(AccountAddress),
    ZeroAmount,
}

/// How a subscription payment is split between the collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSplit {
    pub fee: Amount,
    pub vpn: Amount,
    pub storage: Amount,
}

impl PaymentSplit {
    pub fn of(price: Amount) -> Self {
        let fee = (price / 1000 * FEE_PERMILLE + price % 1000 * FEE_PERMILLE / 1000).min(MAX_FEE);
        let rest = price - fee;
        let vpn = rest / 3;
        Self {
            fee,
            vpn,
            storage: rest - vpn,
        }
    }
}

pub struct TariffBlueprint;

impl TariffBlueprint {
    pub fn get_profile<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
    ) -> Result<Option<Profile>, RuntimeError> {
        api.get_typed(&profiles_partition(), &account_key(account))
    }

    fn set_profile<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        profile: &Profile,
    ) -> Result<(), RuntimeError> {
        api.set_typed(&profiles_partition(), account_key(account), profile)
    }

    fn after_month<Y: SystemApi>(api: &Y, since: Instant) -> Result<Instant, RuntimeError> {
        since
            .add_nanos(api.params().scheduler.one_month())
            .ok_or(RuntimeError::SystemError(SystemError::TimeOutOfRange(since)))
    }

    /// Pays one month of subscription. An inactive subscription starts now with the base
    /// limits, an active one is extended.
    pub fn pay_tariff<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError> {
        let price = api.params().tariff.subscription_price;
        let split = PaymentSplit::of(price);
        BankBlueprint::send_coins_from_account_to_module(api, account, FEE_COLLECTOR, split.fee)?;
        BankBlueprint::send_coins_from_account_to_module(api, account, VPN_COLLECTOR, split.vpn)?;
        BankBlueprint::send_coins_from_account_to_module(
            api,
            account,
            STORAGE_COLLECTOR,
            split.storage,
        )?;

        if ReferralBlueprint::get_info(api, account)?.banished {
            ReferralBlueprint::come_back(api, account)?;
        }

        let now = api.block_time();
        let mut profile = Self::get_profile(api, account)?.unwrap_or_default();
        let expire_at = match profile.active_until {
            Some(until) if until > now => Self::after_month(api, until)?,
            _ => {
                let expire_at = Self::after_month(api, now)?;
                let tariff = &api.params().tariff;
                profile.vpn_limit = tariff.base_vpn_gb.saturating_mul(GB);
                profile.storage_limit = tariff.base_storage_gb.saturating_mul(GB);
                SchedulerBlueprint::schedule_task(
                    api,
                    expire_at,
                    TARIFF_RENEW_HANDLER,
                    account.as_bytes(),
                )?;
                ReferralBlueprint::must_set_active(api, account, true)?;
                api.emit_event(ApplicationEvent::ActivityChanged {
                    account: *account,
                    active_now: true,
                });
                expire_at
            }
        };
        profile.active_until = Some(expire_at);
        Self::set_profile(api, account, &profile)?;
        api.emit_event(ApplicationEvent::PayTariff {
            account: *account,
            expire_at,
            total: price,
        });
        Ok(())
    }

    fn buy<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        gb: u64,
        gb_price: Amount,
        collector: &str,
    ) -> Result<(Profile, Amount), RuntimeError> {
        if gb == 0 {
            return Err(TariffError::ZeroAmount.into());
        }
        let profile = Self::get_profile(api, account)?.unwrap_or_default();
        if !profile.is_active(api.block_time()) {
            return Err(TariffError::NotActive(*account).into());
        }
        let total = gb.checked_mul(gb_price).ok_or(BankError::Overflow)?;
        BankBlueprint::send_coins_from_account_to_module(api, account, collector, total)?;
        Ok((profile, total))
    }

    pub fn buy_vpn<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        gb: u64,
    ) -> Result<(), RuntimeError> {
        let price = api.params().tariff.vpn_gb_price;
        let (mut profile, total) = Self::buy(api, account, gb, price, VPN_COLLECTOR)?;
        profile.vpn_limit = profile
            .vpn_limit
            .saturating_add(gb.saturating_mul(GB));
        Self::set_profile(api, account, &profile)?;
        api.emit_event(ApplicationEvent::BuyVpn {
            account: *account,
            new_limit: profile.vpn_limit,
            total,
        });
        Ok(())
    }

    pub fn buy_storage<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        gb: u64,
    ) -> Result<(), RuntimeError> {
        let price = api.params().tariff.storage_gb_price;
        let (mut profile, total) = Self::buy(api, account, gb, price, STORAGE_COLLECTOR)?;
        profile.storage_limit = profile
            .storage_limit
            .saturating_add(gb.saturating_mul(GB));
        Self::set_profile(api, account, &profile)?;
        api.emit_event(ApplicationEvent::BuyStorage {
            account: *account,
            new_limit: profile.storage_limit,
            total,
        });
        Ok(())
    }

    /// Fires when a paid month ends: follows a prepaid extension, or deactivates the account.
    pub fn on_renew<Y: SystemApi>(
        api: &mut Y,
        payload: &[u8],
        fire_time: Instant,
    ) -> Result<(), RuntimeError> {
        let account = AccountAddress::try_from_slice(payload)
            .ok_or_else(|| invariant_violation("renew task without account"))?;
        let Some(profile) = Self::get_profile(api, &account)? else {
            return Err(invariant_violation(format!("renew task for {} without profile", account)));
        };
        match profile.active_until {
            Some(until) if until > fire_time => {
                SchedulerBlueprint::schedule_task(api, until, TARIFF_RENEW_HANDLER, payload)
            }
            _ => {
                ReferralBlueprint::must_set_active(api, &account, false)?;
                api.emit_event(ApplicationEvent::ActivityChanged {
                    account,
                    active_now: false,
                });
                Ok(())
            }
        }
    }

    pub fn register_handlers<Y: SystemApi>(registry: &mut HandlerRegistry<Y>) {
        registry.register_handler(TARIFF_RENEW_HANDLER, Self::on_renew::<Y>);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainParams;
    use crate::system::kernel::{BlockHeader, Kernel};
    use vela_store_impls::memory_db::InMemorySubstateDatabase;

    const ALICE: AccountAddress = AccountAddress([1; 20]);
    const COIN: Amount = MINOR_UNITS_PER_COIN;

    fn header(nanos: i64) -> BlockHeader {
        BlockHeader {
            height: 1,
            time: Instant::new(nanos),
        }
    }

    fn params() -> ChainParams {
        let mut params = ChainParams::default();
        params.scheduler.day_nanos = NANOS_IN_A_MINUTE;
        params
    }

    #[test]
    fn fee_is_capped() {
        assert_eq!(
            PaymentSplit::of(1_000),
            PaymentSplit {
                fee: 3,
                vpn: 332,
                storage: 665
            }
        );
        assert_eq!(PaymentSplit::of(10_000 * COIN).fee, 10 * COIN);
    }

    #[test]
    fn first_payment_activates_for_a_month() {
        let db = InMemorySubstateDatabase::standard();
        let params = params();
        let mut kernel = Kernel::new(&db, header(1_000), &params);
        BankBlueprint::init_genesis(&mut kernel, &BankParams::default(), &[(ALICE, 100 * COIN)])
            .unwrap();

        TariffBlueprint::pay_tariff(&mut kernel, &ALICE).unwrap();

        let month = 30 * NANOS_IN_A_MINUTE;
        let profile = TariffBlueprint::get_profile(&kernel, &ALICE).unwrap().unwrap();
        assert_eq!(profile.active_until, Some(Instant::new(1_000 + month)));
        assert_eq!(profile.vpn_limit, 21 * GB);
        assert_eq!(BankBlueprint::get_balance(&kernel, &ALICE).unwrap(), 95 * COIN);
        let split = PaymentSplit::of(5 * COIN);
        assert_eq!(
            BankBlueprint::get_module_balance(&kernel, STORAGE_COLLECTOR).unwrap(),
            split.storage
        );
        let tasks = SchedulerBlueprint::get_tasks(&kernel, Instant::new(0), Instant::new(i64::MAX))
            .unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].handler, TARIFF_RENEW_HANDLER);
        assert_eq!(tasks[0].fire_time, Instant::new(1_000 + month));
    }

    #[test]
    fn prepaid_month_is_followed_then_expires() {
        let db = InMemorySubstateDatabase::standard();
        let params = params();
        let month = 30 * NANOS_IN_A_MINUTE;
        let mut kernel = Kernel::new(&db, header(0), &params);
        BankBlueprint::init_genesis(&mut kernel, &BankParams::default(), &[(ALICE, 100 * COIN)])
            .unwrap();
        TariffBlueprint::pay_tariff(&mut kernel, &ALICE).unwrap();
        TariffBlueprint::pay_tariff(&mut kernel, &ALICE).unwrap();

        TariffBlueprint::on_renew(&mut kernel, ALICE.as_bytes(), Instant::new(month)).unwrap();
        assert_eq!(
            SchedulerBlueprint::get_tasks(&kernel, Instant::new(2 * month), Instant::new(2 * month + 1))
                .unwrap()
                .len(),
            1
        );

        TariffBlueprint::on_renew(&mut kernel, ALICE.as_bytes(), Instant::new(2 * month)).unwrap();
        assert!(!ReferralBlueprint::get_info(&kernel, &ALICE).unwrap().active);
        assert_eq!(
            kernel.events().last(),
            Some(&ApplicationEvent::ActivityChanged {
                account: ALICE,
                active_now: false
            })
        );
    }

    #[test]
    fn purchases_need_an_active_subscription() {
        let db = InMemorySubstateDatabase::standard();
        let params = params();
        let mut kernel = Kernel::new(&db, header(0), &params);
        BankBlueprint::init_genesis(&mut kernel, &BankParams::default(), &[(ALICE, 100 * COIN)])
            .unwrap();

        assert_eq!(
            TariffBlueprint::buy_vpn(&mut kernel, &ALICE, 1).unwrap_err(),
            RuntimeError::from(TariffError::NotActive(ALICE))
        );
        TariffBlueprint::pay_tariff(&mut kernel, &ALICE).unwrap();
        assert_eq!(
            TariffBlueprint::buy_storage(&mut kernel, &ALICE, 0).unwrap_err(),
            RuntimeError::from(TariffError::ZeroAmount)
        );

        TariffBlueprint::buy_storage(&mut kernel, &ALICE, 2).unwrap();

        let profile = TariffBlueprint::get_profile(&kernel, &ALICE).unwrap().unwrap();
        assert_eq!(profile.storage_limit, 7 * GB);
        assert_eq!(
            kernel.events().last(),
            Some(&ApplicationEvent::BuyStorage {
                account: ALICE,
                new_limit: 7 * GB,
                total: 2 * COIN / 10
            })
        );
    }

    #[test]
    fn payment_brings_back_banished_account() {
        let db = InMemorySubstateDatabase::standard();
        let params = params();
        let mut kernel = Kernel::new(&db, header(0), &params);
        BankBlueprint::init_genesis(&mut kernel, &BankParams::default(), &[(ALICE, 100 * COIN)])
            .unwrap();
        ReferralBlueprint::banish(&mut kernel, &ALICE).unwrap();

        TariffBlueprint::pay_tariff(&mut kernel, &ALICE).unwrap();

        let info = ReferralBlueprint::get_info(&kernel, &ALICE).unwrap();
        assert!(!info.banished);
        assert!(info.active);
    }
}

use tracing::info;

use super::types::*;
use crate::bank::*;
use crate::errors::*;
use crate::scheduler::{HandlerRegistry, SchedulerBlueprint};
use crate::system::events::ApplicationEvent;
use crate::system::system_api::*;
use crate::types::*;

pub const EARNING_NODE: &[u8] = b"earning";
pub const EARNERS_PARTITION: DbPartitionNum = 0;
pub const STATE_PARTITION: DbPartitionNum = 1;

pub const EARNING_START_HANDLER: &str = "earning/start";
pub const EARNING_CONTINUE_HANDLER: &str = "earning/continue";

fn earners_partition() -> DbPartitionKey {
    DbPartitionKey::new(EARNING_NODE, EARNERS_PARTITION)
}

fn state_partition() -> DbPartitionKey {
    DbPartitionKey::new(EARNING_NODE, STATE_PARTITION)
}

fn state_key() -> DbSortKey {
    DbSortKey(vec![0x00])
}

fn earner_key(account: &AccountAddress) -> DbSortKey {
    DbSortKey(account.as_bytes().to_vec())
}

/// Exact `fund / total_points * quotient`, or zero when no points were earned.
fn point_cost(fund: Amount, total_points: u64, quotient: Fraction) -> Result<Fraction, RuntimeError> {
    if total_points == 0 {
        return Ok(Fraction::ZERO);
    }
    let fund = i64::try_from(fund).map_err(|_| EarningError::CostOverflow)?;
    let total_points = i64::try_from(total_points).map_err(|_| EarningError::CostOverflow)?;
    Fraction::from_int(fund)
        .checked_div_int(total_points)
        .and_then(|per_point| per_point.checked_mul(quotient))
        .ok_or_else(|| EarningError::CostOverflow.into())
}

/// Paginated payout of the VPN and storage collector funds to listed earners.
pub struct EarningBlueprint;

impl EarningBlueprint {
    pub fn get_state<Y: SystemApi>(api: &Y) -> Result<EarningState, RuntimeError> {
        Ok(api
            .get_typed(&state_partition(), &state_key())?
            .unwrap_or_default())
    }

    fn set_state<Y: SystemApi>(api: &mut Y, state: &EarningState) -> Result<(), RuntimeError> {
        api.set_typed(&state_partition(), state_key(), state)
    }

    /// Pending earners, in payout order.
    pub fn get_earners<Y: SystemApi>(api: &Y) -> Result<Vec<Earner>, RuntimeError> {
        let mut earners = Vec::new();
        for (key, value) in api.list_all(&earners_partition()) {
            earners.push(Self::decode_earner(&key, &value)?);
        }
        Ok(earners)
    }

    fn decode_earner(key: &DbSortKey, value: &[u8]) -> Result<Earner, RuntimeError> {
        let account = AccountAddress::try_from_slice(&key.0)
            .ok_or_else(|| invariant_violation(format!("malformed earner key {:?}", key)))?;
        Ok(Earner {
            account,
            points: vela_decode(value)?,
        })
    }

    fn listed_points<Y: SystemApi>(api: &Y) -> Result<Points, RuntimeError> {
        let mut sum = Points::default();
        for earner in Self::get_earners(api)? {
            sum.vpn = sum.vpn.checked_add(earner.points.vpn).ok_or(EarningError::CostOverflow)?;
            sum.storage = sum
                .storage
                .checked_add(earner.points.storage)
                .ok_or(EarningError::CostOverflow)?;
        }
        Ok(sum)
    }

    pub fn list_earners<Y: SystemApi>(api: &mut Y, earners: &[Earner]) -> Result<(), RuntimeError> {
        if let EarningState::Locked { .. } = Self::get_state(api)? {
            return Err(EarningError::Locked.into());
        }
        for (i, earner) in earners.iter().enumerate() {
            let listed = api
                .get_substate(&earners_partition(), &earner_key(&earner.account))
                .is_some();
            let repeated = earners[..i].iter().any(|e| e.account == earner.account);
            if listed || repeated {
                return Err(EarningError::AlreadyListed(earner.account).into());
            }
        }
        for earner in earners {
            api.set_typed(&earners_partition(), earner_key(&earner.account), &earner.points)?;
        }
        Ok(())
    }

    /// Locks the earner list and moves `fund_part` of both collectors into the earning pool.
    /// Payout starts at `fire_time`, `per_block` earners per block.
    pub fn run<Y: SystemApi>(
        api: &mut Y,
        fund_part: Fraction,
        per_block: u64,
        total: Points,
        fire_time: Instant,
    ) -> Result<(), RuntimeError> {
        if let EarningState::Locked { .. } = Self::get_state(api)? {
            return Err(EarningError::Locked.into());
        }
        if fund_part.is_negative() || fund_part > Fraction::ONE {
            return Err(EarningError::InvalidFundPart(fund_part).into());
        }
        if per_block == 0 {
            return Err(EarningError::InvalidPerBlock.into());
        }
        if fire_time <= api.block_time() {
            return Err(EarningError::TooLate.into());
        }
        let listed = Self::listed_points(api)?;
        if listed.vpn > total.vpn || listed.storage > total.storage {
            return Err(EarningError::TotalBelowListed { listed, total }.into());
        }

        let overflow = || RuntimeError::SystemError(SystemError::ArithmeticOverflow);
        let vpn_fund = fund_part
            .mul_floor(BankBlueprint::get_module_balance(api, VPN_COLLECTOR)?)
            .ok_or_else(overflow)?;
        let storage_fund = fund_part
            .mul_floor(BankBlueprint::get_module_balance(api, STORAGE_COLLECTOR)?)
            .ok_or_else(overflow)?;
        if vpn_fund == 0 && storage_fund == 0 {
            return Err(EarningError::NoMoney.into());
        }

        BankBlueprint::send_coins_from_module_to_module(api, VPN_COLLECTOR, EARNING_POOL, vpn_fund)?;
        BankBlueprint::send_coins_from_module_to_module(
            api,
            STORAGE_COLLECTOR,
            EARNING_POOL,
            storage_fund,
        )?;

        let collected = BankBlueprint::get_module_balance(api, EARNING_POOL)?;
        let moved = vpn_fund.checked_add(storage_fund).ok_or_else(overflow)?;
        let quotient = match (i64::try_from(collected), i64::try_from(moved)) {
            (Ok(collected), Ok(moved)) => Fraction::new(collected, moved),
            _ => return Err(EarningError::CostOverflow.into()),
        };

        let state = EarningState::Locked {
            vpn_point_cost: point_cost(vpn_fund, total.vpn, quotient)?,
            storage_point_cost: point_cost(storage_fund, total.storage, quotient)?,
            per_block,
        };
        Self::set_state(api, &state)?;
        SchedulerBlueprint::schedule_task(api, fire_time, EARNING_START_HANDLER, &[])?;
        info!(
            target: "vela::earning",
            vpn_fund,
            storage_fund,
            collected,
            %fire_time,
            "earning distribution locked"
        );
        Ok(())
    }

    /// Clears the earner list and unlocks, cancelling a distribution in flight. Coins already
    /// in the earning pool stay there for the next run.
    pub fn reset<Y: SystemApi>(api: &mut Y) -> Result<(), RuntimeError> {
        for (key, _) in api.list_all(&earners_partition()) {
            api.remove_substate(&earners_partition(), &key);
        }
        SchedulerBlueprint::delete_all_by_handler(api, EARNING_START_HANDLER)?;
        SchedulerBlueprint::delete_all_by_handler(api, EARNING_CONTINUE_HANDLER)?;
        Self::set_state(api, &EarningState::Unlocked)
    }

    pub fn on_start<Y: SystemApi>(
        api: &mut Y,
        _payload: &[u8],
        _fire_time: Instant,
    ) -> Result<(), RuntimeError> {
        Self::pay_page(api, true)
    }

    pub fn on_continue<Y: SystemApi>(
        api: &mut Y,
        _payload: &[u8],
        _fire_time: Instant,
    ) -> Result<(), RuntimeError> {
        Self::pay_page(api, false)
    }

    fn pay_page<Y: SystemApi>(api: &mut Y, first_page: bool) -> Result<(), RuntimeError> {
        let EarningState::Locked {
            vpn_point_cost,
            storage_point_cost,
            per_block,
        } = Self::get_state(api)?
        else {
            return Err(EarningError::NotLocked.into());
        };
        if first_page {
            info!(target: "vela::earning", "earning payout started");
            api.emit_event(ApplicationEvent::StartPaying);
        }

        let overflow = || RuntimeError::SystemError(SystemError::ArithmeticOverflow);
        let limit = usize::try_from(per_block).unwrap_or(usize::MAX);
        for (key, value) in api.scan_substates(&earners_partition(), None, Some(limit)) {
            let earner = Self::decode_earner(&key, &value)?;
            let vpn = vpn_point_cost
                .mul_floor(earner.points.vpn)
                .ok_or_else(overflow)?;
            let storage = storage_point_cost
                .mul_floor(earner.points.storage)
                .ok_or_else(overflow)?;
            let amount = vpn.checked_add(storage).ok_or_else(overflow)?;
            BankBlueprint::send_coins_from_module_to_account(
                api,
                EARNING_POOL,
                &earner.account,
                amount,
            )?;
            api.remove_substate(&earners_partition(), &key);
            api.emit_event(ApplicationEvent::Earn {
                account: earner.account,
                vpn,
                storage,
            });
        }

        if api
            .scan_substates(&earners_partition(), None, Some(1))
            .is_empty()
        {
            info!(target: "vela::earning", "earning payout finished");
            api.emit_event(ApplicationEvent::FinishPaying);
            Self::set_state(api, &EarningState::Unlocked)
        } else {
            let next = api.block_time().add_nanos(1).ok_or_else(overflow)?;
            SchedulerBlueprint::schedule_task(api, next, EARNING_CONTINUE_HANDLER, &[])
        }
    }

    pub fn register_handlers<Y: SystemApi>(registry: &mut HandlerRegistry<Y>) {
        registry.register_handler(EARNING_START_HANDLER, Self::on_start::<Y>);
        registry.register_handler(EARNING_CONTINUE_HANDLER, Self::on_continue::<Y>);
    }
}

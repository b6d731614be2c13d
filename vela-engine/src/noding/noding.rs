use tracing::{info, warn};

use super::lottery::LotteryQueue;
use super::power::voting_power;
use super::store::*;
use super::types::*;
use crate::bank::{BankBlueprint, FEE_COLLECTOR};
use crate::errors::*;
use crate::referral::{ReferralBlueprint, ReferralObserver};
use crate::system::events::ApplicationEvent;
use crate::system::system_api::*;
use crate::types::*;

/// The validator lifecycle: qualification, switching, jailing, banning and proposer rewards.
///
/// Queue membership and validator-set deltas are reconciled at block end, see
/// [`NodingBlueprint::end_block`].
pub struct NodingBlueprint;

impl NodingBlueprint {
    /// Checks that the account may run a validator. Staff always qualifies.
    pub fn check_qualification<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
        info: &ValidatorInfo,
    ) -> Result<Result<(), DisqualificationReason>, RuntimeError> {
        if info.staff {
            return Ok(Ok(()));
        }
        let params = &api.params().noding;
        if ReferralBlueprint::get_status(api, account)? < params.min_status {
            return Ok(Err(DisqualificationReason::NotEnoughStatus));
        }
        if ReferralBlueprint::get_delegated_in_network(api, account)? < params.min_delegation {
            return Ok(Err(DisqualificationReason::NotEnoughDelegation));
        }
        Ok(Ok(()))
    }

    fn compute_power<Y: SystemApi>(
        api: &Y,
        account: &AccountAddress,
        info: &ValidatorInfo,
    ) -> Result<i64, RuntimeError> {
        let delegated = ReferralBlueprint::get_delegated_in_network(api, account)?;
        Ok(voting_power(delegated, info.mobile))
    }

    pub fn switch_on<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        pub_key: ConsensusPublicKey,
        mobile: bool,
    ) -> Result<(), RuntimeError> {
        let mut info = get_validator(api, account)?.unwrap_or_default();
        if info.banned_for_life {
            return Err(NodingError::BannedForLife.into());
        }
        if info.switched_on && !info.jailed {
            return Err(NodingError::AlreadyOn.into());
        }

        let cons_address = pub_key.to_consensus_address();
        if let Some(owner) = get_account_by_consensus_address(api, &cons_address)? {
            if owner != *account {
                let other = must_get_validator(api, &owner)?;
                if other.switched_on && other.pub_key == Some(pub_key) {
                    return Err(NodingError::PubkeyBusy { owner }.into());
                }
            }
        }
        if let Err(reason) = Self::check_qualification(api, account, &info)? {
            return Err(NodingError::NotQualified(reason).into());
        }

        if let Some(old_key) = info.pub_key {
            if old_key != pub_key {
                let old_address = old_key.to_consensus_address();
                if get_account_by_consensus_address(api, &old_address)? == Some(*account) {
                    remove_consensus_address(api, &old_address);
                }
            }
        }
        info.mobile = mobile;
        info.pub_key = Some(pub_key);
        info.switched_on = true;
        info.power = if info.jailed {
            0
        } else {
            Self::compute_power(api, account, &info)?
        };
        set_consensus_address(api, &cons_address, account);
        set_validator(api, account, &info)
    }

    pub fn switch_off<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError> {
        let mut info = must_get_validator(api, account)?;
        Self::turn_off(api, account, &mut info)?;
        set_validator(api, account, &info)
    }

    fn turn_off<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        info: &mut ValidatorInfo,
    ) -> Result<(), RuntimeError> {
        info.switched_on = false;
        info.power = 0;
        if info.lottery_no != 0 {
            LotteryQueue::exclude(api, account, info)?;
        }
        Ok(())
    }

    pub fn mark_tick<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError> {
        let mut info = must_get_validator(api, account)?;
        if info.jailed {
            return Ok(());
        }
        info.ok_blocks_in_row += 1;
        info.missed_blocks_in_row = 0;
        set_validator(api, account, &info)
    }

    pub fn mark_stroke<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError> {
        let mut info = must_get_validator(api, account)?;
        if info.jailed {
            return Ok(());
        }
        info.strokes += 1;
        info.missed_blocks_in_row += 1;
        info.ok_blocks_in_row = 0;

        if info.missed_blocks_in_row >= api.params().noding.jail_after {
            Self::jail(api, account, &mut info)?;
        } else {
            LotteryQueue::downshift_if_lucky(api, account, &mut info)?;
        }
        set_validator(api, account, &info)
    }

    fn jail<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        info: &mut ValidatorInfo,
    ) -> Result<(), RuntimeError> {
        let height = api.block_height();
        info.jailed = true;
        info.power = 0;
        info.unjail_at = height + api.params().noding.unjail_after;
        info.jail_count += 1;
        info.missed_blocks_in_row = 0;
        if info.lottery_no != 0 {
            LotteryQueue::exclude(api, account, info)?;
        }
        info!(
            target: "vela::noding",
            %account,
            unjail_at = info.unjail_at,
            "validator jailed"
        );
        api.emit_event(ApplicationEvent::ValidatorJailed { account: *account });
        Ok(())
    }

    /// Records an evidence against the validator. The first infraction is a warning, any
    /// further one bans the validator for life.
    pub fn mark_byzantine<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        evidence: &Evidence,
    ) -> Result<(), RuntimeError> {
        let mut info = must_get_validator(api, account)?;
        if info.banned_for_life {
            return Ok(());
        }
        info.infractions.push(Infraction::from(evidence));

        if info.infractions.len() == 1 {
            LotteryQueue::downshift_if_lucky(api, account, &mut info)?;
            api.emit_event(ApplicationEvent::ValidatorWarning {
                account: *account,
                evidences: info.infractions.clone(),
            });
        } else {
            info.banned_for_life = true;
            Self::turn_off(api, account, &mut info)?;
            info!(target: "vela::noding", %account, "validator banned for life");
            api.emit_event(ApplicationEvent::ValidatorBanned {
                account: *account,
                evidences: info.infractions.clone(),
            });
        }
        set_validator(api, account, &info)
    }

    pub fn unjail<Y: SystemApi>(api: &mut Y, account: &AccountAddress) -> Result<(), RuntimeError> {
        let mut info = must_get_validator(api, account)?;
        if !info.jailed {
            return Err(NodingError::NotJailed.into());
        }
        if api.block_height() < info.unjail_at {
            return Err(NodingError::JailPeriodNotOver {
                unjail_at: info.unjail_at,
            }
            .into());
        }

        info.jailed = false;
        match Self::check_qualification(api, account, &info)? {
            Ok(()) => {
                if info.switched_on {
                    info.power = Self::compute_power(api, account, &info)?;
                }
            }
            Err(reason) => Self::banish(api, account, &mut info, reason)?,
        }
        set_validator(api, account, &info)
    }

    fn banish<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        info: &mut ValidatorInfo,
        reason: DisqualificationReason,
    ) -> Result<(), RuntimeError> {
        Self::turn_off(api, account, info)?;
        info!(target: "vela::noding", %account, %reason, "validator banished");
        api.emit_event(ApplicationEvent::ValidatorBanished {
            account: *account,
            reason,
        });
        Ok(())
    }

    /// Pays the whole fee collector balance to the operator of `cons_address` and records it as
    /// the proposer of the previous block.
    pub fn pay_proposer_reward<Y: SystemApi>(
        api: &mut Y,
        cons_address: &ConsensusAddress,
    ) -> Result<(), RuntimeError> {
        let Some(account) = get_account_by_consensus_address(api, cons_address)? else {
            warn!(target: "vela::noding", %cons_address, "proposer is not in the validator index");
            return Ok(());
        };
        let mut info = must_get_validator(api, &account)?;

        let height = api.block_height();
        if height > 1 {
            set_block_proposer(api, height - 1, &account);
        }
        info.proposed_count += 1;
        LotteryQueue::downshift_if_lucky(api, &account, &mut info)?;
        set_validator(api, &account, &info)?;

        let fees = BankBlueprint::get_module_balance(api, FEE_COLLECTOR)?;
        BankBlueprint::send_coins_from_module_to_account(api, FEE_COLLECTOR, &account, fees)
    }

    /// Staff validators qualify regardless of their referral status.
    pub fn add_to_staff<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError> {
        let mut info = get_validator(api, account)?.unwrap_or_default();
        if info.staff {
            return Ok(());
        }
        info.staff = true;
        set_validator(api, account, &info)
    }

    pub fn remove_from_staff<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError> {
        let mut info = must_get_validator(api, account)?;
        if !info.staff {
            return Ok(());
        }
        info.staff = false;
        set_validator(api, account, &info)?;
        Self::revalidate(api, account)
    }

    /// Re-checks a serving validator after its referral standing changed: a validator that no
    /// longer qualifies is switched off, otherwise its power follows its delegation.
    pub fn revalidate<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError> {
        let Some(mut info) = get_validator(api, account)? else {
            return Ok(());
        };
        if !info.switched_on || info.jailed || info.banned_for_life {
            return Ok(());
        }
        match Self::check_qualification(api, account, &info)? {
            Ok(()) => {
                let power = Self::compute_power(api, account, &info)?;
                if power == info.power {
                    return Ok(());
                }
                info.power = power;
            }
            Err(reason) => Self::banish(api, account, &mut info, reason)?,
        }
        set_validator(api, account, &info)
    }

    /// Forgives strokes and jail history of every validator.
    pub fn general_amnesty<Y: SystemApi>(api: &mut Y) -> Result<(), RuntimeError> {
        for (account, mut info) in list_validators(api)? {
            if info.strokes == 0 && info.jail_count == 0 {
                continue;
            }
            info.strokes = 0;
            info.jail_count = 0;
            set_validator(api, &account, &info)?;
        }
        Ok(())
    }

    /// Applies the consensus signals of a new block: proposer reward, then votes, then
    /// evidence, each in the given order.
    ///
    /// A signal that cannot be applied is logged and skipped; invariant violations abort.
    pub fn begin_block<Y: SystemApi>(
        api: &mut Y,
        proposer: &ConsensusAddress,
        votes: &[VoteInfo],
        evidence: &[Evidence],
    ) -> Result<(), RuntimeError> {
        skip_application_error(Self::pay_proposer_reward(api, proposer))?;

        for vote in votes {
            let Some(account) = get_account_by_consensus_address(api, &vote.cons_address)? else {
                warn!(target: "vela::noding", cons_address = %vote.cons_address, "voter is not in the validator index");
                continue;
            };
            let result = if vote.signed_last_block {
                Self::mark_tick(api, &account)
            } else {
                Self::mark_stroke(api, &account)
            };
            skip_application_error(result)?;
        }

        for evidence in evidence {
            let Some(account) = get_account_by_consensus_address(api, &evidence.cons_address)?
            else {
                warn!(target: "vela::noding", cons_address = %evidence.cons_address, "evidence against an unknown validator");
                continue;
            };
            skip_application_error(Self::mark_byzantine(api, &account, evidence))?;
        }
        Ok(())
    }
}

fn skip_application_error(result: Result<(), RuntimeError>) -> Result<(), RuntimeError> {
    match result {
        Err(RuntimeError::ApplicationError(error)) => {
            warn!(target: "vela::noding", ?error, "consensus signal skipped");
            Ok(())
        }
        other => other,
    }
}

/// Noding as the observer of referral changes.
pub struct NodingObserver;

impl ReferralObserver for NodingObserver {
    fn on_status_update<Y: SystemApi>(
        &self,
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError> {
        NodingBlueprint::revalidate(api, account)
    }

    fn on_stake_changed<Y: SystemApi>(
        &self,
        api: &mut Y,
        account: &AccountAddress,
    ) -> Result<(), RuntimeError> {
        NodingBlueprint::revalidate(api, account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainParams;
    use crate::referral::Status;
    use crate::system::kernel::{BlockHeader, Kernel};
    use vela_store_impls::memory_db::InMemorySubstateDatabase;

    const STAFF: AccountAddress = AccountAddress([1; 20]);
    const ALICE: AccountAddress = AccountAddress([2; 20]);
    const BOB: AccountAddress = AccountAddress([3; 20]);
    const COIN: Amount = MINOR_UNITS_PER_COIN;

    fn key(byte: u8) -> ConsensusPublicKey {
        ConsensusPublicKey([byte; 32])
    }

    fn header(height: i64) -> BlockHeader {
        BlockHeader {
            height,
            time: Instant::new(height * 5 * NANOS_IN_A_SECOND),
        }
    }

    fn seed<Y: SystemApi>(api: &mut Y) {
        ReferralBlueprint::init_genesis(
            api,
            &[
                (ALICE, Status::Leader, 10_000 * COIN),
                (BOB, Status::Lucky, 100_000 * COIN),
            ],
        )
        .unwrap();
        NodingBlueprint::add_to_staff(api, &STAFF).unwrap();
    }

    #[test]
    fn qualification_failures_are_reported() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(1), &params);
        seed(&mut kernel);

        let error = NodingBlueprint::switch_on(&mut kernel, &BOB, key(3), false).unwrap_err();
        assert_eq!(
            error,
            RuntimeError::from(NodingError::NotQualified(
                DisqualificationReason::NotEnoughStatus
            ))
        );
        assert_eq!(error.kind(), "NotQualified");

        NodingBlueprint::switch_on(&mut kernel, &STAFF, key(1), true).unwrap();
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();
        assert_eq!(
            NodingBlueprint::get_validator(&kernel, &STAFF).unwrap().unwrap().power,
            1
        );
        assert_eq!(
            NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap().power,
            10
        );
        assert_eq!(
            NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap_err(),
            RuntimeError::from(NodingError::AlreadyOn)
        );
    }

    #[test]
    fn busy_key_is_rejected() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(1), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();

        let error = NodingBlueprint::switch_on(&mut kernel, &STAFF, key(2), false).unwrap_err();

        assert_eq!(
            error,
            RuntimeError::from(NodingError::PubkeyBusy { owner: ALICE })
        );
    }

    #[test]
    fn key_change_moves_the_index() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(1), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();
        NodingBlueprint::switch_off(&mut kernel, &ALICE).unwrap();

        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(9), false).unwrap();

        assert!(NodingBlueprint::get_validator_by_consensus_address(
            &kernel,
            &key(2).to_consensus_address()
        )
        .unwrap()
        .is_none());
        let (owner, info) = NodingBlueprint::get_validator_by_consensus_address(
            &kernel,
            &key(9).to_consensus_address(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(owner, ALICE);
        assert_eq!(info.pub_key, Some(key(9)));
    }

    #[test]
    fn consecutive_strokes_jail() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(7), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();

        NodingBlueprint::mark_stroke(&mut kernel, &ALICE).unwrap();
        assert!(!NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap().jailed);
        NodingBlueprint::mark_stroke(&mut kernel, &ALICE).unwrap();

        let info = NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap();
        assert!(info.jailed);
        assert_eq!(info.power, 0);
        assert_eq!(info.unjail_at, 7 + 720);
        assert_eq!(info.jail_count, 1);
        assert_eq!(info.missed_blocks_in_row, 0);
        assert_eq!(info.strokes, 2);
        assert_eq!(
            kernel.events(),
            &[ApplicationEvent::ValidatorJailed { account: ALICE }]
        );
        assert_eq!(
            NodingBlueprint::get_validator_state(&kernel, &ALICE).unwrap(),
            ValidatorState::Jail
        );
    }

    #[test]
    fn tick_resets_missed_blocks() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(1), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();

        NodingBlueprint::mark_stroke(&mut kernel, &ALICE).unwrap();
        NodingBlueprint::mark_tick(&mut kernel, &ALICE).unwrap();
        NodingBlueprint::mark_stroke(&mut kernel, &ALICE).unwrap();

        let info = NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap();
        assert!(!info.jailed);
        assert_eq!(info.missed_blocks_in_row, 1);
        assert_eq!(info.strokes, 2);
    }

    #[test]
    fn unjail_of_disqualified_validator_banishes() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(1), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();
        NodingBlueprint::mark_stroke(&mut kernel, &ALICE).unwrap();
        NodingBlueprint::mark_stroke(&mut kernel, &ALICE).unwrap();
        ReferralBlueprint::set_delegated(&mut kernel, &ALICE, 0, &NodingObserver).unwrap();

        assert_eq!(
            NodingBlueprint::unjail(&mut kernel, &ALICE).unwrap_err(),
            RuntimeError::from(NodingError::JailPeriodNotOver { unjail_at: 721 })
        );
        let mut kernel = Kernel::new(&db, header(721), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();
        let mut info = NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap();
        info.jailed = true;
        info.power = 0;
        info.unjail_at = 721;
        set_validator(&mut kernel, &ALICE, &info).unwrap();
        ReferralBlueprint::set_status(&mut kernel, &ALICE, Status::Lucky, &NodingObserver).unwrap();

        NodingBlueprint::unjail(&mut kernel, &ALICE).unwrap();

        let info = NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap();
        assert!(!info.jailed);
        assert!(!info.switched_on);
        assert_eq!(
            kernel.events().last(),
            Some(&ApplicationEvent::ValidatorBanished {
                account: ALICE,
                reason: DisqualificationReason::NotEnoughStatus
            })
        );
    }

    #[test]
    fn second_infraction_bans_for_life() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(1), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();
        let evidence = Evidence {
            cons_address: key(2).to_consensus_address(),
            kind: EvidenceKind::DuplicateVote,
            height: 1,
            time: Instant::new(0),
        };

        NodingBlueprint::mark_byzantine(&mut kernel, &ALICE, &evidence).unwrap();
        assert!(NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap().is_active());
        NodingBlueprint::mark_byzantine(&mut kernel, &ALICE, &evidence).unwrap();

        let info = NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap();
        assert!(info.banned_for_life);
        assert!(!info.switched_on);
        assert_eq!(info.power, 0);
        assert!(NodingBlueprint::is_banned(&kernel, &ALICE).unwrap());
        assert_eq!(
            NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap_err(),
            RuntimeError::from(NodingError::BannedForLife)
        );
        let names = kernel
            .events()
            .iter()
            .map(|event| event.name())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["validator_warning", "validator_banned"]);
    }

    #[test]
    fn proposer_receives_collected_fees() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(5), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();
        BankBlueprint::mint_coins(&mut kernel, FEE_COLLECTOR, 77).unwrap();

        NodingBlueprint::pay_proposer_reward(&mut kernel, &key(2).to_consensus_address()).unwrap();

        assert_eq!(BankBlueprint::get_balance(&kernel, &ALICE).unwrap(), 77);
        assert_eq!(BankBlueprint::get_module_balance(&kernel, FEE_COLLECTOR).unwrap(), 0);
        assert_eq!(NodingBlueprint::get_block_proposer(&kernel, 4).unwrap(), Some(ALICE));
        assert_eq!(NodingBlueprint::get_blocks_proposed_by(&kernel, &ALICE).unwrap(), vec![4]);
        assert_eq!(
            NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap().proposed_count,
            1
        );
    }

    #[test]
    fn losing_delegation_switches_off() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(1), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();

        ReferralBlueprint::set_delegated(&mut kernel, &ALICE, 100_000 * COIN, &NodingObserver)
            .unwrap();
        assert_eq!(
            NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap().power,
            50
        );

        ReferralBlueprint::set_delegated(&mut kernel, &ALICE, COIN, &NodingObserver).unwrap();
        let info = NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap();
        assert!(!info.switched_on);
        assert_eq!(info.power, 0);
    }

    #[test]
    fn staff_removal_revalidates() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(1), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &STAFF, key(1), false).unwrap();

        NodingBlueprint::remove_from_staff(&mut kernel, &STAFF).unwrap();

        assert!(!NodingBlueprint::is_validator(&kernel, &STAFF).unwrap());
    }

    #[test]
    fn amnesty_forgives_strokes() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(1), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();
        NodingBlueprint::mark_stroke(&mut kernel, &ALICE).unwrap();

        NodingBlueprint::general_amnesty(&mut kernel).unwrap();

        assert_eq!(
            NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap().strokes,
            0
        );
    }

    #[test]
    fn unknown_signals_are_skipped() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(2), &params);
        seed(&mut kernel);
        NodingBlueprint::switch_on(&mut kernel, &ALICE, key(2), false).unwrap();

        NodingBlueprint::begin_block(
            &mut kernel,
            &key(8).to_consensus_address(),
            &[
                VoteInfo {
                    cons_address: key(8).to_consensus_address(),
                    signed_last_block: false,
                },
                VoteInfo {
                    cons_address: key(2).to_consensus_address(),
                    signed_last_block: true,
                },
            ],
            &[],
        )
        .unwrap();

        assert_eq!(
            NodingBlueprint::get_validator(&kernel, &ALICE).unwrap().unwrap().ok_blocks_in_row,
            1
        );
    }
}

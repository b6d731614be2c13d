use indexmap::IndexMap;

use super::lottery::LotteryQueue;
use super::noding::NodingBlueprint;
use super::store::*;
use super::types::*;
use super::vp_generator::VpGenerator;
use crate::errors::*;
use crate::system::system_api::*;
use crate::types::*;

impl NodingBlueprint {
    /// Selects the validator set for the next block and returns the deltas against the set
    /// last sent to the consensus layer.
    ///
    /// Active validators are ranked by fewer strokes, then higher power, then longer signing
    /// streak. The first `max_validators` take the top seats and leave the lottery queue; the
    /// others join it, and the first `lottery_validators` queue entries take the lucky seats.
    pub fn end_block<Y: SystemApi>(api: &mut Y) -> Result<Vec<ValidatorUpdate>, RuntimeError> {
        let params = api.params().noding.clone();
        let mut updates: IndexMap<ConsensusPublicKey, i64> = IndexMap::new();
        let mut candidates = Vec::new();

        for (account, mut info) in list_validators(api)? {
            if info.is_active() {
                candidates.push((account, info));
                continue;
            }
            let original = info.clone();
            if info.lottery_no != 0 {
                LotteryQueue::exclude(api, &account, &mut info)?;
            }
            Self::withdraw_power(&account, &mut info, &mut updates)?;
            if info != original {
                set_validator(api, &account, &info)?;
            }
        }

        candidates.sort_by(|(_, a), (_, b)| {
            a.strokes
                .cmp(&b.strokes)
                .then(b.power.cmp(&a.power))
                .then(b.ok_blocks_in_row.cmp(&a.ok_blocks_in_row))
        });
        let top = candidates
            .len()
            .min(usize::try_from(params.max_validators).unwrap_or(usize::MAX));

        let mut originals = Vec::with_capacity(candidates.len());
        for (rank, (account, info)) in candidates.iter_mut().enumerate() {
            originals.push(info.clone());
            if rank < top {
                if info.lottery_no != 0 {
                    LotteryQueue::exclude(api, account, info)?;
                }
            } else if info.lottery_no == 0 {
                LotteryQueue::add_new(api, account, info)?;
            }
        }

        let max_lucky = LotteryQueue::nth_number(api, params.lottery_validators)?;
        let mut generator = params
            .voting_power
            .as_ref()
            .map(|distribution| VpGenerator::new(distribution, params.max_validators));

        for (rank, ((account, mut info), original)) in
            candidates.into_iter().zip(originals).enumerate()
        {
            let selected = rank < top || (info.lottery_no != 0 && info.lottery_no <= max_lucky);
            if selected {
                let power = match generator.as_mut() {
                    Some(generator) => generator.next_power((info.strokes, info.power)),
                    None => info.power,
                };
                Self::advertise_power(&account, &mut info, power, &mut updates)?;
            } else {
                Self::withdraw_power(&account, &mut info, &mut updates)?;
            }
            if info != original {
                set_validator(api, &account, &info)?;
            }
        }

        Ok(updates
            .into_iter()
            .map(|(pub_key, power)| ValidatorUpdate { pub_key, power })
            .collect())
    }

    fn withdraw_power(
        account: &AccountAddress,
        info: &mut ValidatorInfo,
        updates: &mut IndexMap<ConsensusPublicKey, i64>,
    ) -> Result<(), RuntimeError> {
        if info.last_power == 0 {
            return Ok(());
        }
        let last_key = info.last_pub_key.ok_or_else(|| {
            invariant_violation(format!("{} has power in consensus but no key", account))
        })?;
        updates.insert(last_key, 0);
        info.last_power = 0;
        Ok(())
    }

    fn advertise_power(
        account: &AccountAddress,
        info: &mut ValidatorInfo,
        power: i64,
        updates: &mut IndexMap<ConsensusPublicKey, i64>,
    ) -> Result<(), RuntimeError> {
        let pub_key = info
            .pub_key
            .ok_or_else(|| invariant_violation(format!("active validator {} has no key", account)))?;
        if info.last_pub_key != Some(pub_key) {
            Self::withdraw_power(account, info, updates)?;
        }
        if power != info.last_power {
            updates.insert(pub_key, power);
        }
        info.last_power = power;
        info.last_pub_key = Some(pub_key);
        Ok(())
    }
}

use super::store::*;
use super::types::ValidatorInfo;
use crate::errors::*;
use crate::system::system_api::*;
use crate::types::*;

fn lottery_key(number: u64) -> DbSortKey {
    prefixed_key(LOTTERY_PREFIX, &number.to_be_bytes())
}

fn counter_key() -> DbSortKey {
    DbSortKey(vec![LOTTERY_COUNTER_KEY])
}

/// The FIFO queue of active validators waiting for a lucky seat.
///
/// Numbers are issued from a monotonic counter, so the queue order is the order of arrival and
/// the first `lottery_validators` entries hold the lucky seats. The number of a validator is
/// mirrored in [`ValidatorInfo::lottery_no`], which the caller persists.
pub struct LotteryQueue;

impl LotteryQueue {
    fn next_number<Y: SystemApi>(api: &mut Y) -> Result<u64, RuntimeError> {
        let last: u64 = api
            .get_typed(&index_partition(), &counter_key())?
            .unwrap_or_default();
        let next = last
            .checked_add(1)
            .ok_or(RuntimeError::SystemError(SystemError::ArithmeticOverflow))?;
        api.set_typed(&index_partition(), counter_key(), &next)?;
        Ok(next)
    }

    /// Puts the validator at the back of the queue.
    pub fn add_new<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        info: &mut ValidatorInfo,
    ) -> Result<(), RuntimeError> {
        if info.lottery_no != 0 {
            return Err(LotteryQueueError::AlreadyQueued(*account).into());
        }
        let number = Self::next_number(api)?;
        api.set_substate(
            &index_partition(),
            lottery_key(number),
            account.as_bytes().to_vec(),
        );
        info.lottery_no = number;
        Ok(())
    }

    pub fn exclude<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        info: &mut ValidatorInfo,
    ) -> Result<(), RuntimeError> {
        if info.lottery_no == 0 {
            return Err(LotteryQueueError::NotQueued(*account).into());
        }
        let key = lottery_key(info.lottery_no);
        match api.get_substate(&index_partition(), &key) {
            Some(owner) if owner == account.as_bytes() => {}
            _ => {
                return Err(invariant_violation(format!(
                    "lottery number {} is not held by {}",
                    info.lottery_no, account
                )))
            }
        }
        api.remove_substate(&index_partition(), &key);
        info.lottery_no = 0;
        Ok(())
    }

    /// The number of the `n`-th entry of the queue (1-based), the number of the last entry if
    /// the queue is shorter, or 0 if `n` is 0 or the queue is empty.
    pub fn nth_number<Y: SystemApi>(api: &Y, n: u64) -> Result<u64, RuntimeError> {
        if n == 0 {
            return Ok(0);
        }
        let limit = usize::try_from(n).unwrap_or(usize::MAX);
        let entries = api.scan_range(
            &index_partition(),
            Some(&DbSortKey(vec![LOTTERY_PREFIX])),
            &DbSortKey(vec![LOTTERY_PREFIX + 1]),
        );
        match entries.into_iter().take(limit).last() {
            Some((key, _)) => Self::number_of(&key),
            None => Ok(0),
        }
    }

    /// Whether the validator holds one of the lucky seats.
    pub fn is_lucky<Y: SystemApi>(api: &Y, info: &ValidatorInfo) -> Result<bool, RuntimeError> {
        if info.lottery_no == 0 {
            return Ok(false);
        }
        let max_lucky = Self::nth_number(api, api.params().noding.lottery_validators)?;
        Ok(info.lottery_no <= max_lucky)
    }

    /// Moves a lucky validator to the back of the queue, freeing its seat.
    pub fn downshift_if_lucky<Y: SystemApi>(
        api: &mut Y,
        account: &AccountAddress,
        info: &mut ValidatorInfo,
    ) -> Result<(), RuntimeError> {
        if Self::is_lucky(api, info)? {
            Self::exclude(api, account, info)?;
            Self::add_new(api, account, info)?;
        }
        Ok(())
    }

    /// The whole queue, front first.
    pub fn queue<Y: SystemApi>(api: &Y) -> Result<Vec<(u64, AccountAddress)>, RuntimeError> {
        let entries = api.scan_range(
            &index_partition(),
            Some(&DbSortKey(vec![LOTTERY_PREFIX])),
            &DbSortKey(vec![LOTTERY_PREFIX + 1]),
        );
        let mut queue = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let account = AccountAddress::try_from_slice(&value)
                .ok_or_else(|| invariant_violation("malformed account in lottery queue"))?;
            queue.push((Self::number_of(&key)?, account));
        }
        Ok(queue)
    }

    fn number_of(key: &DbSortKey) -> Result<u64, RuntimeError> {
        let bytes: [u8; 8] = key.0[1..]
            .try_into()
            .map_err(|_| invariant_violation(format!("malformed lottery key {:?}", key)))?;
        Ok(u64::from_be_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainParams;
    use crate::system::kernel::{BlockHeader, Kernel};
    use vela_store_impls::memory_db::InMemorySubstateDatabase;

    const A: AccountAddress = AccountAddress([1; 20]);
    const B: AccountAddress = AccountAddress([2; 20]);
    const C: AccountAddress = AccountAddress([3; 20]);

    fn header() -> BlockHeader {
        BlockHeader {
            height: 1,
            time: Instant::new(0),
        }
    }

    #[test]
    fn queue_is_first_in_first_out() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(), &params);
        let (mut a, mut b, mut c) = Default::default();

        LotteryQueue::add_new(&mut kernel, &A, &mut a).unwrap();
        LotteryQueue::add_new(&mut kernel, &B, &mut b).unwrap();
        LotteryQueue::add_new(&mut kernel, &C, &mut c).unwrap();
        LotteryQueue::exclude(&mut kernel, &A, &mut a).unwrap();
        LotteryQueue::add_new(&mut kernel, &A, &mut a).unwrap();

        assert_eq!(
            LotteryQueue::queue(&kernel).unwrap(),
            vec![(2, B), (3, C), (4, A)]
        );
        assert_eq!(a.lottery_no, 4);
        assert_eq!(LotteryQueue::nth_number(&kernel, 0).unwrap(), 0);
        assert_eq!(LotteryQueue::nth_number(&kernel, 2).unwrap(), 3);
        assert_eq!(LotteryQueue::nth_number(&kernel, 10).unwrap(), 4);
    }

    #[test]
    fn double_enqueue_is_an_invariant_violation() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(), &params);
        let mut a = ValidatorInfo::default();
        LotteryQueue::add_new(&mut kernel, &A, &mut a).unwrap();

        let error = LotteryQueue::add_new(&mut kernel, &A, &mut a).unwrap_err();

        assert_eq!(
            error,
            RuntimeError::SystemError(SystemError::LotteryQueueError(
                LotteryQueueError::AlreadyQueued(A)
            ))
        );
        assert!(error.is_abortion());
    }

    #[test]
    fn excluding_absent_account_is_an_invariant_violation() {
        let db = InMemorySubstateDatabase::standard();
        let params = ChainParams::default();
        let mut kernel = Kernel::new(&db, header(), &params);
        let mut a = ValidatorInfo::default();

        let error = LotteryQueue::exclude(&mut kernel, &A, &mut a).unwrap_err();

        assert_eq!(
            error,
            RuntimeError::SystemError(SystemError::LotteryQueueError(
                LotteryQueueError::NotQueued(A)
            ))
        );
    }

    #[test]
    fn only_lucky_validators_are_downshifted() {
        let db = InMemorySubstateDatabase::standard();
        let mut params = ChainParams::default();
        params.noding.lottery_validators = 1;
        let mut kernel = Kernel::new(&db, header(), &params);
        let (mut a, mut b) = Default::default();
        LotteryQueue::add_new(&mut kernel, &A, &mut a).unwrap();
        LotteryQueue::add_new(&mut kernel, &B, &mut b).unwrap();

        LotteryQueue::downshift_if_lucky(&mut kernel, &B, &mut b).unwrap();
        assert_eq!(b.lottery_no, 2);

        LotteryQueue::downshift_if_lucky(&mut kernel, &A, &mut a).unwrap();
        assert_eq!(LotteryQueue::queue(&kernel).unwrap(), vec![(2, B), (3, A)]);
        assert!(LotteryQueue::is_lucky(&kernel, &b).unwrap());
    }
}

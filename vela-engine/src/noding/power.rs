use crate::types::*;

/// Voting power of a validator by the coins delegated in its network.
/// Desktop nodes weigh ten times as much as mobile ones.
pub fn voting_power(delegated: Amount, mobile: bool) -> i64 {
    let e = if mobile { 1 } else { 10 };
    let coins = delegated / MINOR_UNITS_PER_COIN;
    match coins {
        500_000.. => 15 * e,
        100_000.. => 5 * e,
        50_000.. => 2 * e,
        _ => e,
    }
}

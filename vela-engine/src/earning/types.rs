use serde::{Deserialize, Serialize};

use crate::types::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Points {
    pub vpn: u64,
    pub storage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Earner {
    pub account: AccountAddress,
    pub points: Points,
}

/// While locked, the earner list is frozen and paid out page by page at fixed point costs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum EarningState {
    #[default]
    Unlocked,
    Locked {
        vpn_point_cost: Fraction,
        storage_point_cost: Fraction,
        per_block: u64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningParams {
    /// Accounts allowed to list earners, run and reset a distribution.
    pub signers: Vec<AccountAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
pub enum EarningError {
    AlreadyListed(AccountAddress),
    TooLate,
    Locked,
    NotLocked,
    NoMoney,
    InvalidFundPart(Fraction),
    InvalidPerBlock,
    /// The announced point totals are below the points of the listed earners.
    TotalBelowListed { listed: Points, total: Points },
    /// The point costs cannot be represented exactly.
    CostOverflow,
}

use serde::{Deserialize, Serialize};

use crate::referral::Status;
use crate::types::*;

/// Kinds of misbehavior reported by the consensus layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum EvidenceKind {
    DuplicateVote,
    LightClientAttack,
    Unknown,
}

/// A record of misbehavior, as delivered at block begin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub cons_address: ConsensusAddress,
    pub kind: EvidenceKind,
    pub height: i64,
    pub time: Instant,
}

/// An evidence stored against the operator it incriminates.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct Infraction {
    pub height: i64,
    pub time: Instant,
    pub kind: EvidenceKind,
}

impl From<&Evidence> for Infraction {
    fn from(evidence: &Evidence) -> Self {
        Self {
            height: evidence.height,
            time: evidence.time,
            kind: evidence.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteInfo {
    pub cons_address: ConsensusAddress,
    pub signed_last_block: bool,
}

/// A validator-set delta for the consensus layer. Zero power removes the key from the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: ConsensusPublicKey,
    pub power: i64,
}

/// The validator record of an operator account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode)]
pub struct ValidatorInfo {
    pub pub_key: Option<ConsensusPublicKey>,
    pub mobile: bool,
    pub switched_on: bool,
    pub banned_for_life: bool,
    pub jailed: bool,
    pub unjail_at: i64,
    /// Power currently advertised, 0 if inactive.
    pub power: i64,
    /// Power last sent to the consensus layer, under `last_pub_key`.
    pub last_power: i64,
    pub last_pub_key: Option<ConsensusPublicKey>,
    pub ok_blocks_in_row: u64,
    pub missed_blocks_in_row: u64,
    pub strokes: u64,
    pub infractions: Vec<Infraction>,
    pub staff: bool,
    pub proposed_count: u64,
    pub jail_count: u64,
    /// Number in the lottery queue, 0 if not queued.
    pub lottery_no: u64,
}

impl ValidatorInfo {
    pub fn is_active(&self) -> bool {
        self.switched_on && !self.jailed && !self.banned_for_life && self.power > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorState {
    Off,
    Ban,
    Jail,
    /// Active and waiting in the lottery queue.
    Spare,
    /// Active and holding a lottery slot.
    Lucky,
    /// Active and selected by score.
    Top,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr, strum::Display,
)]
pub enum DisqualificationReason {
    NotEnoughStatus,
    NotEnoughDelegation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSlice {
    /// Share of `max_validators` seats in this slice.
    pub part: Fraction,
    pub voting_power: i64,
}

/// Voting power per seat, by seat rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub slices: Vec<DistributionSlice>,
    pub luckies_voting_power: i64,
}

/// Upper bound of `max_validators`.
pub const MAX_VALIDATORS_LIMIT: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodingParams {
    pub max_validators: u64,
    /// Missed blocks in a row that put a validator in jail.
    pub jail_after: u64,
    /// Blocks a jailed validator waits before it may unjail.
    pub unjail_after: i64,
    /// Seats filled from the lottery queue after the top seats.
    pub lottery_validators: u64,
    pub min_status: Status,
    pub min_delegation: Amount,
    pub voting_power: Option<Distribution>,
}

impl Default for NodingParams {
    fn default() -> Self {
        Self {
            max_validators: 100,
            jail_after: 2,
            unjail_after: 720,
            lottery_validators: 0,
            min_status: Status::Leader,
            min_delegation: 10_000 * MINOR_UNITS_PER_COIN,
            voting_power: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
pub enum NodingError {
    NotQualified(DisqualificationReason),
    PubkeyBusy { owner: AccountAddress },
    NotFound(AccountAddress),
    NotJailed,
    JailPeriodNotOver { unjail_at: i64 },
    BannedForLife,
    AlreadyOn,
}

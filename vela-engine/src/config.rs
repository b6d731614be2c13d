use core::fmt;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::bank::BankParams;
use crate::earning::EarningParams;
use crate::noding::{NodingParams, MAX_VALIDATORS_LIMIT};
use crate::referral::Status;
use crate::scheduler::SchedulerParams;
use crate::tariff::{TariffParams, GB};
use crate::types::*;

/// Parameters of every module, fixed at genesis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParams {
    pub scheduler: SchedulerParams,
    pub noding: NodingParams,
    pub earning: EarningParams,
    pub bank: BankParams,
    pub tariff: TariffParams,
    /// Accounts allowed to manage staff, referral standings and amnesties.
    pub authorities: Vec<AccountAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidDayNanos(i64),
    InvalidMaxValidators,
    InvalidJailAfter,
    InvalidUnjailAfter,
    InvalidDistribution(String),
    InvalidSubscriptionPrice,
    InvalidBaseLimit(u64),
    DuplicateAccount(AccountAddress),
    DuplicateValidatorKey(ConsensusPublicKey),
    Json(String),
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl ChainParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let day_nanos = self.scheduler.day_nanos;
        if !(NANOS_IN_A_MINUTE..=NANOS_IN_A_DAY).contains(&day_nanos) {
            return Err(ConfigError::InvalidDayNanos(day_nanos));
        }

        let noding = &self.noding;
        if noding.max_validators == 0 || noding.max_validators > MAX_VALIDATORS_LIMIT {
            return Err(ConfigError::InvalidMaxValidators);
        }
        if noding.jail_after == 0 {
            return Err(ConfigError::InvalidJailAfter);
        }
        if noding.unjail_after <= 0 {
            return Err(ConfigError::InvalidUnjailAfter);
        }
        if let Some(distribution) = &noding.voting_power {
            if distribution.slices.is_empty() {
                return Err(ConfigError::InvalidDistribution("no slices".to_string()));
            }
            let mut sum = Fraction::ZERO;
            for slice in &distribution.slices {
                if !slice.part.is_positive() || slice.part > Fraction::ONE {
                    return Err(ConfigError::InvalidDistribution(format!(
                        "slice part {} out of (0, 1]",
                        slice.part
                    )));
                }
                if slice.voting_power <= 0 {
                    return Err(ConfigError::InvalidDistribution(format!(
                        "slice voting power {} is not positive",
                        slice.voting_power
                    )));
                }
                sum = sum.checked_add(slice.part).ok_or_else(|| {
                    ConfigError::InvalidDistribution("slice parts overflow".to_string())
                })?;
            }
            if sum > Fraction::ONE {
                return Err(ConfigError::InvalidDistribution(format!(
                    "slice parts sum up to {}",
                    sum
                )));
            }
            if distribution.luckies_voting_power < 0 {
                return Err(ConfigError::InvalidDistribution(
                    "negative luckies voting power".to_string(),
                ));
            }
        }

        if self.tariff.subscription_price == 0 {
            return Err(ConfigError::InvalidSubscriptionPrice);
        }
        for base_gb in [self.tariff.base_vpn_gb, self.tariff.base_storage_gb] {
            if base_gb.checked_mul(GB).is_none() {
                return Err(ConfigError::InvalidBaseLimit(base_gb));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: AccountAddress,
    #[serde(default)]
    pub balance: Amount,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub delegated: Amount,
    #[serde(default)]
    pub staff: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub account: AccountAddress,
    pub pub_key: ConsensusPublicKey,
    #[serde(default)]
    pub mobile: bool,
}

/// The initial state of the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default)]
    pub params: ChainParams,
    #[serde(default)]
    pub genesis_time: Instant,
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
    #[serde(default)]
    pub validators: Vec<GenesisValidator>,
}

impl GenesisConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|error| ConfigError::Json(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|error| ConfigError::Json(error.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        let mut accounts = BTreeSet::new();
        for account in &self.accounts {
            if !accounts.insert(account.address) {
                return Err(ConfigError::DuplicateAccount(account.address));
            }
        }
        let mut keys = BTreeSet::new();
        for validator in &self.validators {
            if !keys.insert(validator.pub_key) {
                return Err(ConfigError::DuplicateValidatorKey(validator.pub_key));
            }
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::noding::{DisqualificationReason, Infraction};
use crate::types::*;

/// An event published to the observation bus of the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApplicationEvent {
    Transfer {
        from: AccountAddress,
        to: AccountAddress,
        amount: Amount,
    },
    PayTariff {
        account: AccountAddress,
        expire_at: Instant,
        total: Amount,
    },
    ActivityChanged {
        account: AccountAddress,
        active_now: bool,
    },
    BuyVpn {
        account: AccountAddress,
        new_limit: u64,
        total: Amount,
    },
    BuyStorage {
        account: AccountAddress,
        new_limit: u64,
        total: Amount,
    },
    Earn {
        account: AccountAddress,
        vpn: Amount,
        storage: Amount,
    },
    StartPaying,
    FinishPaying,
    /// A scheduled task failed with an application error; its effects were discarded.
    ScheduledTaskFailed {
        handler: String,
        fire_time: Instant,
        error: String,
    },
    ValidatorBanished {
        account: AccountAddress,
        reason: DisqualificationReason,
    },
    ValidatorJailed {
        account: AccountAddress,
    },
    ValidatorWarning {
        account: AccountAddress,
        evidences: Vec<Infraction>,
    },
    ValidatorBanned {
        account: AccountAddress,
        evidences: Vec<Infraction>,
    },
}

impl ApplicationEvent {
    /// The stable name subscribers match on, e.g. `"validator_jailed"`.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_snake_case() {
        assert_eq!(ApplicationEvent::StartPaying.name(), "start_paying");
        assert_eq!(
            ApplicationEvent::ValidatorJailed {
                account: AccountAddress([1; 20])
            }
            .name(),
            "validator_jailed"
        );
        assert_eq!(
            ApplicationEvent::PayTariff {
                account: AccountAddress([1; 20]),
                expire_at: Instant::new(0),
                total: 1,
            }
            .name(),
            "pay_tariff"
        );
    }

    #[test]
    fn json_is_tagged_with_the_name() {
        let event = ApplicationEvent::Earn {
            account: AccountAddress([2; 20]),
            vpn: 3,
            storage: 4,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "earn");
        assert_eq!(json["vpn"], 3);
        assert_eq!(serde_json::from_value::<ApplicationEvent>(json).unwrap(), event);
    }
}

use crate::bank::BankBlueprint;
use crate::earning::{Earner, EarningBlueprint, Points};
use crate::errors::*;
use crate::noding::{NodingBlueprint, NodingObserver};
use crate::referral::{ReferralBlueprint, Status};
use crate::system::system_api::*;
use crate::tariff::TariffBlueprint;
use crate::types::*;

/// A transaction addressed to one of the modules. Signatures are verified by the host, so the
/// signing account is taken as authenticated.
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
pub enum Message {
    Send {
        from: AccountAddress,
        to: AccountAddress,
        amount: Amount,
    },
    SwitchOn {
        account: AccountAddress,
        pub_key: ConsensusPublicKey,
        mobile: bool,
    },
    SwitchOff {
        account: AccountAddress,
    },
    Unjail {
        account: AccountAddress,
    },
    AddToStaff {
        signer: AccountAddress,
        account: AccountAddress,
    },
    RemoveFromStaff {
        signer: AccountAddress,
        account: AccountAddress,
    },
    GeneralAmnesty {
        signer: AccountAddress,
    },
    SetStatus {
        signer: AccountAddress,
        account: AccountAddress,
        status: Status,
    },
    SetDelegated {
        signer: AccountAddress,
        account: AccountAddress,
        delegated: Amount,
    },
    /// Takes an account out of the network until it pays a tariff again.
    Banish {
        signer: AccountAddress,
        account: AccountAddress,
    },
    BlockSender {
        signer: AccountAddress,
        account: AccountAddress,
    },
    UnblockSender {
        signer: AccountAddress,
        account: AccountAddress,
    },
    ListEarners {
        signer: AccountAddress,
        earners: Vec<Earner>,
    },
    RunEarning {
        signer: AccountAddress,
        fund_part: Fraction,
        per_block: u64,
        total: Points,
        fire_time: Instant,
    },
    ResetEarning {
        signer: AccountAddress,
    },
    PayTariff {
        account: AccountAddress,
    },
    BuyVpn {
        account: AccountAddress,
        gb: u64,
    },
    BuyStorage {
        account: AccountAddress,
        gb: u64,
    },
}

fn require_authority<Y: SystemApi>(api: &Y, signer: &AccountAddress) -> Result<(), RuntimeError> {
    if api.params().authorities.contains(signer) {
        Ok(())
    } else {
        Err(ApplicationError::Unauthorized(*signer).into())
    }
}

fn require_earning_signer<Y: SystemApi>(
    api: &Y,
    signer: &AccountAddress,
) -> Result<(), RuntimeError> {
    if api.params().earning.signers.contains(signer) {
        Ok(())
    } else {
        Err(ApplicationError::Unauthorized(*signer).into())
    }
}

impl Message {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Routes the message to the module handling it.
    pub fn apply<Y: SystemApi>(&self, api: &mut Y) -> Result<(), RuntimeError> {
        match self {
            Message::Send { from, to, amount } => BankBlueprint::send_coins(api, from, to, *amount),
            Message::SwitchOn {
                account,
                pub_key,
                mobile,
            } => NodingBlueprint::switch_on(api, account, *pub_key, *mobile),
            Message::SwitchOff { account } => NodingBlueprint::switch_off(api, account),
            Message::Unjail { account } => NodingBlueprint::unjail(api, account),
            Message::AddToStaff { signer, account } => {
                require_authority(api, signer)?;
                NodingBlueprint::add_to_staff(api, account)
            }
            Message::RemoveFromStaff { signer, account } => {
                require_authority(api, signer)?;
                NodingBlueprint::remove_from_staff(api, account)
            }
            Message::GeneralAmnesty { signer } => {
                require_authority(api, signer)?;
                NodingBlueprint::general_amnesty(api)
            }
            Message::SetStatus {
                signer,
                account,
                status,
            } => {
                require_authority(api, signer)?;
                ReferralBlueprint::set_status(api, account, *status, &NodingObserver)
            }
            Message::SetDelegated {
                signer,
                account,
                delegated,
            } => {
                require_authority(api, signer)?;
                ReferralBlueprint::set_delegated(api, account, *delegated, &NodingObserver)
            }
            Message::Banish { signer, account } => {
                require_authority(api, signer)?;
                ReferralBlueprint::banish(api, account)
            }
            Message::BlockSender { signer, account } => {
                require_authority(api, signer)?;
                BankBlueprint::add_blocked_sender(api, account);
                Ok(())
            }
            Message::UnblockSender { signer, account } => {
                require_authority(api, signer)?;
                BankBlueprint::remove_blocked_sender(api, account);
                Ok(())
            }
            Message::ListEarners { signer, earners } => {
                require_earning_signer(api, signer)?;
                EarningBlueprint::list_earners(api, earners)
            }
            Message::RunEarning {
                signer,
                fund_part,
                per_block,
                total,
                fire_time,
            } => {
                require_earning_signer(api, signer)?;
                EarningBlueprint::run(api, *fund_part, *per_block, *total, *fire_time)
            }
            Message::ResetEarning { signer } => {
                require_earning_signer(api, signer)?;
                EarningBlueprint::reset(api)
            }
            Message::PayTariff { account } => TariffBlueprint::pay_tariff(api, account),
            Message::BuyVpn { account, gb } => TariffBlueprint::buy_vpn(api, account, *gb),
            Message::BuyStorage { account, gb } => TariffBlueprint::buy_storage(api, account, *gb),
        }
    }
}

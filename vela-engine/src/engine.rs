use tracing::{debug, info};

use crate::bank::BankBlueprint;
use crate::config::{ConfigError, GenesisConfig};
use crate::earning::EarningBlueprint;
use crate::errors::*;
use crate::messages::Message;
use crate::noding::*;
use crate::referral::ReferralBlueprint;
use crate::scheduler::{HandlerRegistry, SchedulerBlueprint};
use crate::system::events::ApplicationEvent;
use crate::system::kernel::{BlockHeader, Kernel};
use crate::system::system_api::TransactionApi;
use crate::tariff::TariffBlueprint;
use crate::types::*;

/// The consensus signals opening a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginBlockRequest {
    pub height: i64,
    pub time: Instant,
    pub proposer: ConsensusAddress,
    pub votes: Vec<VoteInfo>,
    pub evidence: Vec<Evidence>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Success,
    /// The transaction was reverted; the block went on.
    Failure(ApplicationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    pub message: &'static str,
    pub outcome: TransactionOutcome,
}

/// Everything a block produced, to be committed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockReceipt {
    pub height: i64,
    pub time: Instant,
    pub validator_updates: Vec<ValidatorUpdate>,
    pub events: Vec<ApplicationEvent>,
    pub transaction_results: Vec<TransactionResult>,
    pub database_updates: DatabaseUpdates,
}

/// Drives the block lifecycle over a substate database.
pub struct ChainEngine<S: SubstateDatabase> {
    substate_db: S,
    genesis: GenesisConfig,
    last_header: BlockHeader,
}

impl<S: SubstateDatabase> ChainEngine<S> {
    pub fn new(substate_db: S, genesis: GenesisConfig) -> Result<Self, ConfigError> {
        genesis.validate()?;
        let last_header = BlockHeader {
            height: 0,
            time: genesis.genesis_time,
        };
        Ok(Self {
            substate_db,
            genesis,
            last_header,
        })
    }

    pub fn substate_db(&self) -> &S {
        &self.substate_db
    }

    pub fn genesis(&self) -> &GenesisConfig {
        &self.genesis
    }

    pub fn last_header(&self) -> &BlockHeader {
        &self.last_header
    }

    /// Handlers of the scheduled tasks of every module.
    fn handler_registry<'g>() -> HandlerRegistry<Kernel<'g, S>> {
        let mut registry = HandlerRegistry::new();
        EarningBlueprint::register_handlers(&mut registry);
        TariffBlueprint::register_handlers(&mut registry);
        registry
    }

    /// Seeds accounts, referral standings, staff and validators, and returns the initial
    /// validator set in the receipt.
    pub fn init_genesis(&self) -> Result<BlockReceipt, RuntimeError> {
        let genesis = &self.genesis;
        let mut kernel = Kernel::new(&self.substate_db, self.last_header, &genesis.params);

        let balances = genesis
            .accounts
            .iter()
            .filter(|account| account.balance > 0)
            .map(|account| (account.address, account.balance))
            .collect::<Vec<_>>();
        BankBlueprint::init_genesis(&mut kernel, &genesis.params.bank, &balances)?;

        let standings = genesis
            .accounts
            .iter()
            .map(|account| (account.address, account.status, account.delegated))
            .collect::<Vec<_>>();
        ReferralBlueprint::init_genesis(&mut kernel, &standings)?;

        for account in genesis.accounts.iter().filter(|account| account.staff) {
            NodingBlueprint::add_to_staff(&mut kernel, &account.address)?;
        }
        for validator in &genesis.validators {
            NodingBlueprint::switch_on(
                &mut kernel,
                &validator.account,
                validator.pub_key,
                validator.mobile,
            )?;
        }

        let validator_updates = NodingBlueprint::end_block(&mut kernel)?;
        info!(
            target: "vela::engine",
            validators = validator_updates.len(),
            "genesis initialized"
        );
        let (database_updates, events) = kernel.finalize();
        Ok(BlockReceipt {
            height: self.last_header.height,
            time: self.last_header.time,
            validator_updates,
            events,
            transaction_results: Vec::new(),
            database_updates,
        })
    }

    /// Opens a block: pays the proposer, applies votes and evidence, then fires due tasks.
    pub fn begin_block(&self, request: &BeginBlockRequest) -> Result<BlockExecution<'_, S>, RuntimeError> {
        let header = BlockHeader {
            height: request.height,
            time: request.time,
        };
        debug!(target: "vela::engine", height = header.height, time = %header.time, "begin block");
        let mut kernel = Kernel::new(&self.substate_db, header, &self.genesis.params);
        NodingBlueprint::begin_block(
            &mut kernel,
            &request.proposer,
            &request.votes,
            &request.evidence,
        )?;
        SchedulerBlueprint::on_begin_block(&Self::handler_registry(), &mut kernel)?;
        Ok(BlockExecution {
            kernel,
            transaction_results: Vec::new(),
        })
    }

    /// Runs `f` against the committed state, as seen at the last committed block.
    pub fn query<T, F>(&self, f: F) -> T
    where
        F: FnOnce(&Kernel<'_, S>) -> T,
    {
        let kernel = Kernel::new(&self.substate_db, self.last_header, &self.genesis.params);
        f(&kernel)
    }
}

impl<S: SubstateDatabase + CommittableSubstateDatabase> ChainEngine<S> {
    pub fn commit(&mut self, receipt: &BlockReceipt) {
        self.substate_db.commit(&receipt.database_updates);
        self.last_header = BlockHeader {
            height: receipt.height,
            time: receipt.time,
        };
    }
}

/// A block between its begin and end signals.
pub struct BlockExecution<'g, S: SubstateDatabase> {
    kernel: Kernel<'g, S>,
    transaction_results: Vec<TransactionResult>,
}

impl<'g, S: SubstateDatabase> BlockExecution<'g, S> {
    pub fn kernel(&mut self) -> &mut Kernel<'g, S> {
        &mut self.kernel
    }

    /// Executes a transaction. An application error reverts the transaction only and is
    /// reported in the outcome; any other error aborts the block.
    pub fn execute(&mut self, message: &Message) -> Result<TransactionOutcome, RuntimeError> {
        let outcome = match self
            .kernel
            .execute_transaction(|api| message.apply(api))
        {
            Ok(()) => TransactionOutcome::Success,
            Err(RuntimeError::ApplicationError(error)) => TransactionOutcome::Failure(error),
            Err(error) => return Err(error),
        };
        self.transaction_results.push(TransactionResult {
            message: message.name(),
            outcome: outcome.clone(),
        });
        Ok(outcome)
    }

    /// Closes the block and returns the validator-set deltas with everything to commit.
    pub fn end_block(mut self) -> Result<BlockReceipt, RuntimeError> {
        let validator_updates = NodingBlueprint::end_block(&mut self.kernel)?;
        let header = *self.kernel.header();
        let (database_updates, events) = self.kernel.finalize();
        Ok(BlockReceipt {
            height: header.height,
            time: header.time,
            validator_updates,
            events,
            transaction_results: self.transaction_results,
            database_updates,
        })
    }
}

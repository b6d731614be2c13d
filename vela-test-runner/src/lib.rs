//! An in-memory chain for scenario tests: builds a genesis, then drives the engine one block
//! at a time and commits every receipt.

use tracing_subscriber::EnvFilter;
use vela_engine::prelude::*;
use vela_store_impls::memory_db::InMemorySubstateDatabase;

pub mod prelude {
    pub use crate::*;
    pub use vela_engine::prelude::*;
    pub use vela_store_impls::memory_db::InMemorySubstateDatabase;
    pub use vela_store_interface::interface::*;
}

/// Time between two consecutive test blocks.
pub const DEFAULT_BLOCK_INTERVAL: i64 = 5 * NANOS_IN_A_SECOND;

/// A deterministic account address for a test actor.
pub fn test_account(seed: u8) -> AccountAddress {
    AccountAddress([seed; 20])
}

/// A deterministic consensus key for a test validator.
pub fn test_key(seed: u8) -> ConsensusPublicKey {
    ConsensusPublicKey([seed; 32])
}

/// The consensus signals and transactions of one test block.
#[derive(Debug, Clone, Default)]
pub struct TestBlock {
    proposer: Option<ConsensusAddress>,
    votes: Vec<VoteInfo>,
    evidence: Vec<(ConsensusAddress, EvidenceKind)>,
    messages: Vec<Message>,
}

impl TestBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proposed_by(mut self, pub_key: ConsensusPublicKey) -> Self {
        self.proposer = Some(pub_key.to_consensus_address());
        self
    }

    pub fn vote(mut self, pub_key: ConsensusPublicKey, signed_last_block: bool) -> Self {
        self.votes.push(VoteInfo {
            cons_address: pub_key.to_consensus_address(),
            signed_last_block,
        });
        self
    }

    /// Evidence of a duplicate vote, dated at the block it is delivered in.
    pub fn evidence(mut self, pub_key: ConsensusPublicKey) -> Self {
        self.evidence
            .push((pub_key.to_consensus_address(), EvidenceKind::DuplicateVote));
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }
}

pub struct TestRunnerBuilder {
    genesis: GenesisConfig,
    block_interval: i64,
    trace: bool,
}

impl TestRunnerBuilder {
    pub fn with_params(mut self, params: ChainParams) -> Self {
        self.genesis.params = params;
        self
    }

    pub fn with_genesis_time(mut self, time: Instant) -> Self {
        self.genesis.genesis_time = time;
        self
    }

    pub fn with_block_interval(mut self, nanos: i64) -> Self {
        self.block_interval = nanos;
        self
    }

    pub fn with_account(mut self, account: GenesisAccount) -> Self {
        self.genesis.accounts.push(account);
        self
    }

    pub fn with_balance(self, address: AccountAddress, balance: Amount) -> Self {
        self.with_account(GenesisAccount {
            address,
            balance,
            status: Status::default(),
            delegated: 0,
            staff: false,
        })
    }

    /// An operator qualified by its referral standing.
    pub fn with_operator(self, address: AccountAddress, status: Status, delegated: Amount) -> Self {
        self.with_account(GenesisAccount {
            address,
            balance: 0,
            status,
            delegated,
            staff: false,
        })
    }

    pub fn with_staff(self, address: AccountAddress) -> Self {
        self.with_account(GenesisAccount {
            address,
            balance: 0,
            status: Status::default(),
            delegated: 0,
            staff: true,
        })
    }

    pub fn with_validator(
        mut self,
        account: AccountAddress,
        pub_key: ConsensusPublicKey,
        mobile: bool,
    ) -> Self {
        self.genesis.validators.push(GenesisValidator {
            account,
            pub_key,
            mobile,
        });
        self
    }

    /// Prints engine logs, filtered by `RUST_LOG`.
    pub fn with_trace(mut self) -> Self {
        self.trace = true;
        self
    }

    pub fn build(self) -> TestRunner {
        if self.trace {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_test_writer()
                .try_init();
        }

        let default_proposer = self
            .genesis
            .validators
            .first()
            .map(|validator| validator.pub_key.to_consensus_address())
            .unwrap_or(ConsensusAddress([0; 20]));
        let mut engine = ChainEngine::new(InMemorySubstateDatabase::standard(), self.genesis)
            .expect("Invalid genesis");
        let genesis_receipt = engine.init_genesis().expect("Genesis failed");
        engine.commit(&genesis_receipt);

        TestRunner {
            engine,
            block_interval: self.block_interval,
            default_proposer,
            genesis_receipt,
        }
    }
}

pub struct TestRunner {
    engine: ChainEngine<InMemorySubstateDatabase>,
    block_interval: i64,
    default_proposer: ConsensusAddress,
    genesis_receipt: BlockReceipt,
}

impl TestRunner {
    pub fn builder() -> TestRunnerBuilder {
        TestRunnerBuilder {
            genesis: GenesisConfig::default(),
            block_interval: DEFAULT_BLOCK_INTERVAL,
            trace: false,
        }
    }

    pub fn engine(&self) -> &ChainEngine<InMemorySubstateDatabase> {
        &self.engine
    }

    pub fn substate_db(&self) -> &InMemorySubstateDatabase {
        self.engine.substate_db()
    }

    pub fn genesis_receipt(&self) -> &BlockReceipt {
        &self.genesis_receipt
    }

    pub fn height(&self) -> i64 {
        self.engine.last_header().height
    }

    pub fn next_height(&self) -> i64 {
        self.height() + 1
    }

    /// Block time of the block at `height`.
    pub fn time_of(&self, height: i64) -> Instant {
        let genesis_time = self.engine.genesis().genesis_time;
        genesis_time
            .add_nanos(height * self.block_interval)
            .expect("Block time out of range")
    }

    /// Runs one block to completion and commits it. An aborted block leaves the state as it
    /// was and does not advance the height.
    pub fn try_execute_block(&mut self, block: TestBlock) -> Result<BlockReceipt, RuntimeError> {
        let height = self.next_height();
        let time = self.time_of(height);
        let request = BeginBlockRequest {
            height,
            time,
            proposer: block.proposer.unwrap_or(self.default_proposer),
            votes: block.votes,
            evidence: block
                .evidence
                .into_iter()
                .map(|(cons_address, kind)| Evidence {
                    cons_address,
                    kind,
                    height,
                    time,
                })
                .collect(),
        };

        let mut execution = self.engine.begin_block(&request)?;
        for message in &block.messages {
            execution.execute(message)?;
        }
        let receipt = execution.end_block()?;
        self.engine.commit(&receipt);
        Ok(receipt)
    }

    pub fn execute_block(&mut self, block: TestBlock) -> BlockReceipt {
        self.try_execute_block(block).expect("Block aborted")
    }

    /// Runs a block holding just `message` and returns its outcome.
    pub fn execute_message(&mut self, message: Message) -> TransactionOutcome {
        let receipt = self.execute_block(TestBlock::new().message(message));
        receipt.transaction_results[0].outcome.clone()
    }

    /// Runs empty blocks until the next block is `height`.
    pub fn advance_to(&mut self, height: i64) -> Vec<BlockReceipt> {
        let mut receipts = Vec::new();
        while self.next_height() < height {
            receipts.push(self.execute_block(TestBlock::new()));
        }
        receipts
    }

    pub fn query<T>(&self, f: impl FnOnce(&Kernel<'_, InMemorySubstateDatabase>) -> T) -> T {
        self.engine.query(f)
    }

    pub fn validator(&self, account: &AccountAddress) -> ValidatorInfo {
        self.query(|api| NodingBlueprint::get_validator(api, account))
            .expect("Database misconfigured")
            .expect("Validator not found")
    }

    pub fn validator_state(&self, account: &AccountAddress) -> ValidatorState {
        self.query(|api| NodingBlueprint::get_validator_state(api, account))
            .expect("Database misconfigured")
    }

    pub fn lottery_queue(&self) -> Vec<(u64, AccountAddress)> {
        self.query(|api| NodingBlueprint::lottery_queue(api))
            .expect("Database misconfigured")
    }

    pub fn balance(&self, account: &AccountAddress) -> Amount {
        self.query(|api| BankBlueprint::get_balance(api, account))
            .expect("Database misconfigured")
    }

    pub fn module_balance(&self, module: &str) -> Amount {
        self.query(|api| BankBlueprint::get_module_balance(api, module))
            .expect("Database misconfigured")
    }

    pub fn earning_state(&self) -> EarningState {
        self.query(|api| EarningBlueprint::get_state(api))
            .expect("Database misconfigured")
    }

    pub fn earners(&self) -> Vec<Earner> {
        self.query(|api| EarningBlueprint::get_earners(api))
            .expect("Database misconfigured")
    }

    pub fn profile(&self, account: &AccountAddress) -> Option<Profile> {
        self.query(|api| TariffBlueprint::get_profile(api, account))
            .expect("Database misconfigured")
    }

    /// Every consensus-index entry, as (consensus address, owner).
    pub fn consensus_index(&self) -> Vec<(ConsensusAddress, AccountAddress)> {
        self.query(|api| NodingBlueprint::get_consensus_index(api))
            .expect("Database misconfigured")
    }

    pub fn validators(&self) -> Vec<(AccountAddress, ValidatorInfo)> {
        let mut validators = self
            .query(|api| NodingBlueprint::get_active_validators(api))
            .expect("Database misconfigured");
        validators.extend(
            self.query(|api| NodingBlueprint::get_non_active_validators(api))
                .expect("Database misconfigured"),
        );
        validators.sort_by_key(|(account, _)| *account);
        validators
    }
}

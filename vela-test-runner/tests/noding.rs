use std::collections::BTreeMap;

use vela_test_runner::prelude::*;

const COIN: Amount = MINOR_UNITS_PER_COIN;

fn update(pub_key: ConsensusPublicKey, power: i64) -> ValidatorUpdate {
    ValidatorUpdate { pub_key, power }
}

/// Every switched-on validator is reachable from its key through the consensus index.
fn assert_index_consistent(runner: &TestRunner) {
    let index = runner.consensus_index().into_iter().collect::<BTreeMap<_, _>>();
    let mut switched_on = 0;
    for (account, info) in runner.validators() {
        if !info.switched_on {
            continue;
        }
        switched_on += 1;
        let pub_key = info.pub_key.expect("switched-on validator without key");
        assert_eq!(index.get(&pub_key.to_consensus_address()), Some(&account));
    }
    let owned_by_switched_on = index
        .iter()
        .filter(|(cons_address, owner)| {
            let info = runner.validator(owner);
            info.switched_on
                && info.pub_key.map(|key| key.to_consensus_address()) == Some(**cons_address)
        })
        .count();
    assert_eq!(owned_by_switched_on, switched_on);
}

/// The last power emitted for each key is what the consensus layer holds for it now.
fn assert_deltas_close(runner: &TestRunner, receipts: &[BlockReceipt]) {
    let mut emitted = BTreeMap::new();
    for update in receipts.iter().flat_map(|receipt| &receipt.validator_updates) {
        emitted.insert(update.pub_key, update.power);
    }
    let mut held = BTreeMap::new();
    for (_, info) in runner.validators() {
        if let Some(pub_key) = info.last_pub_key {
            if info.last_power != 0 {
                held.insert(pub_key, info.last_power);
            }
        }
    }
    emitted.retain(|_, power| *power != 0);
    assert_eq!(emitted, held);
}

#[test]
fn missed_blocks_jail_and_unjail_restores_power() {
    // Arrange
    let staff = test_account(1);
    let operator = test_account(2);
    let mut params = ChainParams::default();
    params.noding.unjail_after = 120;
    let mut runner = TestRunner::builder()
        .with_params(params)
        .with_staff(staff)
        .with_operator(operator, Status::Leader, 10_000 * COIN)
        .with_validator(staff, test_key(1), false)
        .build();

    // Act
    let switch_on = runner.execute_block(TestBlock::new().message(Message::SwitchOn {
        account: operator,
        pub_key: test_key(2),
        mobile: false,
    }));
    let first_miss = runner.execute_block(
        TestBlock::new()
            .proposed_by(test_key(1))
            .vote(test_key(1), true)
            .vote(test_key(2), false),
    );
    let second_miss = runner.execute_block(
        TestBlock::new()
            .proposed_by(test_key(1))
            .vote(test_key(1), true)
            .vote(test_key(2), false),
    );

    // Assert
    assert_eq!(switch_on.validator_updates, vec![update(test_key(2), 10)]);
    assert!(first_miss.validator_updates.is_empty());
    assert_eq!(second_miss.validator_updates, vec![update(test_key(2), 0)]);
    assert!(second_miss
        .events
        .contains(&ApplicationEvent::ValidatorJailed { account: operator }));
    let info = runner.validator(&operator);
    assert!(info.jailed);
    assert_eq!(info.unjail_at, 123);
    assert_eq!(info.jail_count, 1);
    assert_eq!(runner.validator_state(&operator), ValidatorState::Jail);

    // Act
    runner.advance_to(122);
    let early = runner.execute_message(Message::Unjail { account: operator });
    let unjail = runner.execute_block(TestBlock::new().message(Message::Unjail { account: operator }));

    // Assert
    assert_eq!(
        early,
        TransactionOutcome::Failure(ApplicationError::NodingError(
            NodingError::JailPeriodNotOver { unjail_at: 123 }
        ))
    );
    assert_eq!(unjail.height, 123);
    assert_eq!(unjail.transaction_results[0].outcome, TransactionOutcome::Success);
    assert_eq!(unjail.validator_updates, vec![update(test_key(2), 10)]);
    assert!(!runner.validator(&operator).jailed);
    assert_index_consistent(&runner);
}

#[test]
fn unjail_before_jail_fails() {
    // Arrange
    let operator = test_account(2);
    let mut runner = TestRunner::builder()
        .with_operator(operator, Status::Leader, 10_000 * COIN)
        .with_validator(operator, test_key(2), false)
        .build();

    // Act
    let outcome = runner.execute_message(Message::Unjail { account: operator });

    // Assert
    assert_eq!(
        outcome,
        TransactionOutcome::Failure(ApplicationError::NodingError(NodingError::NotJailed))
    );
}

#[test]
fn second_infraction_bans_for_life() {
    // Arrange
    let staff = test_account(1);
    let operator = test_account(2);
    let mut runner = TestRunner::builder()
        .with_staff(staff)
        .with_operator(operator, Status::Leader, 10_000 * COIN)
        .with_validator(staff, test_key(1), false)
        .with_validator(operator, test_key(2), false)
        .build();

    // Act
    let warned = runner.execute_block(TestBlock::new().evidence(test_key(2)));

    // Assert
    assert!(warned.validator_updates.is_empty());
    assert!(runner.validator(&operator).is_active());
    assert!(matches!(
        warned.events.as_slice(),
        [ApplicationEvent::ValidatorWarning { account, evidences }]
            if *account == operator && evidences.len() == 1
    ));

    // Act
    let banned = runner.execute_block(TestBlock::new().evidence(test_key(2)));

    // Assert
    assert_eq!(banned.validator_updates, vec![update(test_key(2), 0)]);
    let info = runner.validator(&operator);
    assert!(info.banned_for_life);
    assert!(!info.switched_on);
    assert_eq!(info.infractions.len(), 2);
    assert_eq!(runner.validator_state(&operator), ValidatorState::Ban);

    // Act
    let mut outcomes = Vec::new();
    for pub_key in [test_key(2), test_key(3)] {
        outcomes.push(runner.execute_message(Message::SwitchOn {
            account: operator,
            pub_key,
            mobile: true,
        }));
    }
    let quiet = runner.execute_block(TestBlock::new().evidence(test_key(2)));

    // Assert
    for outcome in outcomes {
        assert_eq!(
            outcome,
            TransactionOutcome::Failure(ApplicationError::NodingError(NodingError::BannedForLife))
        );
    }
    assert!(quiet.events.is_empty());
    assert_eq!(runner.validator(&operator).infractions.len(), 2);
}

#[test]
fn lucky_validator_missing_a_block_yields_its_seat() {
    // Arrange
    let mut params = ChainParams::default();
    params.noding.max_validators = 5;
    params.noding.lottery_validators = 2;
    let mut builder = TestRunner::builder().with_params(params);
    for seed in 1..=8u8 {
        let delegated = if seed <= 5 { 100_000 } else { 10_000 };
        builder = builder
            .with_operator(test_account(seed), Status::Leader, delegated * COIN)
            .with_validator(test_account(seed), test_key(seed), false);
    }
    let mut runner = builder.build();
    let genesis_updates = runner.genesis_receipt().validator_updates.clone();

    // Act
    let receipt = runner.execute_block(TestBlock::new().vote(test_key(6), false));

    // Assert
    assert_eq!(
        genesis_updates,
        (1..=5)
            .map(|seed| update(test_key(seed), 50))
            .chain([update(test_key(6), 10), update(test_key(7), 10)])
            .collect::<Vec<_>>()
    );
    assert_eq!(
        receipt.validator_updates,
        vec![update(test_key(8), 10), update(test_key(6), 0)]
    );
    assert_eq!(
        runner.lottery_queue(),
        vec![(2, test_account(7)), (3, test_account(8)), (4, test_account(6))]
    );
    assert_eq!(runner.validator_state(&test_account(1)), ValidatorState::Top);
    assert_eq!(runner.validator_state(&test_account(8)), ValidatorState::Lucky);
    assert_eq!(runner.validator_state(&test_account(6)), ValidatorState::Spare);
    assert_deltas_close(&runner, &[runner.genesis_receipt().clone(), receipt]);
}

#[test]
fn proposer_collects_fees_and_is_recorded() {
    // Arrange
    let staff = test_account(1);
    let mut runner = TestRunner::builder()
        .with_staff(staff)
        .with_validator(staff, test_key(1), false)
        .with_balance(module_account_address(FEE_COLLECTOR), 1_000)
        .build();

    // Act
    runner.execute_block(TestBlock::new().proposed_by(test_key(1)));
    runner.execute_block(TestBlock::new().proposed_by(test_key(1)));

    // Assert
    assert_eq!(runner.balance(&staff), 1_000);
    assert_eq!(runner.module_balance(FEE_COLLECTOR), 0);
    let info = runner.validator(&staff);
    assert_eq!(info.proposed_count, 2);
    assert_eq!(
        runner.query(|api| NodingBlueprint::get_block_proposer(api, 1)),
        Ok(Some(staff))
    );
    assert_eq!(
        runner.query(|api| NodingBlueprint::get_blocks_proposed_by(api, &staff)),
        Ok(vec![1])
    );
}

#[test]
fn consensus_key_cannot_be_shared() {
    // Arrange
    let first = test_account(1);
    let second = test_account(2);
    let mut runner = TestRunner::builder()
        .with_staff(first)
        .with_staff(second)
        .with_validator(first, test_key(1), false)
        .build();

    // Act
    let outcome = runner.execute_message(Message::SwitchOn {
        account: second,
        pub_key: test_key(1),
        mobile: false,
    });

    // Assert
    assert_eq!(
        outcome,
        TransactionOutcome::Failure(ApplicationError::NodingError(NodingError::PubkeyBusy {
            owner: first
        }))
    );
    assert_index_consistent(&runner);
}

#[test]
fn unqualified_operator_cannot_switch_on() {
    // Arrange
    let lowly = test_account(1);
    let poor = test_account(2);
    let mut runner = TestRunner::builder()
        .with_operator(lowly, Status::Lucky, 1_000_000 * COIN)
        .with_operator(poor, Status::Leader, 9_999 * COIN)
        .build();

    // Act
    let outcomes = [(lowly, 1), (poor, 2)].map(|(account, seed)| {
        runner.execute_message(Message::SwitchOn {
            account,
            pub_key: test_key(seed),
            mobile: false,
        })
    });

    // Assert
    assert_eq!(
        outcomes,
        [
            TransactionOutcome::Failure(ApplicationError::NodingError(NodingError::NotQualified(
                DisqualificationReason::NotEnoughStatus
            ))),
            TransactionOutcome::Failure(ApplicationError::NodingError(NodingError::NotQualified(
                DisqualificationReason::NotEnoughDelegation
            ))),
        ]
    );
}

#[test]
fn lost_stake_banishes_and_staff_removal_revalidates() {
    // Arrange
    let authority = test_account(9);
    let operator = test_account(2);
    let staffer = test_account(3);
    let mut params = ChainParams::default();
    params.authorities = vec![authority];
    let mut runner = TestRunner::builder()
        .with_params(params)
        .with_operator(operator, Status::Leader, 100_000 * COIN)
        .with_staff(staffer)
        .with_validator(operator, test_key(2), true)
        .with_validator(staffer, test_key(3), false)
        .build();

    // Act
    let receipt = runner.execute_block(
        TestBlock::new()
            .message(Message::SetDelegated {
                signer: authority,
                account: operator,
                delegated: 50_000 * COIN,
            })
            .message(Message::SetDelegated {
                signer: authority,
                account: operator,
                delegated: 1_000 * COIN,
            })
            .message(Message::RemoveFromStaff {
                signer: authority,
                account: staffer,
            })
            .message(Message::RemoveFromStaff {
                signer: operator,
                account: staffer,
            }),
    );

    // Assert
    let outcomes = receipt
        .transaction_results
        .iter()
        .map(|result| result.outcome.clone())
        .collect::<Vec<_>>();
    assert_eq!(
        outcomes,
        vec![
            TransactionOutcome::Success,
            TransactionOutcome::Success,
            TransactionOutcome::Success,
            TransactionOutcome::Failure(ApplicationError::Unauthorized(operator)),
        ]
    );
    assert!(receipt.events.contains(&ApplicationEvent::ValidatorBanished {
        account: operator,
        reason: DisqualificationReason::NotEnoughDelegation,
    }));
    assert!(receipt.events.contains(&ApplicationEvent::ValidatorBanished {
        account: staffer,
        reason: DisqualificationReason::NotEnoughStatus,
    }));
    assert_eq!(
        receipt.validator_updates,
        vec![update(test_key(2), 0), update(test_key(3), 0)]
    );
    assert!(!runner.validator(&operator).switched_on);
    assert_deltas_close(&runner, &[runner.genesis_receipt().clone(), receipt]);
}

#[test]
fn switching_off_and_rekeying_keeps_index_and_deltas_consistent() {
    // Arrange
    let operator = test_account(2);
    let mut runner = TestRunner::builder()
        .with_staff(operator)
        .with_validator(operator, test_key(2), false)
        .build();
    let mut receipts = vec![runner.genesis_receipt().clone()];

    // Act
    receipts.push(
        runner.execute_block(TestBlock::new().message(Message::SwitchOff { account: operator })),
    );
    assert_index_consistent(&runner);
    receipts.push(runner.execute_block(TestBlock::new().message(Message::SwitchOn {
        account: operator,
        pub_key: test_key(4),
        mobile: false,
    })));

    // Assert
    assert_eq!(receipts[1].validator_updates, vec![update(test_key(2), 0)]);
    assert_eq!(receipts[2].validator_updates, vec![update(test_key(4), 10)]);
    assert_eq!(
        runner.consensus_index(),
        vec![(test_key(4).to_consensus_address(), operator)]
    );
    assert_index_consistent(&runner);
    assert_deltas_close(&runner, &receipts);
}

#[test]
fn general_amnesty_clears_strokes() {
    // Arrange
    let authority = test_account(9);
    let operator = test_account(2);
    let mut params = ChainParams::default();
    params.authorities = vec![authority];
    let mut runner = TestRunner::builder()
        .with_params(params)
        .with_staff(operator)
        .with_validator(operator, test_key(2), false)
        .build();
    runner.execute_block(TestBlock::new().vote(test_key(2), false));
    assert_eq!(runner.validator(&operator).strokes, 1);

    // Act
    let outcome = runner.execute_message(Message::GeneralAmnesty { signer: authority });

    // Assert
    assert_eq!(outcome, TransactionOutcome::Success);
    assert_eq!(runner.validator(&operator).strokes, 0);
}

//! Property tests for ledger invariants.

use std::sync::Arc;

use lockbox_contracts::{deploy, Purse, Role, TimeLockedVault, VaultConfig, VaultError};
use lockbox_protocol::{Address, ManualClock};
use proptest::prelude::*;

const ACCOUNTS: [&str; 3] = ["alice", "bob", "carol"];

#[derive(Debug, Clone)]
enum Op {
    Deposit { who: usize, amount: u64, lock: u64 },
    Withdraw { who: usize, id: u64 },
    Advance(u64),
    Transfer { who: usize, to: usize, id: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 0..1_000u64, 0..50u64)
            .prop_map(|(who, amount, lock)| Op::Deposit { who, amount, lock }),
        (0..3usize, 0..20u64).prop_map(|(who, id)| Op::Withdraw { who, id }),
        (0..30u64).prop_map(Op::Advance),
        (0..3usize, 0..3usize, 0..20u64).prop_map(|(who, to, id)| Op::Transfer { who, to, id }),
    ]
}

fn vault_with_users() -> (TimeLockedVault, ManualClock) {
    let clock = ManualClock::new();
    let owner = Address::from_label("owner");
    let mut vault = deploy(
        Address::from_label("deployer"),
        owner,
        VaultConfig::default(),
        Arc::new(clock.clone()),
    )
    .unwrap();
    for label in ACCOUNTS {
        vault
            .set_access(&owner, Address::from_label(label), Role::User)
            .unwrap();
    }
    (vault, clock)
}

proptest! {
    #[test]
    fn custody_matches_outstanding_deposits(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let (mut vault, clock) = vault_with_users();
        let mut paid_out: u128 = 0;
        let mut deposited: u128 = 0;

        for op in ops {
            match op {
                Op::Deposit { who, amount, lock } => {
                    if vault.deposit(&Address::from_label(ACCOUNTS[who]), amount, lock).is_ok() {
                        deposited += u128::from(amount);
                    }
                }
                Op::Withdraw { who, id } => {
                    let mut purse = Purse::new();
                    if let Ok(amount) = vault.withdraw(&Address::from_label(ACCOUNTS[who]), id, &mut purse) {
                        prop_assert_eq!(purse.balance(), amount);
                        paid_out += u128::from(amount);
                    }
                }
                Op::Advance(secs) => clock.advance(secs),
                Op::Transfer { who, to, id } => {
                    let _ = vault.transfer_receipt(
                        &Address::from_label(ACCOUNTS[who]),
                        Address::from_label(ACCOUNTS[to]),
                        id,
                    );
                }
            }
            prop_assert!(vault.custody_invariant_holds());
            prop_assert_eq!(u128::from(vault.custody()), deposited - paid_out);
            prop_assert_eq!(vault.issuer().total_supply(), vault.deposit_count());
        }
    }

    #[test]
    fn deposit_ids_are_dense_and_match_receipts(amounts in prop::collection::vec(1..1_000_000u64, 1..40)) {
        let (mut vault, _clock) = vault_with_users();
        let alice = Address::from_label("alice");

        for (expected, amount) in amounts.iter().enumerate() {
            let id = vault.deposit(&alice, *amount, 0).unwrap();
            prop_assert_eq!(id, expected as u64);
            prop_assert_eq!(vault.receipt_owner(id).unwrap(), alice);
            prop_assert_eq!(vault.get_deposit(id).unwrap().amount, *amount);
        }
    }

    #[test]
    fn unassigned_accounts_never_deposit(label in "[a-z]{8,16}", amount in 1..u64::MAX, lock in 0..1_000u64) {
        prop_assume!(!ACCOUNTS.contains(&label.as_str()) && label != "owner");
        let (mut vault, _clock) = vault_with_users();

        prop_assert_eq!(
            vault.deposit(&Address::from_label(&label), amount, lock),
            Err(VaultError::Unauthorized)
        );
        prop_assert_eq!(vault.deposit_count(), 0);
    }

    #[test]
    fn withdraw_before_unlock_always_too_early(lock in 1..10_000u64, elapsed in 0..10_000u64) {
        prop_assume!(elapsed < lock);
        let (mut vault, clock) = vault_with_users();
        let alice = Address::from_label("alice");

        let id = vault.deposit(&alice, 100, lock).unwrap();
        clock.advance(elapsed);
        let result = vault.withdraw(&alice, id, &mut Purse::new());
        prop_assert!(
            matches!(result, Err(VaultError::TooEarly { .. })),
            "unexpected result: {:?}",
            result
        );
        prop_assert_eq!(vault.custody(), 100);
    }
}

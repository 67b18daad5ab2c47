//! Property tests: the conservation identities hold across arbitrary
//! operation sequences.
//!
//! Operations are generated blindly and applied best-effort; rejected
//! operations must leave the ledger untouched, accepted ones must keep
//! supply equal to backed debt and collateral fully accounted for. The
//! check runs after every single step.

use proptest::prelude::*;

use ferrum::core::config::ProtocolParams;
use ferrum::core::token::{AccountId, CollateralAmount, TokenAmount};
use ferrum::protocol::engine::Protocol;

/// One generated step against the ledger
#[derive(Debug, Clone)]
enum Op {
    Open { account: u64, units: u64, dollars: u64, rate_bps: u64 },
    Adjust { index: usize, coll_delta: i64, debt_delta: i64 },
    Close { index: usize },
    Provide { account: u64, dollars: u64 },
    Withdraw { account: u64, dollars: u64 },
    Redeem { account: u64, dollars: u64 },
    LiquidateAll,
    ClaimSurplus { account: u64 },
    AdvanceTime { secs: u64 },
    SetPrice { cents: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (2u64..6, 1u64..50, 500u64..20_000, 50u64..2000).prop_map(
            |(account, units, dollars, rate_bps)| Op::Open { account, units, dollars, rate_bps }
        ),
        (0usize..8, -200_000_000i64..200_000_000, -500_000i64..500_000)
            .prop_map(|(index, coll_delta, debt_delta)| Op::Adjust { index, coll_delta, debt_delta }),
        (0usize..8).prop_map(|index| Op::Close { index }),
        (2u64..6, 1u64..10_000).prop_map(|(account, dollars)| Op::Provide { account, dollars }),
        (2u64..6, 1u64..10_000).prop_map(|(account, dollars)| Op::Withdraw { account, dollars }),
        (2u64..6, 1u64..5_000).prop_map(|(account, dollars)| Op::Redeem { account, dollars }),
        Just(Op::LiquidateAll),
        (2u64..6).prop_map(|account| Op::ClaimSurplus { account }),
        (1u64..10_000_000).prop_map(|secs| Op::AdvanceTime { secs }),
        (50_000u64..500_000).prop_map(|cents| Op::SetPrice { cents }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn conservation_holds_for_any_sequence(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut protocol = Protocol::new(ProtocolParams::default()).unwrap();
        protocol.update_price(200_000).unwrap();
        let mut troves = Vec::new();

        for op in ops {
            // Individual operations may be rejected; that is fine as long
            // as the ledger stays consistent either way
            match op {
                Op::Open { account, units, dollars, rate_bps } => {
                    if let Ok(id) = protocol.open_trove(
                        AccountId(account),
                        CollateralAmount::from_units(units),
                        TokenAmount::from_dollars(dollars),
                        rate_bps,
                    ) {
                        troves.push(id);
                    }
                }
                Op::Adjust { index, coll_delta, debt_delta } => {
                    if let Some(&id) = troves.get(index % troves.len().max(1)) {
                        let _ = protocol.adjust_trove(id, coll_delta, debt_delta);
                    }
                }
                Op::Close { index } => {
                    if let Some(&id) = troves.get(index % troves.len().max(1)) {
                        let _ = protocol.close_trove(id);
                    }
                }
                Op::Provide { account, dollars } => {
                    let _ = protocol.provide_to_stability_pool(
                        AccountId(account),
                        TokenAmount::from_dollars(dollars),
                    );
                }
                Op::Withdraw { account, dollars } => {
                    let _ = protocol.withdraw_from_stability_pool(
                        AccountId(account),
                        TokenAmount::from_dollars(dollars),
                    );
                }
                Op::Redeem { account, dollars } => {
                    let _ = protocol.redeem(
                        AccountId(account),
                        TokenAmount::from_dollars(dollars),
                    );
                }
                Op::LiquidateAll => {
                    let candidates = protocol.active_troves();
                    let _ = protocol.liquidate(&candidates);
                }
                Op::ClaimSurplus { account } => {
                    let _ = protocol.claim_surplus(AccountId(account));
                }
                Op::AdvanceTime { secs } => protocol.advance_time(secs),
                Op::SetPrice { cents } => {
                    let _ = protocol.update_price(cents);
                }
            }

            protocol.check_conservation().unwrap();
        }
    }

    #[test]
    fn snapshot_roundtrip_preserves_any_state(ops in prop::collection::vec(op_strategy(), 1..20)) {
        let mut protocol = Protocol::new(ProtocolParams::default()).unwrap();
        protocol.update_price(200_000).unwrap();

        for op in ops {
            if let Op::Open { account, units, dollars, rate_bps } = op {
                let _ = protocol.open_trove(
                    AccountId(account),
                    CollateralAmount::from_units(units),
                    TokenAmount::from_dollars(dollars),
                    rate_bps,
                );
            } else if let Op::AdvanceTime { secs } = op {
                protocol.advance_time(secs);
            }
        }

        let bytes = protocol.snapshot().to_bytes().unwrap();
        let restored = Protocol::from_snapshot(
            ferrum::protocol::engine::LedgerSnapshot::from_bytes(&bytes).unwrap(),
        );
        prop_assert_eq!(restored.snapshot().to_bytes().unwrap(), bytes);
    }
}

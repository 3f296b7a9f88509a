//! Cart behavior through the storefront context.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rust_decimal::Decimal;
use tote_core::{CartState, ProductId};
use tote_integration_tests::{TOKEN, backend, login, size, storefront};
use tote_storefront::NoticeLevel;
use tote_storefront::remote::MemoryOp;

#[tokio::test]
async fn test_repeated_adds_sync_running_total() {
    let backend = backend();
    let mut shop = storefront(&backend);
    shop.handle(login()).await;

    for _ in 0..3 {
        let notice = shop.add_to_cart(&ProductId::new("tee"), "M");
        assert_eq!(notice.level, NoticeLevel::Success);
    }
    shop.flush().await;

    assert_eq!(shop.cart_count(), 3);
    assert_eq!(
        backend.cart(TOKEN).quantity(&ProductId::new("tee"), &size("M")).map(|q| q.get()),
        Some(3)
    );
}

#[tokio::test]
async fn test_missing_size_leaves_cart_alone() {
    let backend = backend();
    let mut shop = storefront(&backend);
    shop.handle(login()).await;

    let notice = shop.add_to_cart(&ProductId::new("tee"), "  ");
    assert_eq!(notice.message, "Please Select a Size");
    assert_eq!(shop.cart_count(), 0);
    assert_eq!(backend.cart_writes(), 0);
}

#[tokio::test]
async fn test_quantity_zero_removes_entry_everywhere() {
    let backend = backend();
    let mut shop = storefront(&backend);
    shop.handle(login()).await;
    shop.add_to_cart(&ProductId::new("tee"), "M");
    shop.add_to_cart(&ProductId::new("cap"), "OS");

    assert!(shop.update_quantity(&ProductId::new("tee"), "M", 0).is_none());
    assert!(shop.remove_from_cart(&ProductId::new("tee"), "M").is_none());
    shop.flush().await;

    assert_eq!(shop.cart_count(), 1);
    assert!(shop.cart().state().sizes(&ProductId::new("tee")).is_none());
    assert!(backend.cart(TOKEN).sizes(&ProductId::new("tee")).is_none());
}

#[tokio::test]
async fn test_offline_edits_survive_until_reload() {
    let backend = backend();
    let mut shop = storefront(&backend);
    shop.handle(login()).await;
    backend.fail(MemoryOp::PutCartEntry);

    shop.add_to_cart(&ProductId::new("cap"), "OS");
    shop.flush().await;
    assert_eq!(shop.cart_count(), 1);
    assert_eq!(shop.pending_notices().len(), 1);

    // The remote never saw the write, so a reload heals back to it.
    backend.recover(MemoryOp::PutCartEntry);
    shop.handle(login()).await;
    assert_eq!(shop.cart_count(), 0);
}

#[tokio::test]
async fn test_amount_uses_local_price_and_skips_unknown() {
    let backend = backend();
    let mut remote = CartState::new();
    remote.set_quantity(&ProductId::new("tee"), &size("L"), 2);
    remote.set_quantity(&ProductId::new("retired"), &size("M"), 4);
    backend.set_cart(TOKEN, remote);

    let mut shop = storefront(&backend);
    shop.handle(login()).await;

    assert_eq!(shop.cart_count(), 6);
    // Local tee price (10.00) wins over the remote duplicate (99.00).
    assert_eq!(shop.cart_amount(), Decimal::new(2000, 2));
    assert_eq!(shop.cart_total(), Decimal::new(2500, 2));
}

#[derive(Debug, Clone)]
enum Op {
    Add(&'static str, &'static str),
    Set(&'static str, &'static str, u32),
    Decrement(&'static str, &'static str),
}

fn entry() -> impl Strategy<Value = (&'static str, &'static str)> {
    (
        prop::sample::select(vec!["tee", "cap", "hoodie"]),
        prop::sample::select(vec!["S", "M", "L"]),
    )
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        entry().prop_map(|(p, s)| Op::Add(p, s)),
        (entry(), 0..4u32).prop_map(|((p, s), q)| Op::Set(p, s, q)),
        entry().prop_map(|(p, s)| Op::Decrement(p, s)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_local_and_remote_converge(ops in prop::collection::vec(op(), 1..40)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();

        runtime.block_on(async {
            let backend = backend();
            let mut shop = storefront(&backend);
            shop.handle(login()).await;

            for op in &ops {
                match *op {
                    Op::Add(p, s) => {
                        shop.add_to_cart(&ProductId::new(p), s);
                    }
                    Op::Set(p, s, q) => {
                        shop.update_quantity(&ProductId::new(p), s, q);
                    }
                    Op::Decrement(p, s) => {
                        shop.decrement(&ProductId::new(p), s);
                    }
                }
                // Settle each write so the final remote state is deterministic.
                shop.flush().await;
            }

            let local = shop.cart().state().clone();
            prop_assert_eq!(&local, &backend.cart(TOKEN));
            prop_assert!(local.entries().all(|(_, _, q)| q.get() > 0));
            Ok(())
        })?;
    }
}

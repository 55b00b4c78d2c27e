use common::Tokens;
use criterion::{Criterion, criterion_group, criterion_main};
use ledger::AccountLedger;
use store::MemoryStore;

fn bench_stake_refund_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = MemoryStore::new();
    let user = rt.block_on(store.seed_user("bench", Tokens::new(1_000_000)));
    let ledger = AccountLedger::new(store);

    c.bench_function("ledger/stake_refund_cycle", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.stake(user, Tokens::new(10)).await.unwrap();
                ledger.refund(user, Tokens::new(10)).await.unwrap();
            });
        });
    });
}

fn bench_balance_read(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = MemoryStore::new();
    let user = rt.block_on(store.seed_user("bench", Tokens::new(500)));
    let ledger = AccountLedger::new(store);

    c.bench_function("ledger/balance_read", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.balance(user).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_stake_refund_cycle, bench_balance_read);
criterion_main!(benches);

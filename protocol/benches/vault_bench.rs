// Deposit & withdraw benchmarks for the basket vault engine.
//
// Covers a single deposit across baskets of growing size, a partial
// withdrawal against a populated fund, and the fund-state encode used on
// every store commit.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use basket_protocol::config::{AssetConfig, FundConfig, GovernorConfig, MAX_ASSETS};
use basket_protocol::vault::{FixedRateExecutor, VaultEngine};

fn basket(size: usize) -> FundConfig {
    let base = 100 / size as u32;
    let assets = (0..size)
        .map(|i| {
            let weight = if i == 0 { 100 - base * (size as u32 - 1) } else { base };
            AssetConfig::new(&format!("TOKEN{i}"), &format!("venue{i}"), weight)
        })
        .collect();
    FundConfig {
        name: format!("bench-{size}"),
        base_asset: "USDC".into(),
        router: "router".into(),
        assets,
        governor: GovernorConfig::new("bench", 3600),
    }
}

fn populated(size: usize, holders: usize) -> VaultEngine<FixedRateExecutor> {
    let mut fund =
        VaultEngine::new(&basket(size), "deployer", FixedRateExecutor::with_slippage_bps(30)).unwrap();
    for i in 0..holders {
        fund.deposit(&format!("holder-{i}"), 1_000_000 + i as u128).unwrap();
    }
    fund
}

fn bench_deposit(c: &mut Criterion) {
    let mut group = c.benchmark_group("vault/deposit");

    for size in [1usize, 4, 8, MAX_ASSETS] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let mut fund = populated(size, 100);
            b.iter(|| fund.deposit("bench", 1_000_000).unwrap());
        });
    }

    group.finish();
}

fn bench_withdraw(c: &mut Criterion) {
    c.bench_function("vault/withdraw_partial", |b| {
        b.iter_batched(
            || populated(4, 100),
            |mut fund| fund.withdraw("holder-7", 10_000).unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_state_encode(c: &mut Criterion) {
    let fund = populated(4, 1_000);
    c.bench_function("vault/state_encode_1000_holders", |b| {
        b.iter(|| bincode::serialize(fund.state()).unwrap());
    });
}

criterion_group!(benches, bench_deposit, bench_withdraw, bench_state_encode);
criterion_main!(benches);

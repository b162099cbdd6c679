//! Criterion benchmark: controller pass over large route networks.
//!
//! Measures one forced pass (rule resolution, snapshot, alerts, decision and
//! write-back for every route) at 100, 1K and 10K routes, plus the pure
//! `decide` step on its own.
//!
//! Run with: cargo bench -p smart_transit --bench controller_bench --features bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use smart_transit::commands;
use smart_transit::occupancy_controller::{decide, ControlInput, ControlParams, RuleConfig};
use smart_transit::rule_store::{Rule, RuleOrigin, RuleParams};
use smart_transit::settings::TransitSettings;
use smart_transit::telemetry::{AppliedPolicy, FleetRange, RouteSnapshot};
use smart_transit::test_harness::TestTransit;
use smart_transit::{RouteKey, TransportType};

// ---------------------------------------------------------------------------
// Helper: a network with `route_count` randomized lines
// ---------------------------------------------------------------------------

fn create_benchmark_network(route_count: u32) -> TestTransit {
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(route_count));
    let (mut transit, custom) = TestTransit::new().with_rule(RuleParams {
        name: "Bench".to_string(),
        occupancy_target_pct: 55,
        standard_ticket_price: 10,
        max_ticket_increase_pct: 30,
        max_ticket_discount_pct: 30,
        ..Default::default()
    });

    for i in 0..route_count {
        let transport_type = TransportType::ALL[i as usize % TransportType::ALL.len()];
        let key = RouteKey::new(transport_type, i);
        let vehicles: Vec<u32> = (0..rng.gen_range(1..40))
            .map(|_| rng.gen_range(0..120))
            .collect();
        let stops: Vec<(u32, u32)> = (0..rng.gen_range(2..20))
            .map(|s| (i * 32 + s, rng.gen_range(0..150)))
            .collect();
        transit = transit
            .with_route(key, &vehicles, &stops)
            .with_applied(key, 8, vehicles.len() as u32)
            .with_fleet_range(key, 1, 60);
        if i % 3 == 0 {
            transit = transit.with_binding(key, custom);
        }
    }
    transit
}

fn bench_controller_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("controller_pass");
    group.sample_size(20);

    for &count in &[100u32, 1_000, 10_000] {
        let mut transit = create_benchmark_network(count);
        group.bench_with_input(
            BenchmarkId::new("forced_pass", format!("{count}_routes")),
            &count,
            |b, _| {
                b.iter(|| black_box(commands::tick(transit.world_mut())));
            },
        );
    }

    group.finish();
}

fn bench_decide(c: &mut Criterion) {
    let settings = TransitSettings::default();
    let rule = RuleConfig::from_rule(
        &Rule::builtin(TransportType::Tram, settings.transport.get(TransportType::Tram)),
        RuleOrigin::TypeDefault,
    );
    let snapshot = RouteSnapshot {
        vehicle_count: 12,
        empty_vehicles: 2,
        onboard: 700,
        waiting: 180,
        capacity_per_vehicle: 120,
        busiest_stop: None,
        weighted_ratio: 880.0 / 1440.0,
        carries_passengers: true,
    };
    let params = ControlParams::from_settings(&settings);

    c.bench_function("decide", |b| {
        b.iter(|| {
            decide(black_box(&ControlInput {
                snapshot: &snapshot,
                rule: &rule,
                applied: AppliedPolicy {
                    ticket_price: 8,
                    vehicle_count: 12,
                },
                fleet_range: FleetRange { min: 2, max: 20 },
                params,
            }))
        });
    });
}

criterion_group!(benches, bench_controller_pass, bench_decide);
criterion_main!(benches);

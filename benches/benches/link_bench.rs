//! # Link Benchmarks
//!
//! Measures the noisy channel, event bus dispatch and a full simulated run.
//!
//! Run: `cargo bench --bench link_bench`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use telesim_channel::Channel;
use telesim_core::prelude::*;
use telesim_orchestration::Orchestrator;

const FAST: f64 = 1_000_000_000.0;

fn encrypted(bits: usize) -> Arc<Message> {
    let msg = Arc::new(Message::new("x"));
    msg.advance_with(MessageState::Encrypted, |f| {
        f.encrypted = Some("01".repeat(bits / 2));
    })
    .unwrap();
    msg
}

/// Benchmark transmissão por perfil de canal
fn bench_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_transmit");
    let bits = 4096;
    group.throughput(Throughput::Elements(bits as u64));

    for channel_type in ChannelType::ALL {
        let channel = Channel::with_seed(ChannelProfile::new(channel_type, 0.0, FAST), 42);
        group.bench_function(BenchmarkId::from_parameter(channel_type), |b| {
            b.iter_batched(
                || encrypted(bits),
                |msg| channel.transmit(&msg).unwrap(),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Benchmark publicação no event bus
fn bench_event_bus(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_bus");

    for listeners in [0usize, 1, 8] {
        let bus = EventBus::with_history(Origin::Channel, 0);
        for _ in 0..listeners {
            bus.subscribe(|e: &LinkEvent| {
                black_box(e.kind);
            });
        }
        group.bench_with_input(BenchmarkId::new("publish", listeners), &bus, |b, bus| {
            b.iter(|| bus.publish(EventKind::TransmissionProgress, EventPayload::Progress(0.5)))
        });
    }

    let bus = EventBus::new(Origin::Sender);
    let sub = bus.subscribe_channel(EventFilter::All);
    group.bench_function("publish_and_drain_100", |b| {
        b.iter(|| {
            for _ in 0..100 {
                bus.publish(EventKind::MessageSent, EventPayload::None);
            }
            black_box(sub.try_iter().count())
        })
    });

    group.finish();
}

/// Benchmark execução completa emissor → receptor
fn bench_complete_run(c: &mut Criterion) {
    let mut config = SimulationConfig::default();
    config.seed = Some(7);
    config.channel.bits_per_second = FAST;
    config.event_history = 0;
    config.cipher = CipherConfig::new(CipherAlgorithm::Xor, "1010");
    let orchestrator = Orchestrator::with_config(config);

    c.bench_function("run_complete_hello", |b| {
        b.iter(|| black_box(orchestrator.run_complete("Hello, link!").unwrap().wait().unwrap()))
    });
}

criterion_group!(benches, bench_channel, bench_event_bus, bench_complete_run);
criterion_main!(benches);

//! Core Tick Benchmarks
//!
//! The reference deployment ticks at 125 MHz, far beyond what a software
//! core can match in real time. These benchmarks track per-tick cost so a
//! host can size its block length and decide what simulated tick rate it can
//! sustain.
//!
//! ```text
//! sustainable_tick_rate = 1 / time_per_tick
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vigil::prelude::*;

// ============================================================================
// Constants
// ============================================================================

const CHANNEL_COUNTS: [usize; 3] = [1, 4, 12];
const BLOCK_SIZES: [usize; 4] = [64, 256, 1024, 4096];

// ============================================================================
// Helper Functions
// ============================================================================

/// A core broadcasting on every channel.
fn broadcasting_core(channels: usize) -> Core {
    let config = CoreConfig::default().with_channels(channels);
    let mut core = Core::new(config).unwrap();
    let mask = (1u32 << channels) - 1;
    for (addr, value) in [
        (REG_CTRL, CTRL_MASTER_EN | CTRL_WATCHDOG_EN),
        (REG_CH_ENABLE, mask),
    ] {
        core.write(addr, value).unwrap();
        core.tick(&mut Silence, &mut Silence);
    }
    core
}

// ============================================================================
// Stage Benchmarks
// ============================================================================

fn bench_channel(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages/channel");
    group.throughput(Throughput::Elements(1));
    group.bench_function("tick", |b| {
        let mut channel = Channel::default();
        let mut audio = 0i16;
        b.iter(|| {
            audio = audio.wrapping_add(37) & 0x0FFF;
            channel.tick(black_box(ChannelInput {
                phase_increment: 17_351_668,
                audio,
                enabled: true,
            }))
        });
    });
    group.finish();
}

fn bench_supervisor(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages/supervisor");
    group.throughput(Throughput::Elements(1));
    group.bench_function("advance", |b| {
        let config = SupervisorConfig::default();
        let mut state = SupervisorState::default();
        b.iter(|| {
            state = state.advance(
                &config,
                LatchPolicy::OperatorClear,
                black_box(SupervisorInput::idle()),
            );
            state.elapsed_ticks
        });
    });
    group.finish();
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages/engine");
    group.throughput(Throughput::Elements(1));

    for channels in CHANNEL_COUNTS {
        group.bench_with_input(BenchmarkId::new("tick", channels), &channels, |b, &n| {
            let mut engine = CompositionEngine::new(n, 6554, ScaleTable::default());
            let increments = CoreConfig::default().default_increments();
            let gating = Gating::new(true, 0xFFF);
            b.iter(|| {
                engine.tick(black_box(EngineInput {
                    increments: &increments,
                    gating,
                    audio: 2048,
                }))
            });
        });
    }

    group.finish();
}

// ============================================================================
// Core Benchmarks
// ============================================================================

fn bench_core_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("core/tick");
    group.throughput(Throughput::Elements(1));

    for channels in CHANNEL_COUNTS {
        group.bench_with_input(BenchmarkId::new("channels", channels), &channels, |b, &n| {
            let mut core = broadcasting_core(n);
            let mut buffer = ToneSource::new(1_000.0, 125_000_000, 0.8);
            let mut live = Silence;
            b.iter(|| core.tick(&mut buffer, &mut live));
        });
    }

    group.finish();
}

fn bench_process_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("core/process_block");

    for block_size in BLOCK_SIZES {
        group.throughput(Throughput::Elements(block_size as u64));
        group.bench_with_input(
            BenchmarkId::new("12ch", block_size),
            &block_size,
            |b, &size| {
                let mut core = broadcasting_core(12);
                let mut buffer = NoiseSource::new(1, 0.5);
                let mut live = Silence;
                let mut out = vec![0i16; size];
                b.iter(|| {
                    core.process_block(&mut buffer, &mut live, &mut out);
                    black_box(out[size - 1])
                });
            },
        );
    }

    group.finish();
}

fn bench_heartbeat_traffic(c: &mut Criterion) {
    let mut group = c.benchmark_group("core/heartbeat");
    group.throughput(Throughput::Elements(1));
    group.bench_function("write_then_tick", |b| {
        let mut core = broadcasting_core(12);
        let mut value = 0u32;
        b.iter(|| {
            value = value.wrapping_add(1);
            core.write(ch_freq_addr(0), black_box(value)).unwrap();
            core.tick(&mut Silence, &mut Silence)
        });
    });
    group.finish();
}

criterion_group!(stage_benches, bench_channel, bench_supervisor, bench_engine,);

criterion_group!(
    core_benches,
    bench_core_tick,
    bench_process_block,
    bench_heartbeat_traffic,
);

criterion_main!(stage_benches, core_benches);

//! Tick throughput for a full four-player room.

use blast_sim::{Direction, Room, RoomSettings};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn busy_room() -> Room {
    let settings = RoomSettings {
        bot_count: 3,
        ..Default::default()
    };
    let mut room = match Room::with_rng(settings, &["p1"], Box::new(StdRng::seed_from_u64(42))) {
        Ok(room) => room,
        Err(err) => panic!("bench room setup failed: {err}"),
    };
    room.set_moving("p1", Direction::Right);
    room
}

fn bench_mutate(c: &mut Criterion) {
    c.bench_function("room_mutate_300_ticks", |b| {
        b.iter_batched(
            busy_room,
            |mut room| {
                for tick in 0..300u64 {
                    room.mutate(black_box(tick * 33));
                }
                room
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut room = busy_room();
    for tick in 0..60u64 {
        room.mutate(tick * 33);
    }
    c.bench_function("room_snapshot_json", |b| b.iter(|| black_box(room.snapshot_json())));
}

criterion_group!(benches, bench_mutate, bench_snapshot);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::SmallRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use chancery::adjudicator::{convoy_is_possible, BuildsAdjudicator, MovesAdjudicator};
use chancery::board::{reachable_provinces, Board, Location, Order, Phase, PlayerOrder, UnitType};
use chancery::assign_orders;

fn standard() -> Board {
    Board::standard().unwrap()
}

fn with_moves(orders: &[(&str, &str)]) -> Board {
    let mut board = standard();
    let parsed: Vec<(&str, Order)> = orders
        .iter()
        .map(|&(at, to)| {
            let destination = board.location(to).unwrap();
            (at, Order::Move { destination })
        })
        .collect();
    assign_orders(&mut board, parsed).unwrap();
    board
}

fn bench_moves_22_holds(c: &mut Criterion) {
    let board = standard();
    c.bench_function("moves_22_holds", |b| {
        b.iter_batched(
            || board.clone(),
            |mut board| MovesAdjudicator::new(black_box(&mut board)).unwrap().run(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_moves_spring_opening(c: &mut Criterion) {
    let board = with_moves(&[
        ("vie", "gal"),
        ("bud", "ser"),
        ("tri", "alb"),
        ("lon", "nth"),
        ("edi", "nrg"),
        ("lvp", "yor"),
        ("bre", "mao"),
        ("par", "bur"),
        ("mar", "spa"),
        ("kie", "den"),
        ("ber", "kie"),
        ("mun", "ruh"),
        ("nap", "ion"),
        ("rom", "apu"),
        ("ven", "tyr"),
        ("stp", "bot"),
        ("mos", "ukr"),
        ("war", "gal"),
        ("sev", "bla"),
        ("ank", "bla"),
        ("con", "bul"),
        ("smy", "arm"),
    ]);
    c.bench_function("moves_22_spring_opening", |b| {
        b.iter_batched(
            || board.clone(),
            |mut board| MovesAdjudicator::new(black_box(&mut board)).unwrap().run(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_moves_random_orders(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let boards: Vec<Board> = (0..64)
        .map(|_| {
            let mut board = standard();
            let units: Vec<_> = board
                .live_units()
                .map(|u| (u.id, reachable_provinces(&board, u)))
                .collect();
            for (id, reach) in units {
                let order = match (rng.gen_range(0..3), reach.iter().choose(&mut rng)) {
                    (0, Some(&p)) => Order::Move {
                        destination: Location::Province(p),
                    },
                    (1, Some(&p)) => Order::Support {
                        source: Location::Province(p),
                        destination: Location::Province(p),
                    },
                    _ => Order::Hold,
                };
                board.set_order(id, order);
            }
            board
        })
        .collect();

    let mut group = c.benchmark_group("moves");
    group.sample_size(50);
    group.measurement_time(Duration::from_secs(5));
    group.bench_function("random_orders_x64", |b| {
        b.iter_batched(
            || boards.clone(),
            |mut boards| {
                for board in &mut boards {
                    black_box(MovesAdjudicator::new(board).unwrap().run());
                }
            },
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

fn bench_convoy_search(c: &mut Criterion) {
    let mut board = Board::empty_standard().unwrap();
    let england = board.player_by_name("England").unwrap();
    for at in ["nao", "mao", "wes", "tys", "ion", "eas"] {
        let loc = board.location(at).unwrap();
        board.place_unit(england, UnitType::Fleet, loc).unwrap();
    }
    let cly = board.location("cly").unwrap();
    let syr = board.location("syr").unwrap();
    board.place_unit(england, UnitType::Army, cly).unwrap();

    c.bench_function("convoy_search_cly_syr", |b| {
        b.iter(|| {
            convoy_is_possible(
                black_box(&board),
                black_box(cly.province()),
                black_box(syr.province()),
                false,
            )
        })
    });
}

fn bench_builds_all_powers(c: &mut Criterion) {
    let mut board = Board::empty_standard().unwrap();
    board.phase = Phase::WinterBuilds;
    for id in board.player_ids().collect::<Vec<_>>() {
        let homes: Vec<_> = board.player(id).centers.iter().copied().collect();
        for p in homes {
            let unit_type = if board.province(p).is_fleet_accessible() {
                UnitType::Fleet
            } else {
                UnitType::Army
            };
            let location = board
                .normalize_location(unit_type, Location::Province(p))
                .unwrap_or(Location::Province(p));
            board.player_mut(id).build_orders.push(PlayerOrder::Build {
                location,
                unit_type,
            });
        }
    }
    c.bench_function("builds_22_home_centers", |b| {
        b.iter_batched(
            || board.clone(),
            |mut board| BuildsAdjudicator::new(black_box(&mut board)).unwrap().run(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_moves_22_holds,
    bench_moves_spring_opening,
    bench_moves_random_orders,
    bench_convoy_search,
    bench_builds_all_powers,
);
criterion_main!(benches);

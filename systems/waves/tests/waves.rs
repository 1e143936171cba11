use std::time::Duration;

use castle_defence_core::{
    CellCoord, Command, EnemyCount, EnemyGroup, EnemyKind, Event, Gold, Grid, Wave, WaveIndex,
    CASTLE_WEIGHT, ROAD_WEIGHT, SPAWN_WEIGHT,
};
use castle_defence_system_waves::{Config, WaveScheduler};
use castle_defence_world::{self as world, query, World};

fn lane() -> (Grid, CellCoord) {
    let grid = Grid::from_rows(&[
        vec![SPAWN_WEIGHT, ROAD_WEIGHT, ROAD_WEIGHT, ROAD_WEIGHT, CASTLE_WEIGHT],
        vec![3, 3, 3, 3, 3],
    ])
    .expect("valid grid");
    (grid, CellCoord::new(4, 0))
}

fn group(kind: EnemyKind, count: u32, delay_secs: f32) -> EnemyGroup {
    EnemyGroup {
        enemies: vec![EnemyCount { kind, count }],
        delay_secs,
    }
}

fn tick(dt: Duration) -> [Event; 1] {
    [Event::TimeAdvanced { dt }]
}

fn spawned_kinds(commands: &[Command]) -> Vec<EnemyKind> {
    commands
        .iter()
        .filter_map(|command| match command {
            Command::SpawnEnemy { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

#[test]
fn groups_spawn_after_delays_with_carried_time() {
    let (grid, castle) = lane();
    let waves = vec![Wave {
        groups: vec![
            group(EnemyKind::Goblin, 2, 2.0),
            group(EnemyKind::Orc, 1, 0.0),
        ],
    }];
    let mut scheduler = WaveScheduler::new(Config::new(waves, Duration::from_secs(1), 7));
    let mut commands = Vec::new();

    scheduler.handle(&tick(Duration::from_millis(500)), &grid, castle, &mut commands);
    assert!(commands.is_empty(), "initial delay has not elapsed");
    assert_eq!(scheduler.current_wave(), None);

    scheduler.handle(&tick(Duration::from_millis(600)), &grid, castle, &mut commands);
    assert_eq!(
        commands.first(),
        Some(&Command::BeginWave {
            wave: WaveIndex::new(0)
        })
    );
    assert_eq!(
        spawned_kinds(&commands),
        vec![EnemyKind::Goblin, EnemyKind::Goblin]
    );
    assert_eq!(scheduler.countdown(), Duration::from_millis(1900));

    commands.clear();
    scheduler.handle(&tick(Duration::from_millis(1900)), &grid, castle, &mut commands);
    assert_eq!(spawned_kinds(&commands), vec![EnemyKind::Orc]);
    assert_eq!(commands.last(), Some(&Command::ConcludeWaves));
    assert!(scheduler.is_exhausted());

    commands.clear();
    scheduler.handle(&tick(Duration::from_secs(30)), &grid, castle, &mut commands);
    assert!(commands.is_empty(), "exhausted scheduler stays silent");
}

#[test]
fn coarse_and_fine_ticks_emit_identical_commands() {
    let (grid, castle) = lane();
    let waves = vec![
        Wave {
            groups: vec![
                group(EnemyKind::Wolf, 3, 1.5),
                group(EnemyKind::Goblin, 2, 2.5),
            ],
        },
        Wave {
            groups: vec![group(EnemyKind::Troll, 1, 0.0)],
        },
    ];
    let mut coarse = WaveScheduler::new(Config::new(waves.clone(), Duration::from_millis(300), 42));
    let mut fine = WaveScheduler::new(Config::new(waves, Duration::from_millis(300), 42));

    let mut coarse_commands = Vec::new();
    coarse.handle(&tick(Duration::from_secs(10)), &grid, castle, &mut coarse_commands);

    let mut fine_commands = Vec::new();
    for _ in 0..100 {
        fine.handle(&tick(Duration::from_millis(100)), &grid, castle, &mut fine_commands);
    }

    assert_eq!(coarse_commands, fine_commands);
    assert!(coarse.is_exhausted() && fine.is_exhausted());
    assert_eq!(coarse.current_wave(), Some(WaveIndex::new(1)));
}

#[test]
fn skip_request_spawns_pending_group_immediately() {
    let (grid, castle) = lane();
    let waves = vec![Wave {
        groups: vec![group(EnemyKind::Goblin, 1, 60.0), group(EnemyKind::Orc, 1, 0.0)],
    }];
    let mut scheduler = WaveScheduler::new(Config::new(waves, Duration::from_secs(60), 3));
    let mut commands = Vec::new();

    scheduler.request_skip();
    scheduler.handle(&[], &grid, castle, &mut commands);
    assert_eq!(spawned_kinds(&commands), vec![EnemyKind::Goblin]);
    assert_eq!(scheduler.countdown(), Duration::from_secs(60));

    commands.clear();
    scheduler.request_skip();
    scheduler.handle(&tick(Duration::from_millis(16)), &grid, castle, &mut commands);
    assert_eq!(spawned_kinds(&commands), vec![EnemyKind::Orc]);
    assert!(scheduler.is_exhausted());
}

#[test]
fn empty_waves_complete_immediately() {
    let (grid, castle) = lane();
    let waves = vec![
        Wave::default(),
        Wave {
            groups: vec![group(EnemyKind::Goblin, 0, 45.0)],
        },
        Wave {
            groups: vec![group(EnemyKind::Goblin, 1, 0.0)],
        },
    ];
    let mut scheduler = WaveScheduler::new(Config::new(waves, Duration::ZERO, 9));
    let mut commands = Vec::new();

    scheduler.handle(&tick(Duration::from_millis(16)), &grid, castle, &mut commands);

    let begun: Vec<_> = commands
        .iter()
        .filter_map(|command| match command {
            Command::BeginWave { wave } => Some(wave.get()),
            _ => None,
        })
        .collect();
    assert_eq!(begun, vec![0, 1, 2]);
    assert_eq!(spawned_kinds(&commands), vec![EnemyKind::Goblin]);
    assert!(scheduler.is_exhausted());
}

#[test]
fn spawned_enemies_enter_the_world_at_the_spawn_cell() {
    let (grid, castle) = lane();
    let waves = vec![Wave {
        groups: vec![group(EnemyKind::Goblin, 2, 0.0)],
    }];
    let mut scheduler = WaveScheduler::new(Config::new(waves, Duration::ZERO, 5));
    let mut world = World::new(grid.clone(), Gold::ZERO, 3);

    let mut commands = Vec::new();
    scheduler.handle(&tick(Duration::from_millis(16)), &grid, castle, &mut commands);

    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    let spawned: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { cell, .. } => Some(*cell),
            _ => None,
        })
        .collect();
    assert_eq!(spawned, vec![CellCoord::new(0, 0); 2]);
    assert_eq!(query::current_wave(&world), Some(WaveIndex::new(0)));
    assert!(query::waves_exhausted(&world));
    assert_eq!(query::enemy_count(&world), 2);
}

#[test]
fn unreachable_castle_yields_discarded_enemies() {
    let grid = Grid::from_rows(&[vec![SPAWN_WEIGHT, 0, CASTLE_WEIGHT]]).expect("valid grid");
    let castle = CellCoord::new(2, 0);
    let waves = vec![Wave {
        groups: vec![group(EnemyKind::Orc, 1, 0.0)],
    }];
    let mut scheduler = WaveScheduler::new(Config::new(waves, Duration::ZERO, 11));
    let mut world = World::new(grid.clone(), Gold::ZERO, 3);

    let mut commands = Vec::new();
    scheduler.handle(&tick(Duration::from_millis(16)), &grid, castle, &mut commands);
    let mut events = Vec::new();
    for command in commands {
        world::apply(&mut world, command, &mut events);
    }

    assert!(events.contains(&Event::EnemyDiscarded {
        kind: EnemyKind::Orc
    }));
    assert_eq!(query::enemy_count(&world), 0);
}

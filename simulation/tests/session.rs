use std::time::Duration;

use castle_defence_core::{
    CellCoord, ConfigError, EnemyCount, EnemyGroup, EnemyKind, EntityClass, Event, Gold, Grid,
    LevelConfig, Outcome, TowerError, TowerKind, Wave, CASTLE_WEIGHT, ROAD_WEIGHT, SPAWN_WEIGHT,
};
use castle_defence_simulation::{ClockState, Session, SessionConfig, SessionError};

const STEP: Duration = Duration::from_millis(100);

fn corridor() -> Grid {
    let mut road = vec![ROAD_WEIGHT; 10];
    road[0] = SPAWN_WEIGHT;
    road[9] = CASTLE_WEIGHT;
    Grid::from_rows(&[road, vec![3; 10]]).expect("valid grid")
}

fn level(gold: u32, lives: u32, goblins: u32) -> LevelConfig {
    LevelConfig {
        map: "corridor".to_owned(),
        starting_gold: Gold::new(gold),
        starting_lives: lives,
        initial_delay_secs: 0.0,
        waves: vec![Wave {
            groups: vec![EnemyGroup {
                enemies: vec![EnemyCount {
                    kind: EnemyKind::Goblin,
                    count: goblins,
                }],
                delay_secs: 0.0,
            }],
        }],
    }
}

fn started(grid: Grid, level: &LevelConfig, seed: u64) -> Session {
    let mut session = Session::new(grid, level, SessionConfig::new(seed)).expect("valid level");
    session.start().expect("fresh session starts");
    session
}

fn run_for(session: &mut Session, steps: u32) -> Vec<Event> {
    (0..=steps)
        .flat_map(|step| session.tick(STEP * step))
        .collect()
}

fn terminal_events(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::Victory { .. } | Event::Defeat { .. }))
        .count()
}

fn simulated_time(events: &[Event]) -> Duration {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TimeAdvanced { dt } => Some(*dt),
            _ => None,
        })
        .sum()
}

#[test]
fn goblins_reaching_the_castle_end_in_a_single_victory() {
    let mut session = started(corridor(), &level(1000, 10, 5), 17);

    let events = run_for(&mut session, 600);

    assert_eq!(terminal_events(&events), 1, "exactly one terminal event");
    assert_eq!(session.outcome(), Some(Outcome::Victory));
    assert_eq!(session.lives(), 5);
    let summary = session.summary();
    assert_eq!(summary.final_lives, 5);
    assert_eq!(summary.max_lives, 10);
    assert_eq!(summary.gold_spent, Gold::ZERO);
    assert_eq!(summary.stars(), 1);

    let later: Vec<_> = (601..700).flat_map(|step| session.tick(STEP * step)).collect();
    assert_eq!(terminal_events(&later), 0, "terminal events fire once");
    assert_eq!(session.lives(), 5);
}

#[test]
fn running_out_of_lives_ends_in_defeat() {
    let mut session = started(corridor(), &level(500, 2, 4), 3);

    let events = run_for(&mut session, 600);

    assert_eq!(terminal_events(&events), 1);
    assert_eq!(session.outcome(), Some(Outcome::Defeat));
    assert_eq!(session.lives(), 0);
    assert_eq!(
        session.build_tower(TowerKind::Archer, CellCoord::new(2, 1)),
        Err(TowerError::LevelConcluded)
    );
    assert_eq!(session.gold(), Gold::new(500));
}

#[test]
fn paused_time_contributes_nothing() {
    let mut paused = started(corridor(), &level(0, 3, 1), 21);
    let mut continuous = started(corridor(), &level(0, 3, 1), 21);

    let mut paused_events = paused.tick(Duration::ZERO);
    paused_events.extend(paused.tick(Duration::from_secs(1)));
    paused.pause().expect("running session pauses");
    assert!(paused.tick(Duration::from_secs(5)).is_empty());
    paused.resume().expect("paused session resumes");
    assert!(paused.tick(Duration::from_secs(6)).is_empty(), "first tick after resume records only");
    paused_events.extend(paused.tick(Duration::from_secs(7)));

    let mut continuous_events = continuous.tick(Duration::ZERO);
    continuous_events.extend(continuous.tick(Duration::from_secs(1)));
    continuous_events.extend(continuous.tick(Duration::from_secs(2)));

    assert_eq!(simulated_time(&paused_events), Duration::from_secs(2));
    assert_eq!(paused_events, continuous_events);
    assert_eq!(paused.snapshot().into_vec(), continuous.snapshot().into_vec());
}

#[test]
fn repeated_timestamps_do_no_work() {
    let mut session = started(corridor(), &level(0, 3, 1), 5);
    let _ = run_for(&mut session, 10);
    let before = session.snapshot().into_vec();

    for _ in 0..5 {
        assert!(session.tick(STEP * 10).is_empty());
    }

    assert_eq!(session.snapshot().into_vec(), before);
}

#[test]
fn speed_multiplier_scales_simulated_time() {
    let mut session = started(corridor(), &level(0, 3, 1), 5);
    session.set_speed(2.0);
    session.set_speed(0.0);
    session.set_speed(-4.0);
    session.set_speed(f32::NAN);

    let _ = session.tick(Duration::ZERO);
    let events = session.tick(Duration::from_millis(500));

    assert_eq!(simulated_time(&events), Duration::from_secs(1));
}

#[test]
fn clock_transitions_are_validated() {
    let mut session =
        Session::new(corridor(), &level(0, 3, 1), SessionConfig::default()).expect("valid level");
    assert_eq!(session.state(), ClockState::Ready);
    assert!(session.tick(Duration::from_secs(1)).is_empty(), "unstarted sessions ignore ticks");
    assert_eq!(session.resume(), Err(SessionError::NotPaused));

    session.start().expect("fresh session starts");
    assert_eq!(session.start(), Err(SessionError::AlreadyStarted));
    session.stop().expect("running session stops");

    assert_eq!(session.state(), ClockState::Stopped);
    assert_eq!(session.start(), Err(SessionError::Stopped));
    assert!(session.tick(Duration::from_secs(2)).is_empty());
    assert!(session.tick(Duration::from_secs(3)).is_empty());
}

#[test]
fn rejected_tower_actions_leave_the_economy_untouched() {
    let mut session = started(corridor(), &level(50, 3, 1), 1);

    assert_eq!(
        session.build_tower(TowerKind::Archer, CellCoord::new(4, 1)),
        Err(TowerError::InsufficientGold {
            required: Gold::new(70),
            available: Gold::new(50),
        })
    );
    assert_eq!(
        session.build_tower(TowerKind::Archer, CellCoord::new(4, 0)),
        Err(TowerError::Ineligible)
    );
    assert_eq!(session.upgrade_tower(CellCoord::new(4, 1)), Err(TowerError::NoTower));

    assert_eq!(session.gold(), Gold::new(50));
    assert_eq!(session.player().gold_spent(), Gold::ZERO);
    assert!(session.towers().is_empty());
}

#[test]
fn towers_can_be_built_upgraded_and_sold_between_ticks() {
    let mut session = started(corridor(), &level(300, 3, 1), 1);
    let cell = CellCoord::new(4, 1);

    let events = session
        .build_tower(TowerKind::Cannon, cell)
        .expect("affordable tower");
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::TowerBuilt { kind: TowerKind::Cannon, .. })));
    assert_eq!(session.gold(), Gold::new(180));

    let _ = session.upgrade_tower(cell).expect("affordable upgrade");
    assert_eq!(session.gold(), Gold::ZERO);
    assert_eq!(session.towers().first().map(|tower| tower.level), Some(2));

    let _ = session.sell_tower(cell).expect("tower present");
    assert_eq!(session.gold(), Gold::new(180));
    assert!(session.towers().is_empty());
    assert_eq!(session.player().gold_spent(), Gold::new(300));
}

#[test]
fn skipping_spawns_the_pending_group_early() {
    let mut level = level(0, 3, 2);
    level.initial_delay_secs = 120.0;
    let mut session = started(corridor(), &level, 8);

    let events = run_for(&mut session, 10);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemySpawned { .. })));
    assert_eq!(session.current_wave(), None);

    session.skip_wave();
    let events = session.tick(STEP * 11);

    let spawned = events
        .iter()
        .filter(|event| matches!(event, Event::EnemySpawned { .. }))
        .count();
    assert_eq!(spawned, 2);
    assert!(session.current_wave().is_some());
}

#[test]
fn defeated_enemies_drop_collectable_bounties() {
    let mut session = started(corridor(), &level(0, 3, 1), 2);
    let events = run_for(&mut session, 1);
    let enemy = events
        .iter()
        .find_map(|event| match event {
            Event::EnemySpawned { enemy, .. } => Some(*enemy),
            _ => None,
        })
        .expect("goblin spawned");

    session.damage_enemy(enemy, 1_000);
    let events = session.tick(STEP * 2);
    assert!(events.contains(&Event::EnemyDefeated {
        enemy,
        kind: EnemyKind::Goblin
    }));
    assert_eq!(terminal_events(&events), 1, "last enemy defeated after the final wave");

    let pickup = session
        .snapshot()
        .iter()
        .find(|snapshot| matches!(snapshot.class, EntityClass::Pickup { .. }))
        .map(|snapshot| snapshot.id);
    assert!(pickup.is_some(), "bounty pickup dropped");
    assert_eq!(session.outcome(), Some(Outcome::Victory));
    assert_eq!(session.summary().stars(), 3);
}

#[test]
fn identical_seeds_replay_identically() {
    let grid = Grid::from_rows(&[
        vec![SPAWN_WEIGHT, 4, 4, 4, 4, 4, SPAWN_WEIGHT],
        vec![4, 4, 4, 4, 4, 4, 4],
        vec![SPAWN_WEIGHT, 4, 4, CASTLE_WEIGHT, 4, 4, 4],
        vec![4, 4, 4, 4, 4, 4, 4],
        vec![4, 4, 4, SPAWN_WEIGHT, 4, 4, 4],
    ])
    .expect("valid grid");
    let level = LevelConfig {
        map: "crossroads".to_owned(),
        starting_gold: Gold::new(400),
        starting_lives: 20,
        initial_delay_secs: 0.5,
        waves: vec![
            Wave {
                groups: vec![EnemyGroup {
                    enemies: vec![
                        EnemyCount {
                            kind: EnemyKind::Wolf,
                            count: 3,
                        },
                        EnemyCount {
                            kind: EnemyKind::Orc,
                            count: 2,
                        },
                    ],
                    delay_secs: 1.5,
                }],
            },
            Wave {
                groups: vec![EnemyGroup {
                    enemies: vec![EnemyCount {
                        kind: EnemyKind::Troll,
                        count: 1,
                    }],
                    delay_secs: 0.0,
                }],
            },
        ],
    };

    let replay = || {
        let mut session = started(grid.clone(), &level, 0xfeed_beef);
        let mut events = run_for(&mut session, 20);
        events.extend(
            session
                .build_tower(TowerKind::Mage, CellCoord::new(1, 1))
                .expect("affordable tower"),
        );
        events.extend((21..400).flat_map(|step| session.tick(STEP * step)));
        (events, session.snapshot().into_vec(), session.summary())
    };

    let first = replay();
    let second = replay();

    assert_eq!(first.0, second.0);
    assert_eq!(first.1, second.1);
    assert_eq!(first.2, second.2);
}

#[test]
fn sessions_reject_unplayable_configuration() {
    let no_castle = Grid::from_rows(&[vec![SPAWN_WEIGHT, ROAD_WEIGHT, 3]]).expect("valid grid");
    assert_eq!(
        Session::new(no_castle, &level(0, 3, 1), SessionConfig::default()).err(),
        Some(ConfigError::MissingCastle)
    );

    let no_spawn = Grid::from_rows(&[vec![3, ROAD_WEIGHT, CASTLE_WEIGHT]]).expect("valid grid");
    assert_eq!(
        Session::new(no_spawn, &level(0, 3, 1), SessionConfig::default()).err(),
        Some(ConfigError::MissingSpawnPoint)
    );

    let mut empty = level(0, 3, 1);
    empty.waves.clear();
    assert_eq!(
        Session::new(corridor(), &empty, SessionConfig::default()).err(),
        Some(ConfigError::NoWaves)
    );

    let mut lifeless = level(0, 3, 1);
    lifeless.starting_lives = 0;
    assert_eq!(
        Session::new(corridor(), &lifeless, SessionConfig::default()).err(),
        Some(ConfigError::NoLives)
    );
}

//! End-to-end tests for the bootstrapped store: enablement, module
//! registration, play-through actions and the reactive read surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use number_place_store::number_place::{self, Action, Cell, Mutation, NumberPlace, NumberPlaceState};
use number_place_store::runtime::Runtime;
use number_place_store::{create_store, install, Module, Store, StoreError};

const PROBLEM: &str = r#"[
    [5,3,0,0,7,0,0,0,0],
    [6,0,0,1,9,5,0,0,0],
    [0,9,8,0,0,0,0,6,0],
    [8,0,0,0,6,0,0,0,3],
    [4,0,0,8,0,3,0,0,1],
    [7,0,0,0,2,0,0,0,6],
    [0,6,0,0,0,0,2,8,0],
    [0,0,0,4,1,9,0,0,5],
    [0,0,0,0,8,0,0,7,9]
]"#;

/// A second module type, for stores with more than one slice of state.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
struct ScoreState {
    points: u32,
}

#[derive(Debug)]
enum ScoreMutation {
    Award(u32),
}

#[derive(Debug, Default)]
struct Scoreboard;

impl Module for Scoreboard {
    type State = ScoreState;
    type Mutation = ScoreMutation;
    type Action = ();

    fn initial_state(&self) -> ScoreState {
        ScoreState::default()
    }

    fn mutate(&self, state: &mut ScoreState, mutation: ScoreMutation) {
        match mutation {
            ScoreMutation::Award(points) => state.points += points,
        }
    }
}

#[test]
fn bootstrap_registers_the_game_module() {
    let store = create_store().unwrap();

    assert!(store.contains(number_place::KEY));
    assert_eq!(store.module_keys(), vec![number_place::KEY.to_string()]);
    assert_eq!(store.len(), 1);
    assert!(!store.is_empty());
}

#[test]
fn enablement_happens_at_most_once() {
    install();
    assert!(!install());

    // Bootstrapping twice is fine; each call returns its own store.
    let first = create_store().unwrap();
    let second = create_store().unwrap();
    assert!(first.contains(number_place::KEY));
    assert!(second.contains(number_place::KEY));
}

#[test]
fn a_fresh_store_snapshots_to_the_default_state() {
    let store = create_store().unwrap();

    let tree = store.snapshot().unwrap();
    let expected = serde_json::to_value(NumberPlaceState::default()).unwrap();
    assert_eq!(tree[number_place::KEY], expected);

    let game = store.module::<NumberPlace>(number_place::KEY).unwrap();
    assert_eq!(game.get(), NumberPlaceState::default());
}

#[test]
fn stores_do_not_share_state() {
    let first = create_store().unwrap();
    let second = create_store().unwrap();

    let game = first.module::<NumberPlace>(number_place::KEY).unwrap();
    game.commit(Mutation::Select(Cell::new(4, 4)));
    game.commit(Mutation::Enter(7));

    let other = second.module::<NumberPlace>(number_place::KEY).unwrap();
    assert_eq!(other.get(), NumberPlaceState::default());
}

#[test]
fn duplicate_module_keys_fail_the_builder() {
    let err = Store::builder()
        .module(number_place::KEY, NumberPlace::default())
        .unwrap()
        .module(number_place::KEY, NumberPlace::default())
        .unwrap_err();

    assert!(matches!(err, StoreError::DuplicateModule(key) if key == number_place::KEY));
}

#[test]
fn lookups_check_both_key_and_type() {
    let store = create_store().unwrap();

    let missing = store.module::<NumberPlace>("scoreboard").unwrap_err();
    assert!(matches!(missing, StoreError::UnknownModule(key) if key == "scoreboard"));

    let mismatched = store.module::<Scoreboard>(number_place::KEY).unwrap_err();
    assert!(matches!(mismatched, StoreError::ModuleShape { key, .. } if key == number_place::KEY));
}

#[test]
fn new_games_load_from_the_wire_format() {
    let store = create_store().unwrap();
    let game = store.module::<NumberPlace>(number_place::KEY).unwrap();

    game.dispatch(Action::NewGameFromJson(PROBLEM.to_string()))
        .unwrap();

    let state = game.get();
    assert_eq!(state.remaining(), 51);
    assert_eq!(state.open_cells(), 51);
    assert!(state.is_given(Cell::new(0, 0)));
    assert_eq!(state.selected, None);
    assert_eq!(state.problem_index, 1);
}

#[test]
fn malformed_problems_fail_the_dispatch() {
    let store = create_store().unwrap();
    let game = store.module::<NumberPlace>(number_place::KEY).unwrap();

    let err = game
        .dispatch(Action::NewGameFromJson("[[1,2,3]]".to_string()))
        .unwrap_err();
    match err {
        StoreError::Action { module, source } => {
            assert_eq!(module, number_place::KEY);
            assert!(source.to_string().contains("9 rows"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Nothing was committed.
    assert_eq!(game.get(), NumberPlaceState::default());
}

#[test]
fn placements_go_through_select_and_enter() {
    let store = create_store().unwrap();
    let game = store.module::<NumberPlace>(number_place::KEY).unwrap();
    game.dispatch(Action::NewGameFromJson(PROBLEM.to_string()))
        .unwrap();

    let commits = Arc::new(AtomicUsize::new(0));
    let bump = Arc::clone(&commits);
    store.subscribe(move |_| {
        bump.fetch_add(1, Ordering::SeqCst);
    });

    let cell = Cell::new(0, 2);
    game.dispatch(Action::Place { cell, digit: 4 }).unwrap();

    assert_eq!(game.read(|s| s.digit(cell)), 4);
    assert_eq!(game.read(|s| s.selected), Some(cell));
    assert_eq!(commits.load(Ordering::SeqCst), 2);
}

#[test]
fn clue_cells_refuse_placement() {
    let store = create_store().unwrap();
    let game = store.module::<NumberPlace>(number_place::KEY).unwrap();
    game.dispatch(Action::NewGameFromJson(PROBLEM.to_string()))
        .unwrap();

    let commits = Arc::new(AtomicUsize::new(0));
    let bump = Arc::clone(&commits);
    store.subscribe(move |_| {
        bump.fetch_add(1, Ordering::SeqCst);
    });

    // (0, 0) holds the clue 5; the placement is dropped whole.
    game.dispatch(Action::Place {
        cell: Cell::new(0, 0),
        digit: 9,
    })
    .unwrap();

    assert_eq!(commits.load(Ordering::SeqCst), 0);
    assert_eq!(game.read(|s| s.digit(Cell::new(0, 0))), 5);
    assert_eq!(game.read(|s| s.selected), None);
}

#[test]
fn restart_returns_to_the_clues() {
    let store = create_store().unwrap();
    let game = store.module::<NumberPlace>(number_place::KEY).unwrap();
    game.dispatch(Action::NewGameFromJson(PROBLEM.to_string()))
        .unwrap();

    game.dispatch(Action::Place {
        cell: Cell::new(0, 2),
        digit: 4,
    })
    .unwrap();
    game.dispatch(Action::Place {
        cell: Cell::new(0, 3),
        digit: 6,
    })
    .unwrap();
    assert_eq!(game.read(|s| s.remaining()), 49);

    game.dispatch(Action::Restart).unwrap();
    assert_eq!(game.read(|s| s.remaining()), 51);
    assert_eq!(game.read(|s| s.problem_index), 1);
}

#[test]
fn derived_values_track_only_their_inputs() {
    Runtime::scope(|| {
        let store = Store::builder()
            .module(number_place::KEY, NumberPlace::default())
            .unwrap()
            .module("scoreboard", Scoreboard)
            .unwrap()
            .build();

        let game = store.module::<NumberPlace>(number_place::KEY).unwrap();
        let scoreboard = store.module::<Scoreboard>("scoreboard").unwrap();

        let computes = Arc::new(AtomicUsize::new(0));
        let bump = Arc::clone(&computes);
        let remaining = game.derived(move |state| {
            bump.fetch_add(1, Ordering::SeqCst);
            state.remaining()
        });

        assert_eq!(remaining.get(), 81);
        remaining.get();
        assert_eq!(computes.load(Ordering::SeqCst), 1);

        // Commits elsewhere leave the cache warm.
        scoreboard.commit(ScoreMutation::Award(10));
        remaining.get();
        assert_eq!(computes.load(Ordering::SeqCst), 1);

        game.commit(Mutation::Select(Cell::new(1, 2)));
        game.commit(Mutation::Enter(3));
        assert_eq!(remaining.get(), 80);
        assert_eq!(computes.load(Ordering::SeqCst), 2);
    });
}

#[test]
fn watchers_stop_when_their_subscription_drops() {
    Runtime::scope(|| {
        let store = create_store().unwrap();
        let game = store.module::<NumberPlace>(number_place::KEY).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = game.watch(move |state| sink.lock().unwrap().push(state.remaining()));
        assert_eq!(*seen.lock().unwrap(), vec![81]);

        game.commit(Mutation::Select(Cell::new(0, 0)));
        game.commit(Mutation::Enter(2));
        assert_eq!(*seen.lock().unwrap(), vec![81, 81, 80]);

        drop(sub);
        game.commit(Mutation::Enter(0));
        assert_eq!(*seen.lock().unwrap(), vec![81, 81, 80]);
    });
}

#[test]
fn subscribers_see_module_and_mutation() {
    let store = create_store().unwrap();
    let game = store.module::<NumberPlace>(number_place::KEY).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |event| {
        sink.lock()
            .unwrap()
            .push((event.module.clone(), event.mutation.clone()));
    });

    game.commit(Mutation::Select(Cell::new(2, 2)));
    game.commit(Mutation::Enter(8));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].0, number_place::KEY);
    assert!(seen[0].1.contains("Select"));
    assert!(seen[1].1.contains("Enter(8)"));
}

#[test]
fn stores_built_in_a_scope_keep_working_after_it() {
    let store = Runtime::scope(create_store).unwrap();
    let game = store.module::<NumberPlace>(number_place::KEY).unwrap();

    // The store stays bound to the runtime it was built on.
    let remaining = game.derived(|state| state.remaining());
    assert_eq!(remaining.get(), 81);

    game.commit(Mutation::Select(Cell::new(7, 7)));
    game.commit(Mutation::Enter(1));
    assert_eq!(remaining.get(), 80);
}

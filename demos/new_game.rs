//! Bootstrap the store, load a problem and play a few moves.
//!
//! Run with logging to watch the commits flow:
//!
//! ```text
//! RUST_LOG=debug cargo run --example new_game
//! ```

use number_place_store::create_store;
use number_place_store::number_place::{self, Action, Cell, NumberPlace};
use tracing_subscriber::EnvFilter;

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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== Number Place store ===\n");

    let store = create_store()?;
    let game = store.module::<NumberPlace>(number_place::KEY)?;

    store.subscribe(|event| {
        println!("   [commit] {}: {}", event.module, event.mutation);
    });

    let remaining = game.derived(|state| state.remaining());

    println!("Loading a problem...");
    game.dispatch(Action::NewGameFromJson(PROBLEM.to_string()))?;
    println!("Open cells: {}\n", remaining.get());

    println!("Playing a few moves...");
    game.dispatch(Action::Place {
        cell: Cell::new(0, 2),
        digit: 4,
    })?;
    game.dispatch(Action::Place {
        cell: Cell::new(0, 3),
        digit: 6,
    })?;

    // A clue cell; the store refuses this one.
    game.dispatch(Action::Place {
        cell: Cell::new(0, 0),
        digit: 9,
    })?;
    println!("Open cells now: {}\n", remaining.get());

    println!("Starting over...");
    game.dispatch(Action::Restart)?;
    println!("Open cells after restart: {}\n", remaining.get());

    println!("Final state tree:");
    println!("{}", serde_json::to_string_pretty(&store.snapshot()?)?);
    Ok(())
}

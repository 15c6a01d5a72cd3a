//! Watchers and derived values reacting to commits.

use number_place_store::create_store;
use number_place_store::number_place::{self, Cell, Mutation, NumberPlace};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Watching the board ===\n");

    let store = create_store()?;
    let game = store.module::<NumberPlace>(number_place::KEY)?;

    let selection = game.watch(|state| match state.selected {
        Some(cell) => println!("   [watch] cursor at row {}, col {}", cell.row, cell.col),
        None => println!("   [watch] no cell selected"),
    });

    let filled = game.derived(|state| 81 - state.remaining());

    println!("Entering digits...");
    game.commit(Mutation::Select(Cell::new(0, 0)));
    game.commit(Mutation::Enter(5));
    game.commit(Mutation::Select(Cell::new(4, 4)));
    game.commit(Mutation::Enter(7));
    println!("Cells filled: {}\n", filled.get());

    println!("Detaching the watcher; further commits are quiet.");
    drop(selection);
    game.commit(Mutation::Select(Cell::new(8, 8)));
    game.commit(Mutation::Enter(2));
    println!("Cells filled: {}", filled.get());

    Ok(())
}

//! Commute assignment over a finalized tile tree.
//!
//! Housing and workplace tiles are expanded into one address per density
//! unit, then paired off at random; every housing unit that finds no
//! workplace becomes a non-working agent (children, retirees, and so on).
//! Using real commute flows instead of random pairing would slot in here.

use mapgen_core::MapRng;
use mapgen_quadtree::{Address, Quadtree};

use crate::{for_each_tile, CellData};

/// Receiver for generated agents — implemented by the external state store.
pub trait CommuteSink {
    /// Add one agent living at `home`, optionally working at `work`.
    fn add_agent(&mut self, home: Address, work: Option<Address>);
}

/// Pair housing and workplace tiles into commuting agents.
///
/// Deterministic for a given tree and RNG state; draw order is fixed by
/// the tile walk (address order) and the pairing loop.
pub fn assign_commutes<E, S: CommuteSink>(
    tree: &mut Quadtree<CellData<E>>,
    rng: &mut MapRng,
    sink: &mut S,
) {
    let mut housing: Vec<Address> = Vec::new();
    let mut workplaces: Vec<Address> = Vec::new();

    for_each_tile(tree, &mut |address, tile| {
        let density = tile.field_u64("density").unwrap_or(0);
        match tile.kind.as_str() {
            "HousingTile" => {
                housing.extend(std::iter::repeat_n(address, density as usize));
            }
            "WorkplaceTile" => {
                workplaces.extend(std::iter::repeat_n(address, density as usize));
            }
            _ => {}
        }
    });

    let workers = housing.len().min(workplaces.len());
    log::info!(
        "assigning commutes: {} housing units, {} workplaces, {} workers",
        housing.len(),
        workplaces.len(),
        workers
    );

    for _ in 0..workers {
        let home = housing.swap_remove(rng.pick(housing.len()));
        let work = workplaces.swap_remove(rng.pick(workplaces.len()));
        sink.add_agent(home, Some(work));
    }

    // leftover housing: agents without jobs
    for home in housing {
        sink.add_agent(home, None);
    }
}

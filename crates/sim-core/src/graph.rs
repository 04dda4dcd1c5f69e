//! The fixed world map: four cities on a 2x2 grid joined along its edges.

use crate::{City, CityId, Road};

pub const RUST_TOWN: &str = "rust_town";
pub const METAL_HILL: &str = "metal_hill";
pub const DUSTY_OASIS: &str = "dusty_oasis";
pub const BOTTLE_CAP_CANYON: &str = "bottle_cap_canyon";

fn city(id: &str, name: &str, neighbors: [&str; 2], x: i32, y: i32) -> City {
    City {
        id: CityId::from(id),
        name: name.to_string(),
        neighbors: neighbors.into_iter().map(CityId::from).collect(),
        x,
        y,
    }
}

fn road(from: &str, to: &str, risk: f32) -> Road {
    Road {
        from: CityId::from(from),
        to: CityId::from(to),
        length: 1,
        risk,
    }
}

/// Build the city list and road list for a new game.
///
/// Pure and deterministic; the first city is the starting city.
pub fn world_graph() -> (Vec<City>, Vec<Road>) {
    let cities = vec![
        city(RUST_TOWN, "Rust Town", [METAL_HILL, DUSTY_OASIS], 0, 0),
        city(METAL_HILL, "Metal Hill", [RUST_TOWN, BOTTLE_CAP_CANYON], 1, 0),
        city(DUSTY_OASIS, "Dusty Oasis", [RUST_TOWN, BOTTLE_CAP_CANYON], 0, 1),
        city(
            BOTTLE_CAP_CANYON,
            "Bottle Cap Canyon",
            [METAL_HILL, DUSTY_OASIS],
            1,
            1,
        ),
    ];
    let roads = vec![
        // horizontal
        road(RUST_TOWN, METAL_HILL, 0.3),
        road(DUSTY_OASIS, BOTTLE_CAP_CANYON, 0.4),
        // vertical
        road(RUST_TOWN, DUSTY_OASIS, 0.3),
        road(METAL_HILL, BOTTLE_CAP_CANYON, 0.3),
    ];
    (cities, roads)
}

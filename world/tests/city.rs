use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skyline_core::{FootprintPart, Heading, TileCoord};
use skyline_world::{
    query, Block, BlockCatalog, BlockFamily, BlockTemplate, City, Layout, LayoutError,
    LoadSettings, Placement, RemovalError, StackEntry, UNREACHABLE,
};

const OPEN_LOTS: &str = "
    ######
    ######
    ######
    ######
    ######
";

fn city_from(text: &str) -> City {
    let layout = Layout::parse(text).expect("layout parses");
    let settings = LoadSettings {
        special_height: 0,
        building_presets: Vec::new(),
        ..LoadSettings::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    City::load(&layout, &settings, &BlockCatalog::standard(), &mut rng).expect("city loads")
}

fn block_with(parts: Vec<FootprintPart>) -> Block {
    let template = BlockTemplate::new(BlockFamily::Skybridge, 0, parts).expect("template");
    Block::new(Arc::new(template))
}

fn single() -> Block {
    block_with(vec![FootprintPart::ANCHOR])
}

fn stacks(city: &City) -> Vec<Vec<StackEntry>> {
    query::tiles(city)
        .map(|tile| city.tile(tile.coord()).and_then(|t| t.stack()).unwrap_or(&[]).to_vec())
        .collect()
}

#[test]
fn single_block_stacks_only_on_top() {
    let mut city = city_from(OPEN_LOTS);
    let anchor = TileCoord::new(2, 3);

    assert!(city.valid_drop_spot(anchor, 0, &single()));
    let _ = city.add(anchor, single());

    assert!(
        !city.valid_drop_spot(anchor, 0, &single()),
        "altitude 0 is occupied once the tile is one high"
    );
    assert!(city.valid_drop_spot(anchor, 1, &single()));
    let _ = city.add(anchor, single());
    assert_eq!(city.stack_height(anchor), Some(2));
}

#[test]
fn two_part_block_needs_level_neighbours() {
    let mut city = city_from(OPEN_LOTS);
    let bridge = || block_with(vec![FootprintPart::ANCHOR, FootprintPart::new(-1, 0, 0)]);
    let anchor = TileCoord::new(3, 1);
    let left = TileCoord::new(2, 1);

    let _ = city.add(left, single());
    assert!(!city.valid_drop_spot(anchor, 0, &bridge()));
    assert!(!city.valid_drop_spot(anchor, 1, &bridge()));

    let _ = city.add(anchor, single());
    assert!(city.valid_drop_spot(anchor, 1, &bridge()));
}

#[test]
fn footprint_hanging_off_the_grid_is_invalid() {
    let city = city_from(OPEN_LOTS);
    let bridge = block_with(vec![FootprintPart::ANCHOR, FootprintPart::new(-1, 0, 0)]);
    assert!(!city.valid_drop_spot(TileCoord::new(0, 0), 0, &bridge));
    assert!(!city.valid_drop_spot(TileCoord::new(9, 9), 0, &single()));
}

#[test]
fn roads_never_accept_blocks() {
    let city = city_from("#-#\n#|#");
    assert!(!city.valid_drop_spot(TileCoord::new(1, 0), 0, &single()));
    assert!(!city.valid_drop_spot(TileCoord::new(1, 1), 0, &single()));
    let bridge = block_with(vec![FootprintPart::ANCHOR, FootprintPart::new(-1, 0, 0)]);
    assert!(!city.valid_drop_spot(TileCoord::new(2, 0), 0, &bridge));
}

#[test]
fn remove_after_add_restores_every_stack() {
    let mut city = city_from(OPEN_LOTS);
    let _ = city.add(TileCoord::new(1, 1), single());
    let ramp = block_with(vec![FootprintPart::ANCHOR, FootprintPart::new(-1, 0, 1)]);
    let anchor = TileCoord::new(2, 1);
    assert!(city.valid_drop_spot(anchor, 0, &ramp));

    let before = stacks(&city);
    let id = city.add(anchor, ramp);
    assert_ne!(before, stacks(&city));

    let lifted = city.remove(id).expect("topmost everywhere");
    assert_eq!(lifted.placement(), Placement::Unplaced);
    assert_eq!(before, stacks(&city));
}

#[test]
fn buried_multi_cell_block_is_not_removed() {
    let mut city = city_from(OPEN_LOTS);
    let bridge = block_with(vec![FootprintPart::ANCHOR, FootprintPart::new(0, -1, 0)]);
    let anchor = TileCoord::new(4, 2);
    let id = city.add(anchor, bridge);

    // Stack on the far cell only.
    let far = TileCoord::new(4, 1);
    let _ = city.add(far, single());
    let before = stacks(&city);

    assert_eq!(
        city.remove(id).map(|_| ()),
        Err(RemovalError::Buried {
            block: id,
            tile: far
        })
    );
    assert_eq!(before, stacks(&city), "failed removal must not mutate");
    assert!(city.block(id).is_some_and(Block::is_placed));
}

#[test]
fn stacks_stay_contiguous_through_adds_and_removes() {
    let mut city = city_from(OPEN_LOTS);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let catalog = BlockCatalog::standard();
    let mut placed = Vec::new();

    for step in 0..400_u32 {
        let column = (step * 7 % 6) as i32;
        let row = (step * 3 % 5) as i32;
        let anchor = TileCoord::new(column, row);
        if step % 3 == 2 {
            if let Some(id) = placed.pop() {
                if city.remove(id).is_err() {
                    placed.insert(0, id);
                }
            }
            continue;
        }

        let block = catalog.draw(&mut rng).expect("pool is populated");
        let Some(height) = city.stack_height(anchor) else {
            continue;
        };
        if city.valid_drop_spot(anchor, height, &block) {
            placed.push(city.add(anchor, block));
        }
    }

    for tile in query::tiles(&city) {
        let levels: Vec<_> = tile.levels().collect();
        for (altitude, level) in levels.iter().enumerate() {
            let Placement::Placed {
                anchor,
                base_altitude,
            } = level.block.placement()
            else {
                panic!("stacked block must be placed");
            };
            let part = level.block.template().parts()[level.entry.part()];
            assert_eq!(part.tile_from(anchor), tile.coord());
            assert_eq!(part.altitude_from(base_altitude), Some(altitude as u32));
        }
    }
}

#[test]
fn seeding_consumes_each_preset_once() {
    let text = "################\n".repeat(16);
    let layout = Layout::parse(&text).expect("layout parses");
    let settings = LoadSettings {
        max_height: 5,
        special_height: 0,
        building_presets: vec![5, 4, 3],
        ..LoadSettings::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let city = City::load(&layout, &settings, &BlockCatalog::standard(), &mut rng)
        .expect("city loads");

    let mut heights: Vec<u32> = query::tiles(&city)
        .filter_map(|tile| city.stack_height(tile.coord()))
        .filter(|height| *height > 0)
        .collect();
    heights.sort_unstable();
    // Row 12 always seeds, so every preset is used.
    assert_eq!(heights, vec![3, 4, 5]);
    assert_eq!(city.score(), 0);
}

#[test]
fn seeding_is_reproducible_for_a_seed() {
    let text = "*##-#\n#####\n##|##\n".repeat(5);
    let layout = Layout::parse(&text).expect("layout parses");
    let settings = LoadSettings::default();
    let catalog = BlockCatalog::standard();
    let load = |seed| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let city = City::load(&layout, &settings, &catalog, &mut rng).expect("city loads");
        query::tiles(&city)
            .map(|tile| {
                tile.levels()
                    .map(|level| level.block.template().variant())
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(load(4), load(4));
}

#[test]
fn presets_above_maximum_are_rejected() {
    let layout = Layout::parse("##").expect("layout parses");
    let settings = LoadSettings {
        max_height: 3,
        special_height: 1,
        building_presets: vec![2, 4],
        ..LoadSettings::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let result = City::load(&layout, &settings, &BlockCatalog::standard(), &mut rng);
    assert!(matches!(
        result,
        Err(LayoutError::HeightAboveMaximum {
            height: 4,
            max_height: 3
        })
    ));
}

#[test]
fn seeding_needs_a_palette() {
    let layout = Layout::parse("*").expect("layout parses");
    let settings = LoadSettings {
        special_height: 2,
        ..LoadSettings::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let result = City::load(&layout, &settings, &BlockCatalog::default(), &mut rng);
    assert!(matches!(
        result,
        Err(LayoutError::EmptyPalette(skyline_core::TileKind::Special))
    ));
}

#[test]
fn navigation_headings_walk_down_to_goals() {
    let city = city_from(
        "
        ..#.....
        ..#.##..
        ..#..#*.
        .....#..
        ###.....
        *.#..#..
        ",
    );
    let field = city.navigation();

    for row in 0..city.rows() as i32 {
        for column in 0..city.columns() as i32 {
            let start = TileCoord::new(column, row);
            let distance = field.distance(start).expect("inside field");
            if distance == UNREACHABLE {
                assert_eq!(field.heading(start), Some(Heading::Hold));
                continue;
            }

            let mut cell = start;
            let mut steps = 0_u16;
            while field.distance(cell) != Some(0) {
                cell = query::heading_at(&city, cell).step(cell);
                steps += 1;
                assert!(steps <= distance, "walk from {start:?} overshot");
            }
            assert_eq!(steps, distance, "walk from {start:?}");
        }
    }
}

#[test]
fn navigation_ignores_blocks_stacked_during_play() {
    let mut city = city_from("..*\n...\n##.");
    let before = city.navigation().clone();
    let _ = city.add(TileCoord::new(2, 0), single());
    assert_eq!(&before, city.navigation());
    assert_eq!(city.navigation().distance(TileCoord::new(0, 2)), Some(UNREACHABLE));
}

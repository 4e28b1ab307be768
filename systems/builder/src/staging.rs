//! Staging area holding fresh blocks outside the city grid.

use glam::Vec2;
use rand::Rng;
use skyline_world::{Block, BlockCatalog};

/// Screen geometry of the staging shelf.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StagingLayout {
    /// Upper-left corner of the shelf before camera scrolling.
    pub origin: Vec2,
    /// Size of a single slot.
    pub slot_size: Vec2,
    /// Inner padding between the shelf edge and the first slot.
    pub border: f32,
    /// Number of slots on the shelf.
    pub slots: usize,
}

impl Default for StagingLayout {
    fn default() -> Self {
        Self {
            origin: Vec2::new(56.0, 35.0),
            slot_size: Vec2::new(32.0, 32.0),
            border: 2.0,
            slots: 4,
        }
    }
}

/// Shelf of unplaced blocks the player can pick from.
///
/// A block taken from the shelf leaves its slot reserved until it is either
/// placed in the city, which frees the slot for a fresh block, or returned.
#[derive(Clone, Debug)]
pub struct StagingArea {
    layout: StagingLayout,
    slots: Vec<Option<Block>>,
    carried: Option<usize>,
    camera_altitude: f32,
}

impl StagingArea {
    /// Creates an empty shelf.
    #[must_use]
    pub fn new(layout: StagingLayout) -> Self {
        Self {
            layout,
            slots: vec![None; layout.slots],
            carried: None,
            camera_altitude: 0.0,
        }
    }

    /// Fills every free slot that is not reserved by a carried block.
    pub fn refill<R: Rng + ?Sized>(&mut self, catalog: &BlockCatalog, rng: &mut R) {
        for (slot, block) in self.slots.iter_mut().enumerate() {
            if block.is_none() && self.carried != Some(slot) {
                *block = catalog.draw(rng);
            }
        }
    }

    /// Puts a block into a slot, handing back whatever was there.
    pub fn insert(&mut self, slot: usize, block: Block) -> Option<Block> {
        self.slots.get_mut(slot).and_then(|entry| entry.replace(block))
    }

    /// Scrolls the shelf with the camera so it stays fixed on screen.
    pub fn set_camera_altitude(&mut self, camera_altitude: f32) {
        self.camera_altitude = camera_altitude;
    }

    /// Geometry of the shelf.
    #[must_use]
    pub const fn layout(&self) -> &StagingLayout {
        &self.layout
    }

    /// Upper-left corner of a slot in city screen space.
    #[must_use]
    pub fn slot_origin(&self, slot: usize) -> Vec2 {
        Vec2::new(
            self.layout.origin.x + self.layout.border + self.layout.slot_size.x * slot as f32,
            self.layout.origin.y + self.layout.border - self.camera_altitude,
        )
    }

    /// Centre of a slot; spatial queries measure distances from here.
    #[must_use]
    pub fn slot_center(&self, slot: usize) -> Vec2 {
        self.slot_origin(slot) + self.layout.slot_size / 2.0
    }

    /// Occupied slots in index order.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, &Block)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, block)| block.as_ref().map(|block| (slot, block)))
    }

    /// Slot the carried block was taken from, if it came from the shelf.
    #[must_use]
    pub const fn carried_slot(&self) -> Option<usize> {
        self.carried
    }

    /// Takes the block in `slot`, reserving the slot until it is placed or returned.
    pub fn take(&mut self, slot: usize) -> Option<Block> {
        if self.carried.is_some() {
            return None;
        }
        let block = self.slots.get_mut(slot)?.take()?;
        self.carried = Some(slot);
        Some(block)
    }

    /// Releases the reservation after the carried block was placed in the city.
    pub fn placed(&mut self) {
        self.carried = None;
    }

    /// Puts the carried block back into its reserved slot.
    ///
    /// Hands the block back when no slot is reserved.
    pub fn return_block(&mut self, block: Block) -> Result<(), Block> {
        match self.carried.take() {
            Some(slot) => {
                let _ = self.insert(slot, block);
                Ok(())
            }
            None => Err(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn stocked() -> StagingArea {
        let mut staging = StagingArea::new(StagingLayout::default());
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        staging.refill(&BlockCatalog::standard(), &mut rng);
        staging
    }

    #[test]
    fn refill_fills_every_slot() {
        let staging = stocked();
        assert_eq!(staging.blocks().count(), 4);
    }

    #[test]
    fn slots_follow_camera() {
        let mut staging = stocked();
        assert_eq!(staging.slot_center(1), Vec2::new(56.0 + 2.0 + 32.0 + 16.0, 35.0 + 2.0 + 16.0));
        staging.set_camera_altitude(10.0);
        assert_eq!(staging.slot_origin(0), Vec2::new(58.0, 27.0));
    }

    #[test]
    fn carried_slot_is_not_refilled_until_placed() {
        let mut staging = stocked();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let catalog = BlockCatalog::standard();

        let _block = staging.take(2).expect("slot is stocked");
        assert_eq!(staging.carried_slot(), Some(2));
        assert!(staging.take(1).is_none(), "only one block can be carried");

        staging.refill(&catalog, &mut rng);
        assert_eq!(staging.blocks().count(), 3);

        staging.placed();
        staging.refill(&catalog, &mut rng);
        assert_eq!(staging.blocks().count(), 4);
    }

    #[test]
    fn returned_block_goes_back_to_its_slot() {
        let mut staging = stocked();
        let block = staging.take(0).expect("slot is stocked");
        let template = std::sync::Arc::clone(block.template());

        assert!(staging.return_block(block).is_ok());
        assert_eq!(staging.carried_slot(), None);
        let (slot, restored) = staging.blocks().next().expect("slot 0 restocked");
        assert_eq!(slot, 0);
        assert!(std::sync::Arc::ptr_eq(restored.template(), &template));
    }

    #[test]
    fn return_without_reservation_hands_block_back() {
        let mut staging = stocked();
        let block = staging.insert(3, stocked().take(0).expect("stocked")).expect("replaced");
        assert!(staging.return_block(block).is_err());
    }
}

use ndarray::Array2;

use super::*;

/// Purely random generation: uniform rejection sampling of mine positions.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use rand::prelude::*;

        let (width, height) = config.size;
        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());
        if width == 0 || height == 0 {
            return MineLayout::from_mine_mask(mines);
        }

        let target = config.placeable_mines();
        if target < config.mines {
            log::warn!(
                "Minefield too small, requested {} mines but only {} fit",
                config.mines,
                target
            );
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut placed = 0;
        while placed < target {
            let x = rng.random_range(0..width);
            let y = rng.random_range(0..height);
            let tile = &mut mines[(x, y).to_nd_index()];
            if *tile {
                continue;
            }
            *tile = true;
            placed += 1;
        }

        MineLayout::from_mine_mask(mines)
    }
}

use super::meshgen::RenderMeshSet;
use log::{info, warn};
use std::ops::Range;
use wad::{AnimationMetadata, FlatSet};

/// Seconds each frame of an animated flat stays on screen: 8 tics at 35Hz.
pub const FLAT_FRAME_TIME: f32 = 8.0 / 35.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct FlatRange {
    first: i32,
    last: i32,
}

impl FlatRange {
    fn contains(&self, texture: i32) -> bool {
        texture >= self.first && texture <= self.last
    }

    fn advance(&self, texture: i32, frames: u32) -> i32 {
        let len = (self.last - self.first + 1) as u32;
        let offset = (texture - self.first) as u32;
        self.first + ((offset + frames % len) % len) as i32
    }
}

#[derive(Clone, Debug)]
struct AnimatedPoly {
    mesh: usize,
    vertices: Range<usize>,
    range: usize,
}

/// Cycles the texture indices of floors and ceilings whose flat is part of an animation.
#[derive(Debug)]
pub struct FlatAnimator {
    ranges: Vec<FlatRange>,
    polys: Vec<AnimatedPoly>,
    elapsed: f32,
}

impl FlatAnimator {
    /// Resolves the animated ranges against `flats` and registers every floor and ceiling in
    /// `meshes` drawn with one of their frames.
    pub fn new(
        animations: &AnimationMetadata,
        flats: &FlatSet,
        meshes: &RenderMeshSet,
    ) -> FlatAnimator {
        let ranges: Vec<_> = animations
            .flats
            .iter()
            .filter_map(|&(first_name, last_name)| {
                match (flats.index_of(first_name), flats.index_of(last_name)) {
                    (Some(first), Some(last)) if first <= last => Some(FlatRange {
                        first: first as i32,
                        last: last as i32,
                    }),
                    (Some(_), Some(_)) => {
                        warn!(
                            "Animation {}..{} is out of order, ignoring.",
                            first_name, last_name
                        );
                        None
                    }
                    _ => None,
                }
            })
            .collect();

        let mut polys = Vec::new();
        for (i_mesh, mesh) in meshes.leaves.iter().enumerate() {
            for vertices in &[mesh.floor.clone(), mesh.ceiling.clone()] {
                let texture = match mesh.vertices.get(vertices.start) {
                    Some(vertex) if !vertices.is_empty() => vertex.texture_index,
                    _ => continue,
                };
                if let Some(range) = ranges.iter().position(|range| range.contains(texture)) {
                    polys.push(AnimatedPoly {
                        mesh: i_mesh,
                        vertices: vertices.clone(),
                        range,
                    });
                }
            }
        }
        info!(
            "  {:4} animated flat ranges over {} polygons",
            ranges.len(),
            polys.len()
        );

        FlatAnimator {
            ranges,
            polys,
            elapsed: 0.0,
        }
    }

    pub fn num_ranges(&self) -> usize {
        self.ranges.len()
    }

    pub fn num_polys(&self) -> usize {
        self.polys.len()
    }

    /// Advances the animation by `delta_time` seconds and returns the positions in
    /// `meshes.leaves` of every mesh that changed, in ascending order.
    pub fn update(&mut self, delta_time: f32, meshes: &mut RenderMeshSet) -> Vec<usize> {
        self.elapsed += delta_time;
        let mut frames = 0u32;
        while self.elapsed >= FLAT_FRAME_TIME {
            self.elapsed -= FLAT_FRAME_TIME;
            frames += 1;
        }
        if frames == 0 {
            return Vec::new();
        }

        let mut changed = Vec::new();
        for poly in &self.polys {
            let range = self.ranges[poly.range];
            let mesh = match meshes.leaves.get_mut(poly.mesh) {
                Some(mesh) => mesh,
                None => continue,
            };
            let vertices = match mesh.vertices.get_mut(poly.vertices.clone()) {
                Some(vertices) => vertices,
                None => continue,
            };
            for vertex in vertices {
                vertex.texture_index = range.advance(vertex.texture_index, frames);
            }
            changed.push(poly.mesh);
        }
        changed.sort_unstable();
        changed.dedup();
        changed
    }
}

#[cfg(test)]
mod test {
    use super::super::fixtures::{decode, name, Fixture};
    use super::super::meshgen::{generate_meshes, RenderMeshSet};
    use super::{FlatAnimator, FlatRange, FLAT_FRAME_TIME};
    use wad::AnimationMetadata;

    #[test]
    fn range_wraps_from_last_to_first() {
        let range = FlatRange { first: 3, last: 5 };
        assert_eq!(range.advance(3, 1), 4);
        assert_eq!(range.advance(5, 1), 3);
        assert_eq!(range.advance(4, 5), 3);
        assert!(!range.contains(2));
        assert!(range.contains(5));
    }

    #[test]
    fn animates_registered_floors() {
        let fixture = Fixture {
            left_floor_flat: "NUKAGE1",
            ..Fixture::default()
        };
        let decoded = decode(fixture.archive());
        let mut meshes = generate_meshes(
            &decoded.level,
            &decoded.index,
            &decoded.flats,
            &decoded.walls,
            Some(2),
        )
        .unwrap();
        let mut animator =
            FlatAnimator::new(&AnimationMetadata::default(), &decoded.flats, &meshes);
        // Only NUKAGE1..NUKAGE3 exists in the fixture.
        assert_eq!(animator.num_ranges(), 1);
        assert_eq!(animator.num_polys(), 1);

        let left = meshes.leaves.iter().position(|mesh| mesh.leaf == 0).unwrap();
        let floor_texture = |meshes: &RenderMeshSet| {
            let mesh = &meshes.leaves[left];
            mesh.vertices[mesh.floor.start].texture_index
        };
        assert_eq!(floor_texture(&meshes), 3);

        assert!(animator.update(FLAT_FRAME_TIME * 0.5, &mut meshes).is_empty());
        assert_eq!(animator.update(FLAT_FRAME_TIME * 0.6, &mut meshes), vec![left]);
        assert_eq!(floor_texture(&meshes), 4);
        animator.update(FLAT_FRAME_TIME * 2.0, &mut meshes);
        assert_eq!(floor_texture(&meshes), 3);

        let left_mesh = &meshes.leaves[left];
        assert!(left_mesh.vertices[left_mesh.floor.clone()]
            .iter()
            .all(|vertex| vertex.texture_index == 3));
        assert!(left_mesh.vertices[left_mesh.ceiling.clone()]
            .iter()
            .all(|vertex| vertex.texture_index == 1));
    }

    #[test]
    fn unresolved_or_reversed_ranges_are_ignored() {
        let decoded = decode(Fixture::default().archive());
        let meshes = generate_meshes(
            &decoded.level,
            &decoded.index,
            &decoded.flats,
            &decoded.walls,
            Some(2),
        )
        .unwrap();
        let animations = AnimationMetadata {
            flats: vec![
                (name("NUKAGE3"), name("NUKAGE1")),
                (name("LAVA1"), name("LAVA4")),
            ],
        };
        let animator = FlatAnimator::new(&animations, &decoded.flats, &meshes);
        assert_eq!(animator.num_ranges(), 0);
        assert_eq!(animator.num_polys(), 0);
    }
}

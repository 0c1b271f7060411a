use crate::shared::region::Region;
use crate::shared::union_find;

/// Result of grouping the single-axle boxes of one image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AxleGroups {
    pub single_axle: Vec<Region>,
    pub grouped_axles: Vec<Region>,
}

impl AxleGroups {
    /// Every output box, singles first.
    pub fn all(&self) -> impl Iterator<Item = &Region> {
        self.single_axle.iter().chain(self.grouped_axles.iter())
    }
}

#[derive(Clone, Copy, Debug)]
struct Member {
    region: Region,
    grouped: bool,
}

/// Fuses overlapping single-axle boxes into grouped-axle boxes.
///
/// Boxes are clustered as connected components of the overlap graph. The
/// union box of a component can reach boxes that no individual member
/// touched, so clustering repeats over the fused boxes until a pass
/// produces no merge. The result is independent of input order and
/// stable when fed back in.
pub struct AxleGrouper;

impl AxleGrouper {
    pub fn new() -> Self {
        Self
    }

    pub fn group(&self, axles: &[Region]) -> AxleGroups {
        let mut pool = distinct_members(axles);
        let mut passes = 0usize;

        loop {
            passes += 1;
            let mut parent = union_find::singletons(pool.len());
            let mut merged = false;
            for i in 0..pool.len() {
                for j in (i + 1)..pool.len() {
                    if pool[i].region.overlaps(&pool[j].region) {
                        merged |= union_find::union(&mut parent, i, j);
                    }
                }
            }
            if !merged {
                break;
            }
            pool = union_find::components(&mut parent)
                .iter()
                .map(|members| fuse(&pool, members))
                .collect();
        }

        log::debug!(
            "Grouped {} axle boxes into {} boxes after {} pass(es)",
            axles.len(),
            pool.len(),
            passes
        );

        let (grouped, single): (Vec<Member>, Vec<Member>) =
            pool.into_iter().partition(|m| m.grouped);
        AxleGroups {
            single_axle: single.into_iter().map(|m| m.region).collect(),
            grouped_axles: grouped.into_iter().map(|m| m.region).collect(),
        }
    }
}

impl Default for AxleGrouper {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes the input and drops exact coordinate duplicates, which
/// describe the same axle twice rather than two touching axles.
fn distinct_members(axles: &[Region]) -> Vec<Member> {
    let mut members: Vec<Member> = Vec::with_capacity(axles.len());
    for region in axles.iter().map(Region::normalized) {
        if !members.iter().any(|m| m.region == region) {
            members.push(Member {
                region,
                grouped: false,
            });
        }
    }
    members
}

fn fuse(pool: &[Member], members: &[usize]) -> Member {
    if let [only] = members {
        return pool[*only];
    }
    let region = members
        .iter()
        .map(|&i| pool[i].region)
        .reduce(|acc, r| acc.union(&r))
        .unwrap_or(pool[members[0]].region);
    Member {
        region,
        grouped: true,
    }
}

use bevy::math::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::terrain::geometry::{IntLineSegment2, Polygon2};
use crate::terrain::math::IntRect2;

macro_rules! terrain_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }
    };
}

terrain_id!(
    /// Stable identity of a sector across store versions.
    SectorNodeId,
    "Sector"
);
terrain_id!(SectorEdgeId, "SectorEdge");
terrain_id!(TemporaryHoleId, "TemporaryHole");

/// Static obstacle geometry of a sector, in its local space.
///
/// Compared structurally: two sectors built from equal metadata share cached
/// geometry even when they are different `Arc`s.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerrainStaticMetadata {
    pub local_boundary: IntRect2,
    pub local_included_contours: Vec<Polygon2>,
    pub local_excluded_contours: Vec<Polygon2>,
}

impl TerrainStaticMetadata {
    pub fn new(
        local_boundary: IntRect2,
        local_included_contours: Vec<Polygon2>,
        local_excluded_contours: Vec<Polygon2>,
    ) -> Self {
        Self {
            local_boundary,
            local_included_contours,
            local_excluded_contours,
        }
    }

    /// Fully walkable `width × height` sector with its origin at the corner.
    pub fn open_rectangle(width: i32, height: i32) -> Self {
        Self::new(
            IntRect2::new(0, 0, width, height),
            vec![Polygon2::rectangle(0, 0, width, height)],
            Vec::new(),
        )
    }

    pub fn with_excluded(mut self, contour: Polygon2) -> Self {
        self.local_excluded_contours.push(contour);
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectorNodeDescription {
    pub id: SectorNodeId,
    pub static_metadata: Arc<TerrainStaticMetadata>,
    /// Local -> world.
    pub world_transform: DAffine2,
}

impl SectorNodeDescription {
    pub fn local_to_world(&self, local: DVec2) -> DVec2 {
        self.world_transform.transform_point2(local)
    }

    pub fn world_to_local(&self, world: DVec2) -> DVec2 {
        self.world_transform.inverse().transform_point2(world)
    }
}

/// Directed crossover from `source` into `destination`.
///
/// `source_segment` is in the source's local space, `destination_segment` in
/// the destination's; their `first` endpoints are the same world point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorEdgeDescription {
    pub id: SectorEdgeId,
    pub source: SectorNodeId,
    pub destination: SectorNodeId,
    pub source_segment: IntLineSegment2,
    pub destination_segment: IntLineSegment2,
}

impl SectorEdgeDescription {
    /// Openings this edge punches into its source sector's geometry.
    pub fn crossover_segments(&self) -> impl Iterator<Item = IntLineSegment2> {
        std::iter::once(self.source_segment)
    }
}

/// Dynamic obstacle in one sector's local space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryHoleDescription {
    pub id: TemporaryHoleId,
    pub sector: SectorNodeId,
    pub contour: Polygon2,
}

impl TemporaryHoleDescription {
    /// Contours this hole subtracts from its sector.
    pub fn hole_contours(&self) -> impl Iterator<Item = Polygon2> + '_ {
        std::iter::once(self.contour.clone())
    }
}

use std::sync::Arc;

use super::descriptions::{SectorEdgeDescription, TemporaryHoleDescription, TerrainStaticMetadata};
use crate::terrain::geometry::{IntLineSegment2, Polygon2};

/// Cache key for one sector's compiled geometry.
///
/// Crossover segments are stored canonically and both sets are sorted and
/// deduplicated on construction, so the derived `Eq`/`Hash` are set equality.
/// Metadata compares by value, not by `Arc` identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalGeometryJob {
    static_metadata: Arc<TerrainStaticMetadata>,
    crossover_segments: Vec<IntLineSegment2>,
    temporary_hole_contours: Vec<Polygon2>,
}

impl LocalGeometryJob {
    pub fn new(
        static_metadata: Arc<TerrainStaticMetadata>,
        crossover_segments: impl IntoIterator<Item = IntLineSegment2>,
        temporary_hole_contours: impl IntoIterator<Item = Polygon2>,
    ) -> Self {
        let mut crossover_segments: Vec<_> = crossover_segments
            .into_iter()
            .map(|s| s.canonical())
            .collect();
        crossover_segments.sort_unstable();
        crossover_segments.dedup();

        let mut temporary_hole_contours: Vec<_> = temporary_hole_contours.into_iter().collect();
        temporary_hole_contours.sort_unstable();
        temporary_hole_contours.dedup();

        Self {
            static_metadata,
            crossover_segments,
            temporary_hole_contours,
        }
    }

    /// Just the static geometry.
    pub fn preview(static_metadata: Arc<TerrainStaticMetadata>) -> Self {
        Self::new(static_metadata, Vec::<IntLineSegment2>::new(), Vec::<Polygon2>::new())
    }

    /// Fold a sector's outgoing edges and holes into its job.
    pub fn plan<'a>(
        static_metadata: Arc<TerrainStaticMetadata>,
        outgoing_edges: impl IntoIterator<Item = &'a SectorEdgeDescription>,
        temporary_holes: impl IntoIterator<Item = &'a TemporaryHoleDescription>,
    ) -> Self {
        let segments = outgoing_edges
            .into_iter()
            .fold(Vec::new(), |mut acc, edge| {
                acc.extend(edge.crossover_segments());
                acc
            });
        let holes = temporary_holes
            .into_iter()
            .fold(Vec::new(), |mut acc, hole| {
                acc.extend(hole.hole_contours());
                acc
            });
        Self::new(static_metadata, segments, holes)
    }

    pub fn preview_job(&self) -> Self {
        Self::preview(self.static_metadata.clone())
    }

    pub fn is_preview(&self) -> bool {
        self.crossover_segments.is_empty() && self.temporary_hole_contours.is_empty()
    }

    pub fn static_metadata(&self) -> &Arc<TerrainStaticMetadata> {
        &self.static_metadata
    }

    /// Canonical, sorted.
    pub fn crossover_segments(&self) -> &[IntLineSegment2] {
        &self.crossover_segments
    }

    pub fn temporary_hole_contours(&self) -> &[Polygon2] {
        &self.temporary_hole_contours
    }
}

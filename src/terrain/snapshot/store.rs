use bevy::log::debug;
use bevy::math::DAffine2;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::descriptions::{
    SectorEdgeDescription, SectorEdgeId, SectorNodeDescription, SectorNodeId, TemporaryHoleDescription,
    TemporaryHoleId, TerrainStaticMetadata,
};
use crate::terrain::error::TerrainError;
use crate::terrain::geometry::{IntLineSegment2, Polygon2};

static NEXT_STORE_INSTANCE: AtomicU64 = AtomicU64::new(0);

/// Mutable source of truth for the sector graph.
///
/// Every successful mutation bumps [`version`](Self::version); failed ones
/// leave the store untouched. Enumeration order is by id, which is also
/// insertion order.
///
/// Versions are only comparable within one store, so each store also carries
/// a process-unique [`instance_id`](Self::instance_id).
#[derive(Debug)]
pub struct SectorGraphDescriptionStore {
    instance_id: u64,
    version: u64,
    next_id: u64,
    nodes: BTreeMap<SectorNodeId, Arc<SectorNodeDescription>>,
    edges: BTreeMap<SectorEdgeId, Arc<SectorEdgeDescription>>,
    temporary_holes: BTreeMap<TemporaryHoleId, Arc<TemporaryHoleDescription>>,
}

impl Default for SectorGraphDescriptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SectorGraphDescriptionStore {
    pub fn new() -> Self {
        Self {
            instance_id: NEXT_STORE_INSTANCE.fetch_add(1, Ordering::Relaxed),
            version: 0,
            next_id: 0,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            temporary_holes: BTreeMap::new(),
        }
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn bump(&mut self) {
        self.version += 1;
    }

    fn require_sector(&self, id: SectorNodeId) -> Result<(), TerrainError> {
        if self.nodes.contains_key(&id) {
            Ok(())
        } else {
            Err(TerrainError::UnknownSector(id))
        }
    }

    // ========================================================================
    // Sectors
    // ========================================================================

    pub fn add_sector(
        &mut self,
        static_metadata: impl Into<Arc<TerrainStaticMetadata>>,
        world_transform: DAffine2,
    ) -> SectorNodeId {
        let id = SectorNodeId(self.allocate_id());
        self.nodes.insert(
            id,
            Arc::new(SectorNodeDescription {
                id,
                static_metadata: static_metadata.into(),
                world_transform,
            }),
        );
        self.bump();
        debug!("[TERRAIN] Added {} (version {})", id, self.version);
        id
    }

    /// Remove a sector along with every edge touching it and its holes.
    pub fn remove_sector(&mut self, id: SectorNodeId) -> Result<(), TerrainError> {
        self.nodes.remove(&id).ok_or(TerrainError::UnknownSector(id))?;
        self.edges
            .retain(|_, edge| edge.source != id && edge.destination != id);
        self.temporary_holes.retain(|_, hole| hole.sector != id);
        self.bump();
        debug!("[TERRAIN] Removed {} (version {})", id, self.version);
        Ok(())
    }

    pub fn sector(&self, id: SectorNodeId) -> Option<&Arc<SectorNodeDescription>> {
        self.nodes.get(&id)
    }

    // ========================================================================
    // Edges
    // ========================================================================

    pub fn add_edge(
        &mut self,
        source: SectorNodeId,
        destination: SectorNodeId,
        source_segment: IntLineSegment2,
        destination_segment: IntLineSegment2,
    ) -> Result<SectorEdgeId, TerrainError> {
        self.require_sector(source)?;
        self.require_sector(destination)?;
        for segment in [source_segment, destination_segment] {
            if segment.is_degenerate() {
                return Err(TerrainError::DegenerateSegment(segment));
            }
        }

        let id = SectorEdgeId(self.allocate_id());
        self.edges.insert(
            id,
            Arc::new(SectorEdgeDescription {
                id,
                source,
                destination,
                source_segment,
                destination_segment,
            }),
        );
        self.bump();
        Ok(id)
    }

    /// Two opposing edges through the same opening, so both sides get punched
    /// and linked. `a_segment.first` and `b_segment.first` must be the same
    /// world point.
    pub fn add_portal_pair(
        &mut self,
        a: SectorNodeId,
        b: SectorNodeId,
        a_segment: IntLineSegment2,
        b_segment: IntLineSegment2,
    ) -> Result<(SectorEdgeId, SectorEdgeId), TerrainError> {
        self.require_sector(b)?;
        let forward = self.add_edge(a, b, a_segment, b_segment)?;
        let backward = self.add_edge(b, a, b_segment, a_segment)?;
        Ok((forward, backward))
    }

    pub fn remove_edge(&mut self, id: SectorEdgeId) -> Result<(), TerrainError> {
        self.edges.remove(&id).ok_or(TerrainError::UnknownEdge(id))?;
        self.bump();
        Ok(())
    }

    // ========================================================================
    // Temporary holes
    // ========================================================================

    pub fn add_temporary_hole(
        &mut self,
        sector: SectorNodeId,
        contour: Polygon2,
    ) -> Result<TemporaryHoleId, TerrainError> {
        self.require_sector(sector)?;
        if contour.is_degenerate() {
            return Err(TerrainError::DegenerateContour {
                points: contour.len(),
            });
        }

        let id = TemporaryHoleId(self.allocate_id());
        self.temporary_holes.insert(
            id,
            Arc::new(TemporaryHoleDescription { id, sector, contour }),
        );
        self.bump();
        debug!("[TERRAIN] Added {} in {} (version {})", id, sector, self.version);
        Ok(id)
    }

    pub fn remove_temporary_hole(&mut self, id: TemporaryHoleId) -> Result<(), TerrainError> {
        self.temporary_holes
            .remove(&id)
            .ok_or(TerrainError::UnknownTemporaryHole(id))?;
        self.bump();
        Ok(())
    }

    // ========================================================================
    // Enumeration
    // ========================================================================

    pub fn enumerate_sector_node_descriptions(&self) -> impl Iterator<Item = &Arc<SectorNodeDescription>> + '_ {
        self.nodes.values()
    }

    pub fn enumerate_sector_edge_descriptions(&self) -> impl Iterator<Item = &Arc<SectorEdgeDescription>> + '_ {
        self.edges.values()
    }

    pub fn enumerate_temporary_hole_descriptions(
        &self,
    ) -> impl Iterator<Item = &Arc<TemporaryHoleDescription>> + '_ {
        self.temporary_holes.values()
    }
}

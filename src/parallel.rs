//! Synchronization of values shared between mesh partitions.
//!
//! The engine decides when a synchronization is needed. The transport itself is provided by
//! the caller through [`ParallelSync`].

/// Kind of entities whose values may be shared by several partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharedEntity {
    Vertices,
    Faces,
}

/// Blocking collective operations over all ranks of a distributed mesh.
///
/// Every rank must call the same operations in the same order.
pub trait ParallelSync: Send + Sync {
    fn n_ranks(&self) -> usize;

    /// Exchanges cell flags with neighbouring ranks.
    ///
    /// `flags` covers the local cells followed by the ghost cells. On return, the flag of a
    /// ghost cell is set if the owning rank has set it.
    fn sync_cell_flags(&self, flags: &mut [bool]);

    /// Reduces vertex flags over the ranks sharing each vertex. A flag stays set only if it
    /// is set on every such rank.
    fn reduce_vertex_candidates(&self, flags: &mut [bool]);

    /// Sum of `value` over all ranks.
    fn sum(&self, value: f64) -> f64;

    /// Makes values of shared entities consistent across ranks, `stride` values per entity.
    fn sync_shared(&self, entity: SharedEntity, stride: usize, values: &mut [f64]);
}

/// Synchronization for a mesh that is not partitioned. Every operation is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialSync;

impl ParallelSync for SerialSync {
    fn n_ranks(&self) -> usize {
        1
    }

    fn sync_cell_flags(&self, _flags: &mut [bool]) {}

    fn reduce_vertex_candidates(&self, _flags: &mut [bool]) {}

    fn sum(&self, value: f64) -> f64 {
        value
    }

    fn sync_shared(&self, _entity: SharedEntity, _stride: usize, _values: &mut [f64]) {}
}

//! Zones, i.e. named selections of primal cells.
use crate::error::EvalError;
use eyre::eyre;
use rustc_hash::FxHashMap;

/// A possibly partial selection of the entities of one kind.
///
/// Without explicit ids, the selection covers the dense range `0..n_elts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<'a> {
    n_elts: usize,
    ids: Option<&'a [usize]>,
}

impl<'a> Selection<'a> {
    pub fn all(n_elts: usize) -> Self {
        Self { n_elts, ids: None }
    }

    pub fn from_ids(ids: &'a [usize]) -> Self {
        Self {
            n_elts: ids.len(),
            ids: Some(ids),
        }
    }

    pub fn len(&self) -> usize {
        self.n_elts
    }

    pub fn is_empty(&self) -> bool {
        self.n_elts == 0
    }

    pub fn is_full(&self) -> bool {
        self.ids.is_none()
    }

    pub fn ids(&self) -> Option<&'a [usize]> {
        self.ids
    }

    /// The global id of the `i`-th selected entity.
    pub fn element(&self, i: usize) -> usize {
        match self.ids {
            Some(ids) => ids[i],
            None => i,
        }
    }

    pub fn iter(&self) -> impl 'a + Iterator<Item = usize> {
        let ids = self.ids;
        (0..self.n_elts).map(move |i| match ids {
            Some(ids) => ids[i],
            None => i,
        })
    }

    /// Position in an output buffer of the values of the `i`-th selected entity, in units
    /// of `stride`.
    pub fn output_index(&self, i: usize, compact: bool) -> usize {
        if compact {
            i
        } else {
            self.element(i)
        }
    }

    /// Minimal length of an output buffer holding `stride` values per selected entity.
    pub fn required_len(&self, stride: usize, compact: bool) -> usize {
        match self.ids {
            Some(ids) if !compact => ids.iter().max().map_or(0, |max| (max + 1) * stride),
            _ => self.n_elts * stride,
        }
    }
}

/// A named set of primal cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    id: usize,
    name: String,
    elt_ids: Option<Vec<usize>>,
    n_elts: usize,
}

impl Zone {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_elts(&self) -> usize {
        self.n_elts
    }

    /// Whether the zone covers every cell, in order.
    pub fn is_full(&self) -> bool {
        self.elt_ids.is_none()
    }

    pub fn elt_ids(&self) -> Option<&[usize]> {
        self.elt_ids.as_deref()
    }

    pub fn selection(&self) -> Selection<'_> {
        match &self.elt_ids {
            Some(ids) => Selection::from_ids(ids),
            None => Selection::all(self.n_elts),
        }
    }

    /// Iterate over pairs (position in the zone, cell id).
    pub fn iter(&self) -> impl '_ + Iterator<Item = (usize, usize)> {
        self.selection().iter().enumerate()
    }
}

/// Zones known to the evaluators, looked up by id or by name.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
    ids_by_name: FxHashMap<String, usize>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, name: &str, elt_ids: Option<Vec<usize>>, n_elts: usize) -> eyre::Result<usize> {
        if self.ids_by_name.contains_key(name) {
            return Err(eyre!("A zone named \"{name}\" is already registered."));
        }
        let id = self.zones.len();
        self.zones.push(Zone {
            id,
            name: name.to_string(),
            elt_ids,
            n_elts,
        });
        self.ids_by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Registers a zone covering all `n_cells` cells and returns its id.
    pub fn insert_all_cells(&mut self, name: &str, n_cells: usize) -> eyre::Result<usize> {
        self.insert(name, None, n_cells)
    }

    /// Registers a zone made of the given cells and returns its id.
    pub fn insert_cells(&mut self, name: &str, cell_ids: &[usize], n_cells: usize) -> eyre::Result<usize> {
        if let Some(id) = cell_ids.iter().find(|id| **id >= n_cells) {
            return Err(eyre!("Cell {id} of zone \"{name}\" is out of bounds ({n_cells} cells)."));
        }
        let covers_all_in_order = cell_ids.len() == n_cells && cell_ids.iter().enumerate().all(|(i, id)| i == *id);
        if covers_all_in_order {
            self.insert(name, None, n_cells)
        } else {
            self.insert(name, Some(cell_ids.to_vec()), cell_ids.len())
        }
    }

    pub fn by_id(&self, zone_id: usize) -> Result<&Zone, EvalError> {
        self.zones
            .get(zone_id)
            .ok_or(EvalError::UnknownZone { zone_id })
    }

    pub fn by_name(&self, name: &str) -> Option<&Zone> {
        self.id_by_name(name).map(|id| &self.zones[id])
    }

    pub fn id_by_name(&self, name: &str) -> Option<usize> {
        self.ids_by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn iter(&self) -> impl '_ + Iterator<Item = &'_ Zone> {
        self.zones.iter()
    }
}

//! The flat container of all arrays making up a workflow graph.

use std::collections::HashMap;

use crate::error::GraphError;
use crate::graph::array::Array;
use crate::graph::coordinate::Coordinate;
use crate::graph::item::GraphItem;

/// Maps template names to [`Array`]s, preserving name insertion order so
/// iteration over the whole graph is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Store {
    arrays: Vec<Array>,
    index: HashMap<String, usize>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an item to the array of its name, creating the array on
    /// first use.
    pub fn insert(&mut self, item: GraphItem) -> Result<(), GraphError> {
        let name = item.name().to_string();
        let idx = match self.index.get(&name) {
            Some(idx) => *idx,
            None => {
                self.index.insert(name.clone(), self.arrays.len());
                self.arrays.push(Array::new(name));
                self.arrays.len() - 1
            }
        };
        self.arrays[idx].insert(item)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// The array under `name`, if any item was inserted for it.
    pub fn array(&self, name: &str) -> Option<&Array> {
        self.index.get(name).map(|idx| &self.arrays[*idx])
    }

    /// Exact lookup by name and full coordinate.
    pub fn lookup(&self, name: &str, coordinate: &Coordinate) -> Result<&GraphItem, GraphError> {
        self.array(name)
            .and_then(|array| array.get(coordinate))
            .ok_or_else(|| GraphError::Missing {
                name: name.to_string(),
                coordinate: coordinate.clone(),
            })
    }

    pub fn lookup_mut(
        &mut self,
        name: &str,
        coordinate: &Coordinate,
    ) -> Result<&mut GraphItem, GraphError> {
        let missing = || GraphError::Missing {
            name: name.to_string(),
            coordinate: coordinate.clone(),
        };
        let idx = *self.index.get(name).ok_or_else(missing)?;
        self.arrays[idx].get_mut(coordinate).ok_or_else(missing)
    }

    /// Items agreeing with a partial coordinate, in insertion order. An
    /// unknown name yields an empty list, distinguishing "nothing matched"
    /// from an exact-lookup [`GraphError::Missing`].
    pub fn lookup_partial(&self, name: &str, partial: &Coordinate) -> Vec<&GraphItem> {
        self.array(name)
            .map(|array| array.select(partial))
            .unwrap_or_default()
    }

    /// All items: arrays in name insertion order, items in insertion order
    /// within each array.
    pub fn iter_items(&self) -> impl Iterator<Item = &GraphItem> {
        self.arrays.iter().flat_map(Array::iter)
    }

    pub fn iter_arrays(&self) -> impl Iterator<Item = &Array> {
        self.arrays.iter()
    }
}

//! Homogeneous name-groups of graph items indexed by coordinate.

use std::collections::HashMap;

use crate::error::GraphError;
use crate::graph::coordinate::{Coordinate, DimValue};
use crate::graph::item::GraphItem;

/// All items sharing one template name, indexed by coordinate.
///
/// The dimension set is established by the first inserted item; every later
/// insert must match it. A zero-dimensional array holds exactly one item,
/// which is how one-off items fall out of the same code path as cycled and
/// parameter-swept ones.
#[derive(Debug, Clone, Default)]
pub struct Array {
    name: String,
    dims: Vec<String>,
    /// Values seen per dimension, in first-seen order, for fan-out lookups.
    axes: Vec<Vec<DimValue>>,
    items: Vec<GraphItem>,
    index: HashMap<Coordinate, usize>,
}

impl Array {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimension names, in normalized order. Empty until the first insert.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Appends an item. The first insert fixes the dimension set; a
    /// coordinate seen twice is rejected.
    pub fn insert(&mut self, item: GraphItem) -> Result<(), GraphError> {
        let coordinate = item.coordinate().clone();
        let item_dims = coordinate.dim_names();

        if self.items.is_empty() && self.dims.is_empty() {
            self.dims = item_dims.clone();
            self.axes = vec![Vec::new(); self.dims.len()];
        } else if self.dims != item_dims {
            return Err(GraphError::dimension_mismatch(
                &self.name, &self.dims, &item_dims,
            ));
        }

        if self.index.contains_key(&coordinate) {
            return Err(GraphError::DuplicateCoordinate {
                name: self.name.clone(),
                coordinate,
            });
        }

        for (axis, dim) in self.axes.iter_mut().zip(&self.dims) {
            let value = coordinate
                .get(dim)
                .expect("dimension set was just checked against the coordinate");
            if !axis.contains(value) {
                axis.push(value.clone());
            }
        }

        self.index.insert(coordinate, self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// Exact lookup by full coordinate.
    pub fn get(&self, coordinate: &Coordinate) -> Option<&GraphItem> {
        self.index.get(coordinate).map(|idx| &self.items[*idx])
    }

    pub fn get_mut(&mut self, coordinate: &Coordinate) -> Option<&mut GraphItem> {
        let idx = *self.index.get(coordinate)?;
        Some(&mut self.items[idx])
    }

    /// Items agreeing with a partial coordinate on the shared dimensions,
    /// in insertion order. Dimensions the array does not carry constrain
    /// nothing; an empty result is legal.
    pub fn select(&self, partial: &Coordinate) -> Vec<&GraphItem> {
        self.items
            .iter()
            .filter(|item| item.coordinate().agrees_with(partial))
            .collect()
    }

    /// All values seen along one dimension, in first-seen order.
    pub fn axis(&self, dim: &str) -> &[DimValue] {
        self.dims
            .iter()
            .position(|name| name == dim)
            .map(|idx| self.axes[idx].as_slice())
            .unwrap_or(&[])
    }

    /// Items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GraphItem> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::coordinate::DATE_DIM;
    use crate::graph::item::{Availability, Data};
    use crate::temporal::date::parse_date;

    fn data_at(name: &str, coordinate: Coordinate) -> GraphItem {
        GraphItem::Data(Data {
            name: name.to_string(),
            coordinate,
            availability: Availability::Generated,
            payload: serde_json::Map::new(),
        })
    }

    fn coord(foo: i64) -> Coordinate {
        Coordinate::from_pairs([("foo", foo)]).unwrap()
    }

    #[test]
    fn test_first_insert_fixes_dims() {
        let mut array = Array::new("out");
        array.insert(data_at("out", coord(0))).unwrap();
        assert_eq!(array.dims(), ["foo".to_string()]);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut array = Array::new("out");
        array.insert(data_at("out", coord(0))).unwrap();
        let err = array
            .insert(data_at(
                "out",
                Coordinate::from_pairs([("bar", 0i64)]).unwrap(),
            ))
            .unwrap_err();
        assert!(matches!(err, GraphError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_duplicate_coordinate_rejected() {
        let mut array = Array::new("out");
        array.insert(data_at("out", coord(0))).unwrap();
        let err = array.insert(data_at("out", coord(0))).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateCoordinate { .. }));
    }

    #[test]
    fn test_zero_dimensional_array_holds_one_item() {
        let mut array = Array::new("one_off");
        array.insert(data_at("one_off", Coordinate::empty())).unwrap();
        assert_eq!(array.len(), 1);
        assert!(array.get(&Coordinate::empty()).is_some());
        assert!(array.insert(data_at("one_off", Coordinate::empty())).is_err());
    }

    #[test]
    fn test_exact_get() {
        let mut array = Array::new("out");
        array.insert(data_at("out", coord(0))).unwrap();
        array.insert(data_at("out", coord(1))).unwrap();

        assert!(array.get(&coord(1)).is_some());
        assert!(array.get(&coord(2)).is_none());
        // Partial coordinates never match exactly against a wider dim set.
        assert!(array.get(&Coordinate::empty()).is_none());
    }

    #[test]
    fn test_select_partial() {
        let date_a = parse_date("2026-01-01").unwrap();
        let date_b = parse_date("2026-03-01").unwrap();
        let mut array = Array::new("out");
        for date in [date_a, date_b] {
            for foo in [0i64, 1] {
                let coordinate =
                    Coordinate::from_pairs([(DATE_DIM, DimValue::Date(date))])
                        .unwrap()
                        .merge(&coord(foo))
                        .unwrap();
                array.insert(data_at("out", coordinate)).unwrap();
            }
        }

        let by_date =
            Coordinate::from_pairs([(DATE_DIM, DimValue::Date(date_a))]).unwrap();
        assert_eq!(array.select(&by_date).len(), 2);

        let by_both = by_date.merge(&coord(1)).unwrap();
        assert_eq!(array.select(&by_both).len(), 1);

        // A dimension the array lacks constrains nothing.
        let foreign = Coordinate::from_pairs([("baz", 7i64)]).unwrap();
        assert_eq!(array.select(&foreign).len(), 4);

        // No agreement: empty result, not an error.
        let missing =
            Coordinate::from_pairs([(DATE_DIM, DimValue::Date(parse_date("2027-01-01").unwrap()))])
                .unwrap();
        assert!(array.select(&missing).is_empty());
    }

    #[test]
    fn test_select_preserves_insertion_order() {
        let mut array = Array::new("out");
        for foo in [2i64, 0, 1] {
            array.insert(data_at("out", coord(foo))).unwrap();
        }
        let selected = array.select(&Coordinate::empty());
        let order: Vec<_> = selected
            .iter()
            .map(|item| item.coordinate().get("foo").unwrap().clone())
            .collect();
        assert_eq!(order, vec![DimValue::Int(2), DimValue::Int(0), DimValue::Int(1)]);
    }

    #[test]
    fn test_axis_first_seen_order() {
        let mut array = Array::new("out");
        for foo in [1i64, 0] {
            array.insert(data_at("out", coord(foo))).unwrap();
        }
        assert_eq!(array.axis("foo"), &[DimValue::Int(1), DimValue::Int(0)]);
        assert!(array.axis("bar").is_empty());
    }
}

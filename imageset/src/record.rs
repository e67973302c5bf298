use crate::common::*;

/// A detector-style box: the rectangle plus its ignore marker and label.
/// Ignored and kept boxes appear merged, in metadata file order.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledBox {
    pub rect: Rect<R64>,
    pub ignore: bool,
    pub label: Option<String>,
}

/// A rectangle with one point slot per vocabulary part.
///
/// `parts[i]` holds the location of part `i` of the load's part
/// vocabulary, or `None` when that part is not annotated on this box.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkDetection {
    pub rect: Rect<R64>,
    pub parts: Vec<Option<Point<R64>>>,
}

impl LandmarkDetection {
    pub fn num_parts(&self) -> usize {
        self.parts.len()
    }

    pub fn part(&self, index: usize) -> Option<Point<R64>> {
        self.parts.get(index).copied().flatten()
    }

    /// Parts actually present on this box, with their vocabulary indexes.
    pub fn present_parts(&self) -> impl Iterator<Item = (usize, Point<R64>)> + '_ {
        self.parts
            .iter()
            .enumerate()
            .filter_map(|(index, part)| part.map(|point| (index, point)))
    }
}

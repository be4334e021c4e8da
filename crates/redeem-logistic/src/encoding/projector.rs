use crate::data_handling::RowSource;
use crate::encoding::{Encoding, SparseVec};

/// One training row projected through an encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleRow {
    pub values: SparseVec,
    pub weight: f64,
    pub category: usize,
}

/// Lazily maps the rows of a source through an encoding.
///
/// Nothing is materialized: every call to [`ExampleProjector::iter`] starts
/// a fresh pass over the source.
pub struct ExampleProjector<'a, E: Encoding + ?Sized, S: RowSource + ?Sized> {
    encoding: &'a E,
    source: &'a S,
}

impl<'a, E: Encoding + ?Sized, S: RowSource + ?Sized> ExampleProjector<'a, E, S> {
    pub fn new(encoding: &'a E, source: &'a S) -> Self {
        Self { encoding, source }
    }

    pub fn encoding(&self) -> &'a E {
        self.encoding
    }

    pub fn iter(&self) -> impl Iterator<Item = ExampleRow> + 'a {
        let encoding = self.encoding;
        let source = self.source;
        source.rows().filter_map(move |row| encoding.project(&row))
    }
}

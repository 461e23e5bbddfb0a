use crate::errors::{Result, SchemaViewsError};
use crate::schema::ColumnSchema;

/// Upper bound on rows reserved up front per array. Arrays grow past this as
/// rows are written.
const MAX_PREALLOCATED_ROWS: usize = 2048;

/// Scan projections.
///
/// Position `i` in the projections is column `i` of the output batch, the
/// value is the index of the table column written to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projections {
    column_indices: Vec<usize>,
}

impl Projections {
    pub fn new(column_indices: impl IntoIterator<Item = usize>) -> Self {
        Projections {
            column_indices: column_indices.into_iter().collect(),
        }
    }

    /// Project every column of the schema in order.
    pub fn all(schema: &ColumnSchema) -> Self {
        Self::new(0..schema.num_columns())
    }

    /// Project columns by name.
    pub fn try_from_names<S: AsRef<str>>(schema: &ColumnSchema, names: &[S]) -> Result<Self> {
        let indices = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                schema
                    .column_index(name)
                    .ok_or_else(|| {
                        SchemaViewsError::InvalidArgument(format!("Missing column: {name}"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(indices))
    }

    pub fn indices(&self) -> &[usize] {
        &self.column_indices
    }

    pub fn len(&self) -> usize {
        self.column_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.column_indices.is_empty()
    }
}

/// A nullable string column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Utf8Array {
    values: Vec<Option<String>>,
}

impl Utf8Array {
    pub fn with_capacity(capacity: usize) -> Self {
        Utf8Array {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: Option<&str>) {
        self.values.push(value.map(|s| s.to_string()));
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// Output batch with a fixed write capacity.
///
/// A batch is reused across pulls, each pull resets it before writing. The
/// capacity only limits the number of rows written, it is not allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    projections: Projections,
    arrays: Vec<Utf8Array>,
    capacity: usize,
    num_rows: usize,
}

impl Batch {
    pub fn new(projections: Projections, capacity: usize) -> Self {
        let arrays = (0..projections.len())
            .map(|_| Utf8Array::with_capacity(usize::min(capacity, MAX_PREALLOCATED_ROWS)))
            .collect();
        Batch {
            projections,
            arrays,
            capacity,
            num_rows: 0,
        }
    }

    /// Allocate a batch holding every column of the schema.
    pub fn for_schema(schema: &ColumnSchema, capacity: usize) -> Self {
        Self::new(Projections::all(schema), capacity)
    }

    pub fn projections(&self) -> &Projections {
        &self.projections
    }

    pub fn write_capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.arrays.len()
    }

    pub fn array(&self, idx: usize) -> Option<&Utf8Array> {
        self.arrays.get(idx)
    }

    /// Get the array holding the given table column, if projected.
    pub fn array_for_column(&self, column_idx: usize) -> Option<&Utf8Array> {
        let pos = self
            .projections
            .indices()
            .iter()
            .position(|&idx| idx == column_idx)?;
        self.arrays.get(pos)
    }

    /// Values of a single row across all output columns.
    pub fn row(&self, row_idx: usize) -> Option<Vec<Option<&str>>> {
        if row_idx >= self.num_rows {
            return None;
        }
        Some(self.arrays.iter().map(|arr| arr.get(row_idx)).collect())
    }

    pub fn reset(&mut self) {
        for arr in &mut self.arrays {
            arr.clear();
        }
        self.num_rows = 0;
    }

    /// Call `f` for every output column with the projected table column index.
    pub fn for_each_column<F>(&mut self, f: &mut F) -> Result<()>
    where
        F: FnMut(usize, &mut Utf8Array) -> Result<()>,
    {
        for (&col_idx, array) in self.projections.indices().iter().zip(&mut self.arrays) {
            f(col_idx, array)?;
        }
        Ok(())
    }

    pub fn set_num_rows(&mut self, num_rows: usize) -> Result<()> {
        if num_rows > self.capacity {
            return Err(SchemaViewsError::InvalidArgument(format!(
                "Number of rows {num_rows} exceeds batch capacity {}",
                self.capacity
            )));
        }
        if let Some(arr) = self.arrays.iter().find(|arr| arr.len() != num_rows) {
            return Err(SchemaViewsError::InvalidArgument(format!(
                "Array length {} does not match number of rows {num_rows}",
                arr.len()
            )));
        }
        self.num_rows = num_rows;
        Ok(())
    }
}

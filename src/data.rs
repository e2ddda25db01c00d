use crate::errors::ColboostError;
use std::fmt;

/// Contigious column major matrix data container. This is the
/// dense form user data arrives in, before it is converted into
/// sparse, sorted feature columns.
pub struct Matrix<'a, T> {
    pub data: &'a [T],
    pub rows: usize,
    pub cols: usize,
}

impl<'a, T> Matrix<'a, T> {
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Self {
        Matrix { data, rows, cols }
    }

    /// Get a single reference to an item in the matrix.
    ///
    /// * `i` - The ith row of the data to get.
    /// * `j` - the jth column of the data to get.
    pub fn get(&self, i: usize, j: usize) -> &T {
        &self.data[j * self.rows + i]
    }

    /// Get an entire column in the matrix.
    ///
    /// * `col` - The index of the column to get.
    pub fn get_col(&self, col: usize) -> &[T] {
        &self.data[(col * self.rows)..((col + 1) * self.rows)]
    }
}

impl<'a> Matrix<'a, f64> {
    /// Collect a single row of the matrix, this is used when
    /// predicting, where trees are traversed a row at a time.
    pub fn get_row(&self, row: usize) -> Vec<f64> {
        (0..self.cols).map(|j| *self.get(row, j)).collect()
    }
}

impl<'a, T> fmt::Display for Matrix<'a, T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut val = String::new();
        for i in 0..self.rows {
            for j in 0..self.cols {
                val.push_str(self.get(i, j).to_string().as_str());
                if j == (self.cols - 1) {
                    val.push('\n');
                } else {
                    val.push(' ');
                }
            }
        }
        write!(f, "{}", val)
    }
}

/// A single observed value of a feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyValue {
    /// Index of the instance in the gradient and label arrays.
    pub id: usize,
    /// The observed feature value.
    pub value: f64,
}

/// Sparse, column oriented representation of a dataset.
///
/// Every feature holds only the instances with an observed value,
/// sorted ascending by value. Instances with equal values keep
/// ascending instance order. Columns are never mutated after they
/// have been built.
#[derive(Debug, Clone)]
pub struct FeatureColumns {
    columns: Vec<Vec<KeyValue>>,
    n_instances: usize,
}

impl FeatureColumns {
    /// Build the columns from already sorted or unsorted key value
    /// pairs, each column is sorted here. Every instance may appear at
    /// most once per column, and missing values must be left out
    /// rather than stored as NaN.
    pub fn new(mut columns: Vec<Vec<KeyValue>>, n_instances: usize) -> Result<Self, ColboostError> {
        let mut seen = vec![false; n_instances];
        for (feature, col) in columns.iter().enumerate() {
            seen.iter_mut().for_each(|s| *s = false);
            for kv in col.iter() {
                if kv.id >= n_instances {
                    return Err(ColboostError::DataLength {
                        what: "instances",
                        expected: n_instances,
                        found: kv.id + 1,
                    });
                }
                if kv.value.is_nan() {
                    return Err(ColboostError::InvalidEntry {
                        feature,
                        id: kv.id,
                        reason: "missing values are left out of a column",
                    });
                }
                if seen[kv.id] {
                    return Err(ColboostError::InvalidEntry {
                        feature,
                        id: kv.id,
                        reason: "duplicate instance",
                    });
                }
                seen[kv.id] = true;
            }
        }
        columns.iter_mut().for_each(|col| sort_column(col));
        Ok(FeatureColumns {
            columns,
            n_instances,
        })
    }

    /// Build columns from a dense matrix, any value that is NaN, is
    /// considered missing and left out of its column.
    pub fn from_matrix(data: &Matrix<f64>) -> Self {
        let columns = (0..data.cols)
            .map(|j| {
                let mut col: Vec<KeyValue> = data
                    .get_col(j)
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| !v.is_nan())
                    .map(|(id, value)| KeyValue { id, value: *value })
                    .collect();
                sort_column(&mut col);
                col
            })
            .collect();
        FeatureColumns {
            columns,
            n_instances: data.rows,
        }
    }

    /// Build columns from sparse rows, where every row lists
    /// `(feature, value)` pairs for the features it has observed.
    pub fn from_sparse_rows(rows: &[Vec<(usize, f64)>], n_features: usize) -> Result<Self, ColboostError> {
        let mut columns = vec![Vec::new(); n_features];
        for (id, row) in rows.iter().enumerate() {
            for (feature, value) in row {
                let col = columns
                    .get_mut(*feature)
                    .ok_or(ColboostError::DataLength {
                        what: "features",
                        expected: n_features,
                        found: feature + 1,
                    })?;
                if !value.is_nan() {
                    col.push(KeyValue { id, value: *value });
                }
            }
        }
        FeatureColumns::new(columns, rows.len())
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn n_instances(&self) -> usize {
        self.n_instances
    }

    /// Get the sorted pairs of a feature.
    pub fn get_col(&self, feature: usize) -> &[KeyValue] {
        &self.columns[feature]
    }
}

// Stable, so equal values stay in instance order.
fn sort_column(col: &mut [KeyValue]) {
    col.sort_by(|a, b| a.value.total_cmp(&b.value));
}

//! Wide-to-long reshape
//!
//! Turns rows shaped `id, v1, v2, .., vN` into one output row per
//! `(id, variable)` pair. Output is variable-major: every row for the first
//! value column, then every row for the second, and so on.

/// One cell of a melted table
#[derive(Debug, Clone, PartialEq)]
pub struct Melted<T, K> {
    /// Row index in the input slice
    pub row: usize,
    pub id: T,
    pub variable: K,
    /// `None` when the row is shorter than the value column
    pub value: Option<T>,
}

/// Melt `rows` keeping `id_column` as identifier and emitting one entry per
/// `(column, variable)` in `value_columns`.
///
/// Rows without the id column are skipped. Produces at most
/// `rows.len() * value_columns.len()` entries.
pub fn melt<T, K>(rows: &[Vec<T>], id_column: usize, value_columns: &[(usize, K)]) -> Vec<Melted<T, K>>
where
    T: Clone,
    K: Clone,
{
    let mut out = Vec::with_capacity(rows.len() * value_columns.len());

    for (column, variable) in value_columns {
        for (row_idx, row) in rows.iter().enumerate() {
            let Some(id) = row.get(id_column) else {
                continue;
            };
            out.push(Melted {
                row: row_idx,
                id: id.clone(),
                variable: variable.clone(),
                value: row.get(*column).cloned(),
            });
        }
    }

    out
}

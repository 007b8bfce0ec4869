//! Conversions between full scalar columns and their sparse form: the
//! positions of non-default rows plus the values at those positions.
//!
//! The default value of a scalar is its zero: `0`, `+0.0` (compared by bit
//! pattern, so `-0.0` is kept as a value) or the empty string.

use substream_common::{Result, error::Error, verify_arg};

use crate::column::Column;

impl Column {
    /// Returns `true` if the scalar value at `index` equals the type default.
    /// Composite columns have no default and always return `false`.
    pub fn is_default_at(&self, index: usize) -> bool {
        match self {
            Column::UInt8(v) => v[index] == 0,
            Column::UInt32(v) => v[index] == 0,
            Column::UInt64(v) => v[index] == 0,
            Column::Int32(v) => v[index] == 0,
            Column::Int64(v) => v[index] == 0,
            Column::Float64(v) => v[index].to_bits() == 0,
            Column::String(v) => v[index].is_empty(),
            _ => false,
        }
    }

    /// Positions of non-default rows within `start..start + len`, relative
    /// to `start`.
    pub fn non_default_positions(&self, start: usize, len: usize) -> Result<Vec<u64>> {
        verify_arg!(len, start + len <= self.len());
        if !self.is_scalar() {
            return Err(Error::invalid_operation(format!(
                "sparse positions of {}",
                self.structure_name()
            )));
        }
        Ok((start..start + len)
            .filter(|&i| !self.is_default_at(i))
            .map(|i| (i - start) as u64)
            .collect())
    }

    /// Fraction of rows holding the default value; `0.0` for an empty or
    /// composite column.
    pub fn default_ratio(&self) -> f64 {
        if self.is_empty() || !self.is_scalar() {
            return 0.0;
        }
        let defaults = (0..self.len()).filter(|&i| self.is_default_at(i)).count();
        defaults as f64 / self.len() as f64
    }

    /// Expands sparse values into a full column of `len` rows.
    ///
    /// `values` holds one row per entry of `positions`; all other rows are
    /// set to the default value. `positions` must be strictly increasing and
    /// below `len`.
    pub fn from_sparse(values: &Column, positions: &[u64], len: usize) -> Result<Column> {
        verify_arg!(positions, positions.len() == values.len());
        verify_arg!(
            positions,
            positions.windows(2).all(|w| w[0] < w[1])
                && positions.last().is_none_or(|&p| (p as usize) < len)
        );

        fn scatter<T: Clone + Default>(values: &[T], positions: &[u64], len: usize) -> Vec<T> {
            let mut full = vec![T::default(); len];
            for (value, &pos) in values.iter().zip(positions) {
                full[pos as usize] = value.clone();
            }
            full
        }

        Ok(match values {
            Column::UInt8(v) => Column::UInt8(scatter(v, positions, len)),
            Column::UInt32(v) => Column::UInt32(scatter(v, positions, len)),
            Column::UInt64(v) => Column::UInt64(scatter(v, positions, len)),
            Column::Int32(v) => Column::Int32(scatter(v, positions, len)),
            Column::Int64(v) => Column::Int64(scatter(v, positions, len)),
            Column::Float64(v) => Column::Float64(scatter(v, positions, len)),
            Column::String(v) => Column::String(scatter(v, positions, len)),
            other => {
                return Err(Error::invalid_operation(format!(
                    "sparse expansion of {}",
                    other.structure_name()
                )));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::column::Column;

    #[test]
    fn test_non_default_positions() {
        let column = Column::from(vec![0i32, 5, 0, 0, 7, 0]);
        assert_eq!(column.non_default_positions(0, 6).unwrap(), vec![1, 4]);
        assert_eq!(column.non_default_positions(2, 3).unwrap(), vec![2]);
        assert!(column.non_default_positions(4, 5).is_err());
        assert!((column.default_ratio() - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_sparse() {
        let values = Column::from(vec!["a", "b"]);
        let full = Column::from_sparse(&values, &[0, 3], 5).unwrap();
        assert_eq!(full, Column::from(vec!["a", "", "", "b", ""]));

        assert!(Column::from_sparse(&values, &[3, 0], 5).is_err());
        assert!(Column::from_sparse(&values, &[0, 5], 5).is_err());
        assert!(Column::from_sparse(&values, &[0], 5).is_err());
    }

    #[test]
    fn test_negative_zero_is_not_default() {
        let column = Column::from(vec![0.0f64, -0.0, 1.0]);
        assert_eq!(column.non_default_positions(0, 3).unwrap(), vec![1, 2]);
    }
}

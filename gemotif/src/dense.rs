//! Dense matrix storage with a constant number of columns.

use std::fmt::Debug;
use std::fmt::Error as FmtError;
use std::fmt::Formatter;
use std::ops::Index;
use std::ops::IndexMut;
use std::slice::ChunksExact;
use std::slice::ChunksExactMut;

use typenum::marker_traits::NonZero;
use typenum::marker_traits::Unsigned;

// --- DenseMatrix -------------------------------------------------------------

/// A row-major dense matrix with a constant number of columns.
#[derive(Clone, PartialEq, Eq)]
pub struct DenseMatrix<T: Default + Copy, C: Unsigned + NonZero> {
    data: Vec<T>,
    rows: usize,
    _columns: std::marker::PhantomData<C>,
}

impl<T: Default + Copy, C: Unsigned + NonZero> DenseMatrix<T, C> {
    /// Create a new matrix with the given number of rows.
    pub fn new(rows: usize) -> Self {
        Self {
            data: vec![T::default(); rows * C::USIZE],
            rows,
            _columns: std::marker::PhantomData,
        }
    }

    /// Create a new dense matrix from an iterable of rows.
    ///
    /// # Panics
    ///
    /// Panics if any of the rows does not have the number of elements
    /// corresponding to the dense matrix columns.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator,
        <I as IntoIterator>::Item: AsRef<[T]>,
    {
        let mut data = Vec::new();
        let mut n = 0;
        for row in rows {
            let row = row.as_ref();
            assert_eq!(row.len(), C::USIZE, "invalid row length");
            data.extend_from_slice(row);
            n += 1;
        }
        Self {
            data,
            rows: n,
            _columns: std::marker::PhantomData,
        }
    }

    /// The number of columns of the matrix.
    #[inline]
    pub const fn columns(&self) -> usize {
        C::USIZE
    }

    /// The number of rows of the matrix.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Iterate over the rows of the matrix.
    #[inline]
    pub fn iter(&self) -> ChunksExact<'_, T> {
        self.data.chunks_exact(C::USIZE)
    }

    /// Returns an iterator that allows modifying each row.
    #[inline]
    pub fn iter_mut(&mut self) -> ChunksExactMut<'_, T> {
        self.data.chunks_exact_mut(C::USIZE)
    }

    /// Fill the entire matrix with a constant value.
    #[inline]
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Get the elements of the matrix as a single flat slice.
    #[inline]
    pub fn as_flat(&self) -> &[T] {
        &self.data
    }
}

impl<T: Default + Copy + Debug, C: Unsigned + NonZero> Debug for DenseMatrix<T, C> {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Default + Copy, C: Unsigned + NonZero> Index<usize> for DenseMatrix<T, C> {
    type Output = [T];
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        let row = C::USIZE * index;
        &self.data[row..row + C::USIZE]
    }
}

impl<T: Default + Copy, C: Unsigned + NonZero> IndexMut<usize> for DenseMatrix<T, C> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        let row = C::USIZE * index;
        &mut self.data[row..row + C::USIZE]
    }
}

impl<'a, T: Default + Copy, C: Unsigned + NonZero> IntoIterator for &'a DenseMatrix<T, C> {
    type Item = &'a [T];
    type IntoIter = ChunksExact<'a, T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T: Default + Copy, C: Unsigned + NonZero> IntoIterator for &'a mut DenseMatrix<T, C> {
    type Item = &'a mut [T];
    type IntoIter = ChunksExactMut<'a, T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod test {
    use typenum::consts::U3;
    use typenum::consts::U4;

    use super::*;

    #[test]
    fn test_from_rows() {
        let dense = DenseMatrix::<u32, U3>::from_rows([[1, 2, 3], [4, 5, 6]]);
        assert_eq!(dense.rows(), 2);
        assert_eq!(dense.columns(), 3);
        assert_eq!(&dense[1], &[4, 5, 6]);
        assert_eq!(dense.as_flat(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_iter_mut() {
        let mut dense = DenseMatrix::<u64, U4>::new(4);
        for i in 0..4 {
            dense[i][0] = (i + 1) as u64;
        }
        assert_eq!(dense[0][0], 1);
        assert_eq!(dense[3][0], 4);

        for row in dense.iter_mut() {
            row[0] *= 4;
        }
        assert_eq!(dense[0][0], 4);
        assert_eq!(dense[1][0], 8);
        assert_eq!(dense[2][0], 12);
        assert_eq!(dense[3][0], 16);
        assert_eq!(dense.iter().len(), 4);
    }

    #[test]
    fn test_fill() {
        let mut dense = DenseMatrix::<f64, U4>::new(3);
        dense.fill(0.25);
        assert!(dense.iter().all(|row| row.iter().sum::<f64>() == 1.0));
    }
}

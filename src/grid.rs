use rayon::prelude::*;

/// Row-major flat grid of baked samples. No per-cell objects.
#[derive(Clone, Debug)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            data: vec![T::default(); w * h],
            w,
            h,
        }
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.w && y < self.h);
        y * self.w + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: T) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }
}

impl<T: Copy + Default + Send + Sync> Grid<T> {
    /// Evaluate `f` at every cell, one rayon task per row.
    pub fn par_from_fn(w: usize, h: usize, f: impl Fn(usize, usize) -> T + Sync) -> Self {
        let mut grid = Self::new(w, h);
        if w == 0 {
            return grid;
        }
        grid.data
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = f(x, y);
                }
            });
        grid
    }

    /// Project every cell through `f` into a new grid of the same shape.
    pub fn par_map<U: Copy + Default + Send + Sync>(&self, f: impl Fn(T) -> U + Sync) -> Grid<U> {
        Grid {
            data: self.data.par_iter().map(|v| f(*v)).collect(),
            w: self.w,
            h: self.h,
        }
    }
}

impl Grid<f32> {
    /// Smallest and largest finite value, or `None` for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_par_from_fn_is_row_major() {
        let g = Grid::par_from_fn(4, 3, |x, y| (y * 10 + x) as u32);
        assert_eq!(g.get(3, 2), 23);
        assert_eq!(g.data[g.idx(1, 1)], 11);
        assert_eq!(g.data.len(), 12);
    }

    #[test]
    fn test_min_max() {
        let mut g = Grid::<f32>::new(2, 2);
        g.set(0, 0, -3.0);
        g.set(1, 1, 7.5);
        g.set(1, 0, f32::NAN);
        assert_eq!(g.min_max(), Some((-3.0, 7.5)));
        assert_eq!(Grid::<f32>::new(0, 0).min_max(), None);
    }

    #[test]
    fn test_empty_grid() {
        let g = Grid::par_from_fn(0, 5, |_, _| 1u8);
        assert!(g.data.is_empty());
    }
}

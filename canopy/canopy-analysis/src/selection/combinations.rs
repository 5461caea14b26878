//! Lexicographic k-of-n index combinations.

/// Restartable generator of all size-`k` subsets of `0..n`, in lexicographic
/// order.
///
/// [`Combinations::next_combination`] lends a view of an internal buffer that
/// is overwritten on the following call; copy it before keeping it. The
/// [`Iterator`] impl does that copy for you.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }

    /// Rewind to the first combination
    pub fn reset(&mut self) {
        self.indices.clear();
        self.indices.extend(0..self.k);
        self.started = false;
        self.done = self.k > self.n;
    }

    /// Advance and borrow the next combination.
    pub fn next_combination(&mut self) -> Option<&[usize]> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.indices);
        }

        // Rightmost position that can still move right
        let (n, k) = (self.n, self.k);
        let Some(pos) = (0..k).rev().find(|&i| self.indices[i] < n - k + i) else {
            self.done = true;
            return None;
        };

        self.indices[pos] += 1;
        for i in (pos + 1)..k {
            self.indices[i] = self.indices[i - 1] + 1;
        }
        Some(&self.indices)
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_combination().map(<[usize]>::to_vec)
    }
}

/// `C(n, k)` as a float, so huge search spaces overflow to infinity instead
/// of wrapping.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64).round()
}

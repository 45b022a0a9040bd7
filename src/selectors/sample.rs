use std::ops::Shr;

use fastrand::Rng;

use crate::{
    error::SelectError,
    frame::Dataset,
    logging::select_log,
    row_set::{BitmapRowSet, RowId, RowSet},
    selector::{resolve_alone, selector_ops, DataSelector, EvalScope, Selector},
};

/// Random sample of `n` rows, optionally drawn from the rows of a base selector.
///
/// When fewer than `n` candidates exist, every candidate is returned. Without
/// a seed every evaluation draws from a fresh generator.
#[derive(Debug, Clone)]
pub struct Sample {
    n: usize,
    base: Option<Selector>,
    replace: bool,
    seed: Option<u64>,
}

impl Sample {
    /// Samples `n` rows of the whole dataset, without replacement.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            base: None,
            replace: false,
            seed: None,
        }
    }

    /// A copy of this sample that draws from the rows of `base`.
    pub fn with_base(&self, base: impl Into<Selector>) -> Self {
        Self {
            base: Some(base.into()),
            ..self.clone()
        }
    }

    /// Draw with replacement. Repeated draws of a row count once.
    pub fn replace(self, replace: bool) -> Self {
        Self { replace, ..self }
    }

    /// Seed the generator so evaluations are reproducible.
    pub fn seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    /// Requested number of rows.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Selector the sample draws from, if any.
    pub fn base(&self) -> Option<&Selector> {
        self.base.as_ref()
    }

    fn draw(&self, candidates: BitmapRowSet) -> BitmapRowSet {
        if candidates.len() < self.n {
            return candidates;
        }
        let mut rng = match self.seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };
        let mut pool: Vec<RowId> = candidates.to_vec();
        let rows: BitmapRowSet = if self.replace {
            (0..self.n).map(|_| pool[rng.usize(..pool.len())]).collect()
        } else {
            for i in 0..self.n {
                let j = rng.usize(i..pool.len());
                pool.swap(i, j);
            }
            pool[..self.n].iter().copied().collect()
        };
        select_log!(
            log::Level::Debug,
            "sample",
            "candidates={} n={} replace={} seeded={} drawn={}",
            pool.len(),
            self.n,
            self.replace,
            self.seed.is_some(),
            rows.len()
        );
        rows
    }
}

impl DataSelector for Sample {
    fn get_indices(&self, dataset: &Dataset) -> Result<BitmapRowSet, SelectError> {
        resolve_alone(self, dataset)
    }

    fn resolve(&self, scope: &mut EvalScope<'_>) -> Result<BitmapRowSet, SelectError> {
        let candidates = match &self.base {
            Some(base) => scope.resolve(base)?,
            None => scope.dataset().full_index(),
        };
        Ok(self.draw(candidates))
    }
}

selector_ops!(Sample => index);

/// `base >> sample` samples from the rows of `base`.
impl Shr<Sample> for Selector {
    type Output = Selector;

    fn shr(self, sample: Sample) -> Selector {
        Selector::from(sample.with_base(self))
    }
}

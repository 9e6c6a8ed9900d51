use serde::{Deserialize, Serialize};
use std::ops::Range;

/// One walk-forward (train, test) window pair over dataset row indices.
///
/// Both ranges are contiguous and every train index precedes every test index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fold {
    pub index: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
}

impl Fold {
    pub fn train_len(&self) -> usize {
        self.train.len()
    }
}

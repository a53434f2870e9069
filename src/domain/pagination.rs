use serde::{Deserialize, Serialize};

pub const MAX_TAKE: u64 = 100;

/// Skip/take window of a list operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub skip: u64,
    pub take: u64,
}

impl Pagination {
    pub fn new(skip: u64, take: u64) -> Self {
        Self { skip, take }
    }

    /// Effective `(skip, take)`: take is clamped to [`MAX_TAKE`], and an
    /// all-zero window means the first page.
    pub fn bounds(&self) -> (u64, u64) {
        if self.skip == 0 && self.take == 0 {
            return (0, MAX_TAKE);
        }
        (self.skip, self.take.min(MAX_TAKE))
    }
}

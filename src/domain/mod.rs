pub mod account;
pub mod product;
pub mod order;
pub mod pagination;

pub use account::*;
pub use product::*;
pub use order::*;
pub use pagination::*;

pub mod policy;
pub mod range;

pub use policy::{NavDirection, SelectionPolicy};
pub use range::CellRange;

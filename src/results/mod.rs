mod adapter;
mod result_set;
mod row;

pub use adapter::adapt;
pub use result_set::{ResultSet, RowList};
pub use row::Row;

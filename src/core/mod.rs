// Core modules implementing the lazy result views, key resolution, and error modeling.
pub mod error;
pub mod key;
pub mod mapper;
pub mod raw;
pub mod result_set;
pub mod row;
pub mod value;

pub mod db;
pub mod domain;

pub use db::{ReadingStore, StoreError};
pub use domain::{Reading, Sample};

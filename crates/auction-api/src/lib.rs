pub mod api;
pub mod arguments;
pub mod auction;
pub mod contract;
pub mod run;
pub mod submission;

pub use self::run::{run, start};

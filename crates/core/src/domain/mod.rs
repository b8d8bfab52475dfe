pub mod catalog;
pub mod deal;
pub mod proposal;
pub mod quote;

pub mod emi;
pub mod portfolio;
pub mod quote;
pub mod spend;
pub mod ui;

pub mod cash_flow;
pub mod financing;
pub mod investment;
pub mod rental;

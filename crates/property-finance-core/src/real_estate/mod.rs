pub mod investment;
pub mod monthly;
pub mod rental;
pub mod returns;

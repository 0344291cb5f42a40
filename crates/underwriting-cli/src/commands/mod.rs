pub mod investment;
pub mod loan_sizing;
pub mod time_value;

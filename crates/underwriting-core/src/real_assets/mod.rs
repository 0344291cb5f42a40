pub mod investment;
pub mod loan_sizing;

pub mod error;
pub mod health;
pub mod investment;
pub mod loan_sizing;

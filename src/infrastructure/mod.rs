pub mod observability;
pub mod persistence;
pub mod providers;

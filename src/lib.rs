pub mod alerts;
pub mod calendar;
pub mod checkers;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod regime;
pub mod scoring;
pub mod supervisor;
pub mod workers;

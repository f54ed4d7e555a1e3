pub mod migrations;
pub mod repository;
pub mod schedule_store;

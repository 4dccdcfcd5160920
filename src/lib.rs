// Library for tests to access modules

pub mod alerts;
pub mod collector;
pub mod config;
pub mod docker_repo;
pub mod health;
pub mod history_repo;
pub mod insights;
pub mod models;
pub mod prometheus;
pub mod routes;
pub mod summary;
pub mod sysinfo_repo;
pub mod version;
pub mod worker;

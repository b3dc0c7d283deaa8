pub mod changes;
pub mod dashboard;
pub mod dates;
pub mod db;
pub mod error;
pub mod live;
pub mod models;
pub mod presenter;
pub mod repository;
pub mod service;
pub mod usda;

#[cfg(test)]
mod test_support;

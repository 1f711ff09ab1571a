pub mod deadline;
pub mod errors;
pub mod models;
pub mod ports;
pub mod rotation;
pub mod service;
pub mod session;
pub mod verification;

#[cfg(test)]
pub(crate) mod mocks;

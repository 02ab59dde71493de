//! Quickstart services.
//!
//! Each module holds one handler, its input type and a `register` helper
//! that adds it to a [`WorkerBuilder`]:
//!
//! - [`data_service`] - `data-service.transform`
//! - [`compute_service`] - `compute-service::compute`
//! - [`hello_step`] - `HelloFromPython` event step
//! - [`greeting_service`] - `hello-service.greet`

pub mod compute_service;
pub mod data_service;
pub mod greeting_service;
pub mod hello_step;

use crate::WorkerBuilder;

/// Register every quickstart handler on `builder`.
pub fn register_all(builder: WorkerBuilder) -> WorkerBuilder {
    let builder = data_service::register(builder);
    let builder = compute_service::register(builder);
    let builder = greeting_service::register(builder);
    hello_step::register(builder)
}

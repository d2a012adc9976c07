//! Background workers.

mod medication;

pub use medication::{next_run_delay, AutoCompleteWorker};

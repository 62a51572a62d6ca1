//! Shared models for the end-to-end calibration tests.

pub mod test_models;

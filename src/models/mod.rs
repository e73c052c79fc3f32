pub mod autoreg;
pub mod base_model;
pub mod multi_autoreg;

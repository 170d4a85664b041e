pub mod person;

pub use person::*;

// Services layer for business logic
// Services coordinate storage; handlers own parsing and validation

pub mod log;

pub use log::LogService;

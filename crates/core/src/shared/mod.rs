pub mod cascade_resolver;
pub mod constants;
pub mod image;
pub mod region;

pub mod detection;
pub mod identity;
pub mod imaging;
pub mod matching;
pub mod pipeline;
pub mod shared;

pub mod compare;
pub mod export;
pub mod normalize;
pub mod quote;

pub mod aggregate;
pub mod duration;
pub mod ids;
pub mod metadata;
pub mod normalize;
pub mod takeout;

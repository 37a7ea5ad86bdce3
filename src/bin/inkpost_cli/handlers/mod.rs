pub mod identity;
pub mod posts;

//! Application services: the content service on the server side and the
//! author-identity flow on the client side.

pub mod content;
pub mod error;
pub mod identity;
pub mod posts;
pub mod repos;

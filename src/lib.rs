//! inkpost: a content API for a small personal blog, plus the client-side author
//! identity flow that keeps a locally held name in step with the posts written under it.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

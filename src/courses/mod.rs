//! Course data retrieval, gated on a live session.

pub mod repository;

pub use repository::CourseRepository;

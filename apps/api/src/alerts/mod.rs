pub mod dispatcher;
pub mod handlers;
pub mod repository;
pub mod scheduler;

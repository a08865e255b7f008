pub mod alert;
pub mod application;
pub mod favorite;
pub mod listing;
pub mod notification;
pub mod profile;
pub mod user;

pub mod article;
pub mod event;
pub mod rating;

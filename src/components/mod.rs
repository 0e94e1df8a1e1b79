pub mod animation;
pub mod history;
pub mod tools;

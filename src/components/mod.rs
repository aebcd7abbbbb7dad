pub mod colors;
pub mod history;

pub mod brush;
pub mod locate;
pub mod nan_fill;
pub mod scripting;

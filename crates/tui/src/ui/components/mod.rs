pub mod hints;
pub mod money;
pub mod popup;
pub mod toast;

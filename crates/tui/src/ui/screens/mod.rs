pub mod bills;
pub mod entry;
pub mod history;
pub mod login;
pub mod picture;

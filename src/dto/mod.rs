pub mod auth;
pub mod borrowings;
pub mod categories;
pub mod items;
pub mod stats;

pub mod auth_service;
pub mod borrowing_service;
pub mod category_service;
pub mod item_service;
pub mod stats_service;

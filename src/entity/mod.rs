pub mod borrowings;
pub mod categories;
pub mod items;
pub mod sea_orm_active_enums;
pub mod users;

pub use borrowings::Entity as Borrowings;
pub use categories::Entity as Categories;
pub use items::Entity as Items;
pub use users::Entity as Users;

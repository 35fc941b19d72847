//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables. Each entity has a Model
//! struct for data and an Entity struct for operations.

pub mod admin_session;
pub mod admin_user;
pub mod chain;
pub mod event;
pub mod feedback;
pub mod notice;
pub mod payout;
pub mod price;
pub mod price_log;
pub mod product;
pub mod product_option;
pub mod search_log;
pub mod staff;

// Re-export specific types to avoid conflicts
pub use admin_session::Entity as AdminSession;
pub use admin_user::{Entity as AdminUser, Model as AdminUserModel};
pub use chain::{Column as ChainColumn, Entity as Chain, Model as ChainModel};
pub use event::{Entity as Event, Model as EventModel};
pub use feedback::{Entity as Feedback, Model as FeedbackModel};
pub use notice::{Entity as Notice, Model as NoticeModel};
pub use payout::{Entity as Payout, Model as PayoutModel};
pub use price::{Column as PriceColumn, Entity as Price, Model as PriceModel};
pub use price_log::{Column as PriceLogColumn, Entity as PriceLog, Model as PriceLogModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_option::{Entity as ProductOption, Model as ProductOptionModel};
pub use search_log::{Entity as SearchLog, Model as SearchLogModel};
pub use staff::{Column as StaffColumn, Entity as Staff, Model as StaffModel};

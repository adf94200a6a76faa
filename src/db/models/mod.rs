//! Database models, one file per table.

mod forum_category;
mod notification;
mod user;

pub use self::forum_category::*;
pub use self::notification::*;
pub use self::user::*;

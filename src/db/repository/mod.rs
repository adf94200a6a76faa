mod forum_category;
mod notification;
mod user;

pub use forum_category::ForumCategoryRepository;
pub use notification::NotificationRepository;
pub use user::UserRepository;

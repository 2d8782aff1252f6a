// Shared models for the NexusQR API

pub mod page;
pub mod user;

pub use page::{Page, PageMeta, PageOptions, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use user::{NewUser, User, UserProfile};

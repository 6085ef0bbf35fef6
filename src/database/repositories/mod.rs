//! Database repositories module
//!
//! This module contains all repository implementations for data access.
//! Every tenant-owned query is scoped by `church_id`.

pub mod attendance;
pub mod church;
pub mod church_user;
pub mod event;
pub mod member;
pub mod subscription;
pub mod super_admin;
pub mod visitor;

// Re-export repositories
pub use attendance::AttendanceRepository;
pub use church::ChurchRepository;
pub use church_user::{ChurchUserChanges, ChurchUserRepository};
pub use event::EventRepository;
pub use member::MemberRepository;
pub use subscription::{SubscriptionChanges, SubscriptionRepository};
pub use super_admin::SuperAdminRepository;
pub use visitor::{NewVisitor, VisitorRepository};

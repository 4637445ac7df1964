pub mod booking;
pub mod conflict;
pub mod eligibility;
pub mod lifecycle;
pub mod notifications;
pub mod schedule;

pub use booking::BookingService;
pub use conflict::ConflictDetectionService;
pub use lifecycle::LifecycleService;
pub use notifications::{Notifier, TracingNotifier};

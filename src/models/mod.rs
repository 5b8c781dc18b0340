pub mod company;
pub mod metrics;
pub mod notification;
pub mod raw_task;
pub mod tracking;
pub mod user;

pub use company::{Company, CompanyCounts, NewCompany};
pub use metrics::{Distribution, TimelineBucket, TrackingMetrics};
pub use notification::Notification;
pub use raw_task::{CustomFieldEntry, FieldValue, ParentRef, RawExternalTask};
pub use tracking::{
    Documentation, ParsedTitle, Regulatory, Schedule, Tracking, TrackingStatus, Transport,
    UnmatchedRecord,
};
pub use user::{ProfileChanges, Role, UserProfile};

pub mod company_sync;
pub mod field_resolver;
pub mod keyed_store;
pub mod metrics_aggregator;
pub mod notes_extractor;
pub mod notifications;
pub mod record_assembler;
pub mod response_cache;
pub mod task_source;
pub mod title_parser;
pub mod tracking_service;
pub mod user_admin;

pub use company_sync::{CompanySyncService, SyncReport};
pub use notifications::{NotificationService, WatermarkStore};
pub use response_cache::ResponseCache;
pub use task_source::{AsanaTaskSource, TaskSource};
pub use tracking_service::{TrackingQuery, TrackingResponse, TrackingService};
pub use user_admin::UserAdminService;

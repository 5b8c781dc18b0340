pub mod account;
pub mod companies;
pub mod health;
pub mod notifications;
pub mod sync_companies;
pub mod tracking;
pub mod users;

pub use account::*;
pub use companies::*;
pub use health::*;
pub use notifications::*;
pub use sync_companies::*;
pub use tracking::*;
pub use users::*;

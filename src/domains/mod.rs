//! Domains Module
//!
//! Backing accessor traits per domain and their read-through decorators over
//! the shared cache store.

pub mod category;
pub mod channel;
pub mod invite;
pub mod payment;
pub mod read_through;
pub mod search_data;

pub use category::{CachedCategorySource, CategorySource};
pub use channel::{CachedChannelSource, ChannelSource};
pub use invite::{CachedInviteSource, InviteSource};
pub use payment::{CachedPaymentSource, PaymentSource};
pub use read_through::ReadThrough;
pub use search_data::{CachedSearchSource, Catalog, InMemorySearchSource, SearchSource};

//! Restaurant listing: ordering, sponsored pinning and load-more.

mod item;
mod order;
mod session;
mod window;

pub use item::DisplayItem;
pub use order::{arrange, order_items, shuffle, sort, OrderMode};
pub use session::{Listing, SessionKey, ShuffleSession};
pub use window::VisibleWindow;

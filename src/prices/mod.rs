//! Last known price per topic.

mod store;

pub use store::PriceStore;

mod store;

pub use store::{link_tree, load, save};

mod cluster;
mod edit;
mod job;
mod stats;

pub use cluster::{Cluster, ClusterRef, Item, Phone, PhoneRef, Stats};
pub use edit::{create_item, edit_item, DeletionQueue, ItemFields, ItemKind, DELETION_TAG};
pub use job::{advance_jobs, JobState};
pub use stats::compute_stats;

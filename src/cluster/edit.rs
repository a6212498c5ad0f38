use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use tracing::info;

use crate::error::{DeckError, Result};

use super::cluster::{Cluster, ClusterRef, Item, Phone};

/// Suffix shown on a name while the item sits in the pending-deletion set.
pub const DELETION_TAG: &str = " (queued for deletion)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Cluster,
    Phone,
}

impl Default for ItemKind {
    fn default() -> Self {
        ItemKind::Phone
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ItemKind::Cluster => write!(f, "cluster"),
            ItemKind::Phone => write!(f, "phone"),
        }
    }
}

/// Field values collected by the create/edit form. The hardware fields are
/// ignored for clusters.
#[derive(Debug, Clone, Default)]
pub struct ItemFields {
    pub name: String,
    pub desc: String,
    pub ram: String,
    pub cpu: String,
    pub cpu_speed: String,
}

fn validate(fields: &ItemFields) -> Result<()> {
    if fields.name.trim().is_empty() {
        return Err(DeckError::Validation("name is required".to_string()));
    }
    if fields.desc.trim().is_empty() {
        return Err(DeckError::Validation("description is required".to_string()));
    }
    Ok(())
}

/// Builds a new item from the form fields and appends it to `parent`.
/// A new cluster starts with a stopped job at zero progress.
pub fn create_item(parent: &ClusterRef, kind: ItemKind, fields: ItemFields) -> Result<Item> {
    validate(&fields)?;
    let item = match kind {
        ItemKind::Cluster => {
            let cluster = Rc::new(RefCell::new(Cluster {
                name: fields.name,
                desc: fields.desc,
                parent: Rc::downgrade(parent),
                ..Default::default()
            }));
            parent.borrow_mut().children_clusters.push(cluster.clone());
            Item::Cluster(cluster)
        }
        ItemKind::Phone => {
            let phone = Rc::new(RefCell::new(Phone {
                name: fields.name,
                desc: fields.desc,
                ram: fields.ram,
                cpu: fields.cpu,
                cpu_speed: fields.cpu_speed,
                cluster: Rc::downgrade(parent),
            }));
            parent.borrow_mut().children_phones.push(phone.clone());
            Item::Phone(phone)
        }
    };
    info!("[EDIT] Created {} '{}'", kind, item.name());
    Ok(item)
}

/// Replaces the fields of an existing item in place. Position, ownership
/// and job state are untouched.
pub fn edit_item(item: &Item, fields: ItemFields) -> Result<()> {
    validate(&fields)?;
    match item {
        Item::Cluster(cluster) => {
            let mut cluster = cluster.borrow_mut();
            cluster.name = fields.name;
            cluster.desc = fields.desc;
        }
        Item::Phone(phone) => {
            let mut phone = phone.borrow_mut();
            phone.name = fields.name;
            phone.desc = fields.desc;
            phone.ram = fields.ram;
            phone.cpu = fields.cpu;
            phone.cpu_speed = fields.cpu_speed;
        }
    }
    info!("[EDIT] Edited '{}'", item.name());
    Ok(())
}

/// Items marked for deletion but not yet removed. A mark annotates the
/// item's name so the list shows what is about to go.
#[derive(Debug, Default)]
pub struct DeletionQueue {
    pending: Vec<Item>,
}

impl DeletionQueue {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_marked(&self, item: &Item) -> bool {
        self.pending.iter().any(|marked| marked.is_same(item))
    }

    /// Idempotent, marking twice leaves one entry and one name tag.
    pub fn mark(&mut self, item: &Item) {
        if self.is_marked(item) {
            return;
        }
        tag_name(item);
        self.pending.push(item.clone());
    }

    pub fn unmark(&mut self, item: &Item) {
        if let Some(pos) = self.pending.iter().position(|marked| marked.is_same(item)) {
            let marked = self.pending.remove(pos);
            untag_name(&marked);
        }
    }

    /// Names currently queued, for the status panel.
    pub fn names(&self) -> Vec<String> {
        self.pending.iter().map(|item| item.name()).collect()
    }

    /// Drops every marked child from `parent`, both sequences in one pass,
    /// keeping the relative order of the survivors. Clears the queue.
    pub fn confirm(&mut self, parent: &ClusterRef) {
        let removed = self.pending.len();
        {
            let mut parent = parent.borrow_mut();
            let pending = &self.pending;
            parent.children_clusters.retain(|child| {
                !pending
                    .iter()
                    .any(|marked| matches!(marked, Item::Cluster(c) if Rc::ptr_eq(c, child)))
            });
            parent.children_phones.retain(|child| {
                !pending
                    .iter()
                    .any(|marked| matches!(marked, Item::Phone(p) if Rc::ptr_eq(p, child)))
            });
        }
        self.pending.clear();
        info!("[EDIT] Deleted {} item(s)", removed);
    }

    /// Puts every marked name back and forgets the queue. Nothing is removed.
    pub fn cancel(&mut self) {
        for item in &self.pending {
            untag_name(item);
        }
        self.pending.clear();
    }
}

fn tag_name(item: &Item) {
    match item {
        Item::Cluster(cluster) => {
            let mut cluster = cluster.borrow_mut();
            if !cluster.name.ends_with(DELETION_TAG) {
                cluster.name.push_str(DELETION_TAG);
            }
        }
        Item::Phone(phone) => {
            let mut phone = phone.borrow_mut();
            if !phone.name.ends_with(DELETION_TAG) {
                phone.name.push_str(DELETION_TAG);
            }
        }
    }
}

fn untag_name(item: &Item) {
    match item {
        Item::Cluster(cluster) => {
            let mut cluster = cluster.borrow_mut();
            if cluster.name.ends_with(DELETION_TAG) {
                let keep = cluster.name.len() - DELETION_TAG.len();
                cluster.name.truncate(keep);
            }
        }
        Item::Phone(phone) => {
            let mut phone = phone.borrow_mut();
            if phone.name.ends_with(DELETION_TAG) {
                let keep = phone.name.len() - DELETION_TAG.len();
                phone.name.truncate(keep);
            }
        }
    }
}

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use super::job::JobState;

pub type ClusterRef = Rc<RefCell<Cluster>>;
pub type PhoneRef = Rc<RefCell<Phone>>;

/// A grouping of phones and sub-clusters. Children are owned, the parent
/// link is weak so the tree never forms an ownership cycle.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Cluster {
    #[serde(rename = "Name", skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "Desc", skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(rename = "Stats")]
    pub stats: Stats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children_clusters: Vec<ClusterRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children_phones: Vec<PhoneRef>,
    // never stored, rebuilt by store::link_tree after every load
    #[serde(skip)]
    pub parent: Weak<RefCell<Cluster>>,
    #[serde(skip)]
    pub job: JobState,
    #[serde(skip)]
    pub job_progress: f64,
}

impl Default for Cluster {
    fn default() -> Self {
        Cluster {
            name: "".to_string(),
            desc: "".to_string(),
            stats: Stats::default(),
            children_clusters: Vec::new(),
            children_phones: Vec::new(),
            parent: Weak::new(),
            job: JobState::Stopped,
            job_progress: 0.0,
        }
    }
}

impl Cluster {
    pub fn title(&self) -> String {
        format!("🌐{}", self.name)
    }

    /// Titles from the root down to this cluster, joined with " > ".
    pub fn path(&self) -> String {
        let mut parts = vec![self.title()];
        let mut current = self.parent.upgrade();
        while let Some(cluster) = current {
            parts.push(cluster.borrow().title());
            current = cluster.borrow().parent.upgrade();
        }
        parts.reverse();
        parts.join(" > ")
    }

    pub fn stats_line(&self) -> String {
        format!(
            "Average RAM: {:.2} GB, Average CPU: {:.2} Cores",
            self.stats.avg_ram, self.stats.avg_cpu
        )
    }

    /// Plain-text listing of the whole subtree, phones under their cluster.
    pub fn preview(&self) -> String {
        let mut out = String::new();
        self.preview_into(&mut out, 0);
        out
    }

    fn preview_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        out.push_str(&format!("{}{} - {}\n", pad, self.title(), self.desc));
        for phone in &self.children_phones {
            let phone = phone.borrow();
            out.push_str(&format!("{}  📱 {} - {}\n", pad, phone.name, phone.desc));
        }
        for child in &self.children_clusters {
            child.borrow().preview_into(out, depth + 1);
        }
    }
}

/// Subtree averages over every phone below the cluster. Recomputed before
/// each redraw, stored so serialization keeps the last known values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    #[serde(rename = "AvgRAM", skip_serializing_if = "is_zero")]
    pub avg_ram: f64,
    #[serde(rename = "AvgCPU", skip_serializing_if = "is_zero")]
    pub avg_cpu: f64,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

/// A single monitored device. The hardware fields are free-form text like
/// "8GB", the stats pass pulls the leading number out of them.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Phone {
    #[serde(rename = "Name", skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "Desc", skip_serializing_if = "String::is_empty")]
    pub desc: String,
    #[serde(rename = "RAM", skip_serializing_if = "String::is_empty")]
    pub ram: String,
    #[serde(rename = "CPU", skip_serializing_if = "String::is_empty")]
    pub cpu: String,
    #[serde(rename = "CPUSpeed", skip_serializing_if = "String::is_empty")]
    pub cpu_speed: String,
    #[serde(skip)]
    pub cluster: Weak<RefCell<Cluster>>,
}

impl Default for Phone {
    fn default() -> Self {
        Phone {
            name: "".to_string(),
            desc: "".to_string(),
            ram: "".to_string(),
            cpu: "".to_string(),
            cpu_speed: "".to_string(),
            cluster: Weak::new(),
        }
    }
}

impl Phone {
    pub fn title(&self) -> String {
        self.name.clone()
    }

    /// Multi-line list block. The description line is dropped when empty,
    /// stored phones are not required to carry one.
    pub fn status_string(&self) -> String {
        let mut lines = vec![format!("📱 {}", self.name)];
        if !self.desc.is_empty() {
            lines.push(format!("    {}", self.desc));
        }
        lines.push(format!(
            "    RAM: {}, CPU: {}, CPU Speed: {}",
            self.ram, self.cpu, self.cpu_speed
        ));
        lines.join("\n")
    }
}

/// One entry of the browse list, either kind behind a shared handle.
#[derive(Debug, Clone)]
pub enum Item {
    Cluster(ClusterRef),
    Phone(PhoneRef),
}

impl Item {
    pub fn name(&self) -> String {
        match self {
            Item::Cluster(cluster) => cluster.borrow().name.clone(),
            Item::Phone(phone) => phone.borrow().name.clone(),
        }
    }

    pub fn title(&self) -> String {
        match self {
            Item::Cluster(cluster) => cluster.borrow().title(),
            Item::Phone(phone) => phone.borrow().title(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Item::Cluster(cluster) => cluster.borrow().desc.clone(),
            Item::Phone(phone) => phone.borrow().desc.clone(),
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, Item::Cluster(_))
    }

    /// Pointer identity, not structural equality.
    pub fn is_same(&self, other: &Item) -> bool {
        match (self, other) {
            (Item::Cluster(a), Item::Cluster(b)) => Rc::ptr_eq(a, b),
            (Item::Phone(a), Item::Phone(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

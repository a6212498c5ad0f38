use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;

use tracing::info;

use crate::cluster::{Cluster, ClusterRef, JobState};
use crate::error::Result;

/// Writes the whole tree under `root` to `path` as indented JSON. Job state
/// and back-references never reach the file.
pub fn save(root: &ClusterRef, path: &Path) -> Result<()> {
    let data = serde_json::to_vec_pretty(&*root.borrow())?;
    fs::write(path, data)?;
    info!("[STORE] Saved cluster tree to {}", path.display());
    Ok(())
}

/// Reads the tree from `path`. A missing file starts an empty root and
/// seeds the file with `{}` so the next load is well-formed. A file that
/// exists but does not parse is an error, not an empty tree, so a corrupt
/// file is never silently overwritten on the next save.
pub fn load(path: &Path) -> Result<ClusterRef> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            info!("[STORE] No file at {}, starting empty", path.display());
            fs::write(path, b"{}")?;
            b"{}".to_vec()
        }
        Err(err) => return Err(err.into()),
    };
    let root: Cluster = serde_json::from_slice(&raw)?;
    let root = Rc::new(RefCell::new(root));
    link_tree(&root);
    info!("[STORE] Loaded cluster tree from {}", path.display());
    Ok(root)
}

/// Pass over a freshly decoded tree: points every child back at its parent
/// and forces every job to stopped at zero progress. The file stores
/// ownership only, upward links and job state are rebuilt here.
pub fn link_tree(cluster: &ClusterRef) {
    {
        let mut cluster = cluster.borrow_mut();
        cluster.job = JobState::Stopped;
        cluster.job_progress = 0.0;
    }
    let cluster_ref = cluster.borrow();
    for phone in &cluster_ref.children_phones {
        phone.borrow_mut().cluster = Rc::downgrade(cluster);
    }
    for child in &cluster_ref.children_clusters {
        child.borrow_mut().parent = Rc::downgrade(cluster);
        link_tree(child);
    }
}

use std::fmt::{self, Display, Formatter};

use rand::Rng;

use super::cluster::{Cluster, ClusterRef};

/// Largest progress step a running job can gain on one tick.
const MAX_STEP: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Stopped,
    Running,
}

impl Default for JobState {
    fn default() -> Self {
        JobState::Stopped
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            JobState::Stopped => write!(f, "stopped"),
            JobState::Running => write!(f, "running"),
        }
    }
}

impl Cluster {
    /// Resumes at the current progress, only `restart_job` rewinds it.
    pub fn start_job(&mut self) {
        self.job = JobState::Running;
    }

    pub fn stop_job(&mut self) {
        self.job = JobState::Stopped;
    }

    pub fn restart_job(&mut self) {
        self.job = JobState::Running;
        self.job_progress = 0.0;
    }
}

/// One simulation tick over the whole subtree, called once a second by the
/// UI loop. Every running job below 1.0 gains a random step, stopped jobs
/// and finished jobs are left alone.
pub fn advance_jobs(cluster: &ClusterRef) {
    let mut rng = rand::thread_rng();
    step_jobs(cluster, &mut rng);
}

fn step_jobs(cluster: &ClusterRef, rng: &mut impl Rng) {
    {
        let mut cluster = cluster.borrow_mut();
        if cluster.job == JobState::Running && cluster.job_progress < 1.0 {
            // gen::<f64>() samples [0, 1), flipped so the step is in (0, MAX_STEP]
            let step = (1.0 - rng.gen::<f64>()) * MAX_STEP;
            cluster.job_progress = (cluster.job_progress + step).min(1.0);
        }
    }
    let cluster = cluster.borrow();
    for child in &cluster.children_clusters {
        step_jobs(child, rng);
    }
}

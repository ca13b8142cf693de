use std::{fs::File, io::BufWriter, path::Path};

use serde::{Deserialize, Serialize};

use crate::{error::JobError, task::TaskKind};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TraceEvent {
    TaskStarted {
        time: f64,
        kind: TaskKind,
        task_id: usize,
    },
    TaskCompleted {
        time: f64,
        kind: TaskKind,
        task_id: usize,
    },
    MapOutputFetched {
        time: f64,
        reduce_task: usize,
        map_task: usize,
        records: usize,
    },
}

impl TraceEvent {
    /// Seconds since job submission.
    pub fn time(&self) -> f64 {
        match self {
            TraceEvent::TaskStarted { time, .. }
            | TraceEvent::TaskCompleted { time, .. }
            | TraceEvent::MapOutputFetched { time, .. } => *time,
        }
    }
}

/// Events of one job in the order they happened.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trace {
    pub job_name: String,
    pub map_tasks: usize,
    pub reduce_tasks: usize,
    pub map_slots: usize,
    pub reduce_slots: usize,
    pub events: Vec<TraceEvent>,
}

impl Trace {
    pub fn new(job_name: String, map_tasks: usize, reduce_tasks: usize, map_slots: usize, reduce_slots: usize) -> Self {
        Self {
            job_name,
            map_tasks,
            reduce_tasks,
            map_slots,
            reduce_slots,
            events: Vec::new(),
        }
    }

    pub fn log(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn save(&self, path: &Path) -> Result<(), JobError> {
        let error = |message: String| JobError::Trace {
            path: path.to_path_buf(),
            message,
        };
        let file = File::create(path).map_err(|e| error(e.to_string()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| error(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, JobError> {
        let error = |message: String| JobError::Trace {
            path: path.to_path_buf(),
            message,
        };
        let file = File::open(path).map_err(|e| error(e.to_string()))?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|e| error(e.to_string()))
    }
}

use crate::{
    engines::evaluation::Agent,
    engines::predictor::{Predictor, PredictorSnapshot},
    error::{EvotradeError, Result},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Resumable snapshot of one agent's predictor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub generation: usize,
    pub agent_id: usize,
    pub score: f64,
    pub fitness: f64,
    pub saved_at: DateTime<Utc>,
    pub predictor: PredictorSnapshot,
}

impl Checkpoint {
    pub fn from_agent<P: Predictor>(agent: &Agent<P>, generation: usize) -> Self {
        Self {
            generation,
            agent_id: agent.id,
            score: agent.score,
            fitness: agent.fitness,
            saved_at: Utc::now(),
            predictor: agent.predictor().snapshot(),
        }
    }

    /// Write to a sibling temp file, then rename over `path`.
    ///
    /// Readers see either the previous checkpoint or this one, never a mix.
    pub fn write_atomic<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persistence(path, e))?;
        }

        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = temp_path(path);

        let written = File::create(&tmp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&tmp, path)) {
            let _ = fs::remove_file(&tmp);
            return Err(persistence(path, e));
        }

        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|e| persistence(path, e))?;
        Ok(serde_json::from_slice(&contents)?)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "checkpoint".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

fn persistence(path: &Path, e: std::io::Error) -> EvotradeError {
    EvotradeError::Persistence(format!("{}: {}", path.display(), e))
}

use serde::{Deserialize, Serialize};
use std::fs;

/// Ambient, non-functional run settings. Backed by an optional `focal_filter.json`
/// file colocated with the executable, mirroring the `settings.json`/`Configs`
/// convention used throughout this tool family. None of these fields has a
/// command-line surface; a missing or unparsable file silently falls back to
/// defaults, since nothing here is required for a correct run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunSettings {
    pub verbose: bool,
    pub chunk_size: usize,
    /// Cap on worker threads; `None` means "use all available cores".
    pub max_procs: Option<usize>,
}

impl Default for RunSettings {
    fn default() -> RunSettings {
        RunSettings {
            verbose: true,
            chunk_size: 100,
            max_procs: None,
        }
    }
}

impl RunSettings {
    /// Looks for `focal_filter.json` next to the running executable. Any
    /// failure to locate, read, or parse the file is treated as "no settings
    /// file" rather than a fatal error.
    pub fn load() -> RunSettings {
        let settings_path = match std::env::current_exe() {
            Ok(mut exe_path) => {
                exe_path.pop();
                exe_path.join("focal_filter.json")
            }
            Err(_) => return RunSettings::default(),
        };

        match fs::read_to_string(&settings_path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
            Err(_) => RunSettings::default(),
        }
    }

    /// Resolves the worker-thread count to use: `max_procs` if set, otherwise
    /// the number of logical cores.
    pub fn resolved_num_threads(&self) -> usize {
        self.max_procs.unwrap_or_else(num_cpus::get).max(1)
    }
}

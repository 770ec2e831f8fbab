use crate::{SystemLoad, TrackerResult};
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, ProcessesToUpdate, RefreshKind, System};

/// Ranks running processes by how active they have been.
pub trait ProcessActivity: Send + Sync {
    /// Process ids, most active first.
    fn ranked_process_ids(&self) -> TrackerResult<Vec<u32>>;
}

/// Ranks by accumulated CPU time as reported by `sysinfo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuTimeActivity;

impl ProcessActivity for CpuTimeActivity {
    fn ranked_process_ids(&self) -> TrackerResult<Vec<u32>> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        let mut ranked: Vec<(u32, u64)> = system
            .processes()
            .iter()
            .map(|(pid, process)| (pid.as_u32(), process.accumulated_cpu_time()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(ranked.into_iter().map(|(pid, _)| pid).collect())
    }
}

/// Samples CPU and memory utilisation.
///
/// Blocks for [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`]; the first CPU
/// reading is always zero so two are taken.
#[must_use]
pub fn sample_system_load() -> SystemLoad {
    let mut system = System::new_with_specifics(
        RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything()),
    );

    system.refresh_cpu_all();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    system.refresh_cpu_all();
    system.refresh_memory();

    let total = system.total_memory();
    let memory_percent = if total == 0 {
        0.0
    } else {
        (system.used_memory() as f64 / total as f64 * 100.0) as f32
    };

    SystemLoad {
        cpu_percent: system.global_cpu_usage(),
        memory_percent,
    }
}

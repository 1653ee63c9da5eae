//! Static description of the host, shown alongside diagnostics.

use serde::Serialize;
use sysinfo::{CpuRefreshKind, Disks, MemoryRefreshKind, RefreshKind, System};

use crate::platform::Platform;

#[derive(Debug, Clone, Serialize)]
pub struct DiskSummary {
    pub mount_point: String,
    pub file_system: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostInfo {
    pub platform: Platform,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    pub host_name: Option<String>,
    pub cpu_brand: String,
    pub logical_cores: usize,
    pub total_memory_bytes: u64,
    pub disks: Vec<DiskSummary>,
}

/// Collect host information (blocking)
pub fn collect_host_info() -> HostInfo {
    let refresh = RefreshKind::nothing()
        .with_memory(MemoryRefreshKind::nothing().with_ram())
        .with_cpu(CpuRefreshKind::nothing());
    let sys = System::new_with_specifics(refresh);

    let cpu_brand = sys
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let disks = Disks::new_with_refreshed_list()
        .list()
        .iter()
        .map(|disk| DiskSummary {
            mount_point: disk.mount_point().to_string_lossy().to_string(),
            file_system: disk.file_system().to_string_lossy().to_string(),
            total_bytes: disk.total_space(),
            available_bytes: disk.available_space(),
        })
        .collect();

    HostInfo {
        platform: Platform::detect(),
        os_name: System::name(),
        os_version: System::os_version(),
        kernel_version: System::kernel_version(),
        host_name: System::host_name(),
        cpu_brand,
        logical_cores: sys.cpus().len(),
        total_memory_bytes: sys.total_memory(),
        disks,
    }
}

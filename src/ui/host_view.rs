use colored::*;
use humansize::{format_size, BINARY};

use crate::core::host_info::HostInfo;

fn print_section_header(title: &str) {
    println!("\n{}", title.bold().green());
    println!("{}", "-".repeat(title.len()));
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Unknown")
}

pub fn print_host_info(info: &HostInfo) {
    println!("\n{}", "COMPUTER INFORMATION".bold().bright_cyan());
    println!("{}", "=".repeat(60));

    print_section_header("System");
    println!("  Platform: {}", info.platform);
    println!(
        "  OS: {} {}",
        or_unknown(&info.os_name),
        info.os_version.as_deref().unwrap_or("")
    );
    println!("  Kernel: {}", or_unknown(&info.kernel_version));
    println!("  Host name: {}", or_unknown(&info.host_name));

    print_section_header("Processor");
    println!("  Model: {}", info.cpu_brand);
    println!("  Logical cores: {}", info.logical_cores);

    print_section_header("Memory");
    println!("  Total: {}", format_size(info.total_memory_bytes, BINARY));

    if !info.disks.is_empty() {
        print_section_header("Storage");
        for disk in &info.disks {
            let fs = if disk.file_system.is_empty() {
                "unknown fs"
            } else {
                disk.file_system.as_str()
            };
            println!(
                "  {} ({}) {} free of {}",
                disk.mount_point.cyan(),
                fs.dimmed(),
                format_size(disk.available_bytes, BINARY),
                format_size(disk.total_bytes, BINARY)
            );
        }
    }

    println!();
}

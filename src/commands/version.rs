use anyhow::Result;

use crate::platform::Platform;

pub fn execute() -> Result<()> {
    println!("hdiag version {}", env!("CARGO_PKG_VERSION"));
    println!("platform: {}", Platform::detect());
    Ok(())
}

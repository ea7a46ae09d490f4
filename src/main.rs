use anyhow::Result;
use std::time::Duration;

fn main() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(usbboot_launcher::cli::run());

    // A terminal prompt still waiting on stdin must not keep the process alive
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

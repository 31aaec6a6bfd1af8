//! End-to-end demo: register a processor, boot it from a built
//! firmware image, read its trace buffer, power it off.
//!
//! Run with:
//!
//! ```text
//! cargo run -p rproc-core --example boot_demo
//! ```

use std::sync::Arc;

use rproc_core::{
    Backend, BackendError, FirmwareFetcher, HostMemory, MemFetcher, RamWindow, Registration,
    Registry, RegistryConfig,
};
use rproc_image::{Image, ImageBuilder, ResourceTableBuilder, SectionKind};

/// Backend for a core that exists only in this process: "starting" it
/// writes a boot banner into its trace buffer, as real firmware would.
struct SimulatedDsp {
    window: Arc<RamWindow>,
}

impl Backend for SimulatedDsp {
    fn start(&self, bootaddr: u64) -> Result<(), BackendError> {
        let banner = format!("dsp: booted at {bootaddr:#x}\n\0");
        self.window
            .write(0x4000, banner.as_bytes())
            .map_err(|e| BackendError::new(e.to_string()))?;
        Ok(())
    }

    fn stop(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    rproc_tracing::init();

    // a firmware image built on the fly: code, data, and a resource
    // table announcing a trace buffer and the boot address
    let image = ImageBuilder::new(1)
        .text_header(b"boot_demo image")
        .section(SectionKind::Text, 0x1000, &[0x90; 64])
        .section(SectionKind::Data, 0x2000, b"hello, remote core")
        .resource_table(
            0x3000,
            ResourceTableBuilder::new()
                .bootaddr(0x1000)
                .trace(0x4000, 256, "dsp_trace"),
        )
        .build();

    println!("image summary:\n{}", Image::parse(&image)?.summary()?.to_json());

    let fetcher = Arc::new(MemFetcher::new());
    fetcher.insert("dsp.img", image);

    let registry = Registry::with_config(RegistryConfig {
        fetcher: fetcher as Arc<dyn FirmwareFetcher>,
        ..RegistryConfig::default()
    });

    let window = Arc::new(RamWindow::new(0, 0x1_0000));
    registry.register(
        Registration::new(
            "dsp",
            Arc::clone(&window) as Arc<dyn HostMemory>,
            Arc::new(SimulatedDsp {
                window: Arc::clone(&window),
            }) as Arc<dyn Backend>,
        )
        .firmware("dsp.img"),
    )?;

    let handle = registry.get("dsp")?;
    handle.wait_until_settled();

    let diag = registry.diagnostics("dsp")?;
    print!("state: {}", diag.state_text());
    if let Some(trace) = diag.trace(0)? {
        print!("trace0: {}", String::from_utf8_lossy(&trace));
    }

    handle.put()?;
    print!("state: {}", diag.state_text());
    registry.unregister("dsp")?;
    Ok(())
}

mod source;

pub use source::SourceDevice;

use crate::error::Error;

const DEVICES_LIST: &str = "/proc/bus/input/devices";

/// Find the first input device whose name mentions "touchpad".
pub fn find_touchpad() -> Result<String, Error> {
    let listing = std::fs::read_to_string(DEVICES_LIST)
        .map_err(|e| Error::Discovery(format!("cannot read {}: {}", DEVICES_LIST, e)))?;
    let path = discover_touchpad(&listing).ok_or_else(|| {
        Error::Discovery(format!(
            "no touchpad listed in {}; pass --device /dev/input/eventN",
            DEVICES_LIST
        ))
    })?;
    log::info!("Discovered touchpad at {}", path);
    Ok(path)
}

/// Parse the `/proc/bus/input/devices` format. Blocks are separated by
/// blank lines; we need the `N: Name=` and `H: Handlers=` lines.
pub fn discover_touchpad(listing: &str) -> Option<String> {
    listing.split("\n\n").find_map(|block| {
        let mut name = None;
        let mut handlers = None;
        for line in block.lines() {
            if let Some(rest) = line.strip_prefix("N: Name=") {
                name = Some(rest.trim().trim_matches('"'));
            } else if let Some(rest) = line.strip_prefix("H: Handlers=") {
                handlers = Some(rest);
            }
        }

        if !name?.to_lowercase().contains("touchpad") {
            return None;
        }
        let event = handlers?
            .split_whitespace()
            .find(|h| h.strip_prefix("event").is_some_and(|n| n.parse::<u32>().is_ok()))?;

        log::debug!("Touchpad candidate: {:?} ({})", name?, event);
        Some(format!("/dev/input/{}", event))
    })
}

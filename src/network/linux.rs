// Linux-specific helpers: link state from /sys/class/net.

use std::path::Path;

const IFF_UP: u32 = 0x1;

/// Read a single-line attribute from /sys/class/net/<interface>/<attr>.
fn read_net_attr(sys_root: &Path, interface_name: &str, attr: &str) -> Option<String> {
    let path = sys_root.join("class/net").join(interface_name).join(attr);
    let v = std::fs::read_to_string(path).ok()?;
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    Some(v.to_string())
}

/// Link state of an interface. `operstate` decides when the driver reports it;
/// "unknown" (loopback, some virtual devices) falls back to the IFF_UP flag.
/// Without sysfs the interface is assumed up, as sysinfo only lists live ones.
pub(super) fn link_is_up(sys_root: &Path, interface_name: &str) -> bool {
    match read_net_attr(sys_root, interface_name, "operstate").as_deref() {
        Some("up") => true,
        Some("unknown") | None => read_net_attr(sys_root, interface_name, "flags")
            .and_then(|f| u32::from_str_radix(f.trim_start_matches("0x"), 16).ok())
            .map_or(true, |flags| flags & IFF_UP != 0),
        Some(_) => false,
    }
}

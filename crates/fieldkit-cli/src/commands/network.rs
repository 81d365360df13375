use super::{open_bridge, print_json, CmdResult};

pub fn run() -> CmdResult {
    let bridge = open_bridge()?;
    print_json(&bridge.offline().network_status())
}

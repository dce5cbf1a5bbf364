//! Rendering of a server list as Rust source.

use crate::servers::Server;
use std::fmt::Write;

/// Render `servers` as a function returning them, ready to paste into a
/// source file that imports `Server`, `IpAddr`, `Ipv4Addr` and `Ipv6Addr`.
pub fn stringify_servers(fn_name: &str, servers: &[Server]) -> String {
    let mut s = format!("pub fn {fn_name}() -> Vec<Server> {{\n    vec![\n");
    for server in servers {
        // writing into a String cannot fail
        let _ = writeln!(s, "        {server},");
    }
    s.push_str("    ]\n}");
    s
}

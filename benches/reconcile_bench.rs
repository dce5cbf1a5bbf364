use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use vpnservers::archive::{extract_hosts, parse_host, ArchiveContents};
use vpnservers::servers::{match_resolved, merge_by_region, remaining_hosts, RegionTable};

const SUFFIX: &str = ".prod.surfshark.com";

/// One UDP and one TCP file for every builtin code.
fn archive(table: &RegionTable) -> ArchiveContents {
    table
        .codes()
        .flat_map(|code| {
            let body = format!("client\ndev tun\nremote {code}{SUFFIX} 1194\n").into_bytes();
            [
                (format!("{code}{SUFFIX}_udp.ovpn"), body.clone()),
                (format!("{code}{SUFFIX}_tcp.ovpn"), body),
            ]
        })
        .collect()
}

/// Pure in-memory stages of a run; no DNS involved.
fn benchmark_reconcile_stages(c: &mut Criterion) {
    let table = RegionTable::builtin_surfshark().unwrap();
    let contents = archive(&table);

    c.bench_function("extract_hosts", |b| {
        b.iter(|| black_box(extract_hosts(&contents, "_tcp.ovpn", parse_host)))
    });

    // every other host resolved, the rest left for the second pass
    let resolved: HashMap<String, Vec<IpAddr>> = table
        .codes()
        .enumerate()
        .filter(|(i, _)| i % 2 == 0)
        .map(|(i, code)| {
            let ip = IpAddr::V4(Ipv4Addr::new(10, 0, (i / 256) as u8, (i % 256) as u8));
            (format!("{code}{SUFFIX}"), vec![ip, ip])
        })
        .collect();

    c.bench_function("match_resolved", |b| {
        b.iter(|| {
            let mut remaining = table.clone();
            let matched = match_resolved(&resolved, &mut remaining, SUFFIX);
            black_box(remaining_hosts(&remaining, SUFFIX));
            black_box(merge_by_region(matched.servers))
        })
    });
}

criterion_group!(benches, benchmark_reconcile_stages);
criterion_main!(benches);

// Prometheus text exposition of the latest sample.

use std::fmt::Write;

use crate::models::Sample;

pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Clone, Copy)]
enum MetricType {
    Gauge,
    Counter,
}

impl MetricType {
    fn as_str(self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        }
    }
}

struct Family {
    name: &'static str,
    help: &'static str,
    kind: MetricType,
}

const fn gauge(name: &'static str, help: &'static str) -> Family {
    Family {
        name,
        help,
        kind: MetricType::Gauge,
    }
}

const fn counter(name: &'static str, help: &'static str) -> Family {
    Family {
        name,
        help,
        kind: MetricType::Counter,
    }
}

const CPU_USAGE: Family = gauge("cpu_usage_percent", "CPU usage percentage");
const CPU_LOAD_1: Family = gauge("cpu_load_avg_1min", "System load average (1 minute)");
const CPU_LOAD_5: Family = gauge("cpu_load_avg_5min", "System load average (5 minutes)");
const MEMORY_USED: Family = gauge("memory_used_percent", "Memory usage percentage");
const MEMORY_AVAILABLE: Family = gauge("memory_available_gb", "Available memory in GB");
const DISK_USED: Family = gauge("disk_used_percent", "Disk usage percentage");
const DISK_FREE: Family = gauge("disk_free_gb", "Free disk space in GB");
const NET_SENT: Family = counter("network_bytes_sent", "Network bytes sent");
const NET_RECV: Family = counter("network_bytes_recv", "Network bytes received");
const DOCKER_CPU: Family = gauge("docker_cpu_percent", "Docker container CPU usage percentage");
const DOCKER_MEMORY: Family = gauge(
    "docker_memory_percent",
    "Docker container memory usage percentage",
);

/// Renders `sample` in a fixed order: cpu, memory, disks, network, containers.
/// Each series carries its own `# HELP` / `# TYPE` header and a `client_id` label.
/// Returns an empty string when there is no sample yet.
pub fn render(sample: Option<&Sample>) -> String {
    let Some(sample) = sample else {
        return String::new();
    };
    let client_id = sample.system.client_id.as_str();
    let host = [("client_id", client_id)];
    let mut out = String::new();

    series(&mut out, &CPU_USAGE, &host, sample.cpu.usage_percent);
    series(&mut out, &CPU_LOAD_1, &host, sample.cpu.load_avg_1min);
    series(&mut out, &CPU_LOAD_5, &host, sample.cpu.load_avg_5min);
    series(&mut out, &MEMORY_USED, &host, sample.memory.used_percent);
    series(&mut out, &MEMORY_AVAILABLE, &host, sample.memory.available_gb);

    for disk in &sample.disks {
        let labels = [
            ("client_id", client_id),
            ("device", disk.device.as_str()),
            ("mountpoint", disk.mountpoint.as_str()),
        ];
        series(&mut out, &DISK_USED, &labels, disk.used_percent);
        series(&mut out, &DISK_FREE, &labels, disk.free_gb);
    }

    for iface in &sample.network {
        let labels = [("client_id", client_id), ("interface", iface.interface.as_str())];
        series(&mut out, &NET_SENT, &labels, iface.bytes_sent as f64);
        series(&mut out, &NET_RECV, &labels, iface.bytes_recv as f64);
    }

    for container in sample.containers.iter().flatten() {
        let labels = [
            ("client_id", client_id),
            ("container", container.name.as_str()),
            ("image", container.image.as_str()),
        ];
        series(&mut out, &DOCKER_CPU, &labels, container.cpu_percent);
        series(&mut out, &DOCKER_MEMORY, &labels, container.memory_percent);
    }

    out
}

fn series(out: &mut String, family: &Family, labels: &[(&str, &str)], value: f64) {
    let Family { name, help, kind } = family;
    // HELP/TYPE are repeated for every labelled series, which existing scrapers
    // expect. Strict parsers such as promtool reject a second HELP for one name.
    // Writing to a String cannot fail.
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {}", kind.as_str());
    let labels = labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
        .collect::<Vec<_>>()
        .join(",");
    let _ = writeln!(out, "{name}{{{labels}}} {}", format_value(value));
}

fn escape_label_value(v: &str) -> String {
    let mut escaped = String::with_capacity(v.len());
    for c in v.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v.is_infinite() {
        if v > 0.0 { "+Inf".into() } else { "-Inf".into() }
    } else {
        v.to_string()
    }
}

use std::collections::HashMap;

use serde::Deserialize;

use crate::adapters::units::{parse_io_pair, parse_percent};
use crate::domain::{Container, IoBytes, Network, Stats};
use crate::error::{Error, Result};

/// One line of `docker ps --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct PsLine {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Names", default)]
    names: String,
    #[serde(rename = "Status", default)]
    status: String,
    #[serde(rename = "Labels", default)]
    labels: String,
}

/// One line of `docker network ls --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct NetworkLine {
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Driver", default)]
    driver: String,
    #[serde(rename = "Scope", default)]
    scope: String,
}

/// One line of `docker stats --no-stream --format '{{json .}}'`.
#[derive(Debug, Deserialize)]
struct StatsLine {
    #[serde(rename = "ID", default)]
    id: String,
    #[serde(rename = "Container", default)]
    container: String,
    #[serde(rename = "Name", default)]
    name: String,
    #[serde(rename = "CPUPerc", default)]
    cpu_perc: String,
    #[serde(rename = "MemPerc", default)]
    mem_perc: String,
    #[serde(rename = "MemUsage", default)]
    mem_usage: String,
    #[serde(rename = "NetIO", default)]
    net_io: String,
    #[serde(rename = "BlockIO", default)]
    block_io: String,
}

/// Reconstruct a label mapping from a `key=value,key=value` string.
///
/// Comma segments that do not split into exactly two parts on `=` are
/// silently discarded.
pub(crate) fn parse_labels(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|segment| {
            let parts: Vec<&str> = segment.split('=').collect();
            if parts.len() == 2 {
                Some((parts[0].trim().to_string(), parts[1].trim().to_string()))
            } else {
                None
            }
        })
        .collect()
}

/// First name out of a possibly comma-separated `Names` column, without the
/// leading slash docker prefixes.
fn first_name(names: &str) -> String {
    names
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_start_matches('/')
        .to_string()
}

fn container_from_line(line: &str) -> Result<Container> {
    if line.starts_with('{') {
        let parsed: PsLine = serde_json::from_str(line)
            .map_err(|e| Error::Parse(format!("malformed listing line: {e}")))?;
        Ok(Container::new(
            first_name(&parsed.names),
            parsed.id,
            parsed.status,
            parse_labels(&parsed.labels),
        ))
    } else {
        // Legacy tab-separated columns: ID, Names, Status, Labels.
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 3 {
            return Err(Error::Parse(format!("malformed listing line: {line:?}")));
        }
        Ok(Container::new(
            first_name(columns[1]),
            columns[0].trim(),
            columns[2].trim(),
            parse_labels(columns.get(3).unwrap_or(&"")),
        ))
    }
}

/// Decode `docker ps` output, skipping blank lines.
pub(crate) fn parse_containers(output: &str) -> Result<Vec<Container>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(container_from_line)
        .collect()
}

/// Decode `docker network ls` output, skipping blank lines.
pub(crate) fn parse_networks(output: &str) -> Result<Vec<Network>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let parsed: NetworkLine = serde_json::from_str(line)
                .map_err(|e| Error::Parse(format!("malformed network line: {e}")))?;
            Ok(Network::new(parsed.name, parsed.id, parsed.driver, parsed.scope))
        })
        .collect()
}

/// Decode `docker stats` output.
///
/// Structurally malformed lines raise; malformed numeric fields inside a
/// well-formed line degrade to zero defaults.
pub(crate) fn parse_stats(output: &str) -> Result<Vec<Stats>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let parsed: StatsLine = serde_json::from_str(line)
                .map_err(|e| Error::Parse(format!("malformed stats line: {e}")))?;

            let id = if parsed.id.is_empty() {
                parsed.container
            } else {
                parsed.id
            };

            let mut stats = Stats::new(id, first_name(&parsed.name));
            stats.cpu_usage = parse_percent(&parsed.cpu_perc);
            stats.memory_usage = parse_percent(&parsed.mem_perc);
            stats.disk_io = parse_io_pair(&parsed.block_io).unwrap_or(IoBytes::zero());
            stats.memory_io = parse_io_pair(&parsed.mem_usage).unwrap_or(IoBytes::zero());
            stats.network_io = parse_io_pair(&parsed.net_io).unwrap_or(IoBytes::zero());
            Ok(stats)
        })
        .collect()
}

// Copyright (c) 2026 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://github.com/mintlayer/mintlayer-core/blob/master/LICENSE
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! `reporting.realtime`: CPU and memory usage sampled from procfs.
//!
//! CPU usage is a rate, so it is computed from the difference between two consecutive samples
//! of the same subscription. The first event of a subscription therefore carries no CPU section.

use std::{collections::BTreeMap, path::PathBuf, time::Duration};

use async_trait::async_trait;
use middleware::{
    schema::{validators::Range, Param},
    Error, EventSource, Middleware,
};
use serde_json::{json, Map, Value};

pub const REALTIME_SOURCE: &str = "reporting.realtime";
pub const DEFAULT_INTERVAL_SECS: u64 = 2;

const PROC_STAT: &str = "/proc/stat";
const PROC_MEMINFO: &str = "/proc/meminfo";

pub fn realtime_params() -> Param {
    Param::dict(
        "",
        [Param::int("interval")
            .default(DEFAULT_INTERVAL_SECS)
            .validator(Range::min(DEFAULT_INTERVAL_SECS as f64))],
    )
}

/// Cumulative jiffies of one CPU line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    busy: u64,
    total: u64,
}

/// Per-CPU times keyed by CPU index, plus `average` for the aggregate line.
fn parse_cpu_times(stat: &str) -> BTreeMap<String, CpuTimes> {
    stat.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let label = fields.next()?.strip_prefix("cpu")?;
            let name = if label.is_empty() { "average" } else { label };

            // user nice system idle iowait irq softirq steal; guest time is already in user.
            let times: Vec<u64> = fields.take(8).map_while(|f| f.parse().ok()).collect();
            if times.len() < 4 {
                return None;
            }
            let total = times.iter().sum();
            let idle = times[3] + times.get(4).copied().unwrap_or(0);
            Some((
                name.to_owned(),
                CpuTimes {
                    busy: total - idle,
                    total,
                },
            ))
        })
        .collect()
}

fn cpu_usage(
    previous: &BTreeMap<String, CpuTimes>,
    current: &BTreeMap<String, CpuTimes>,
) -> Map<String, Value> {
    current
        .iter()
        .filter_map(|(name, now)| {
            let before = previous.get(name)?;
            let total = now.total.saturating_sub(before.total);
            let busy = now.busy.saturating_sub(before.busy);
            let usage = if total == 0 {
                0.0
            } else {
                busy as f64 * 100.0 / total as f64
            };
            Some((name.clone(), json!({"usage": usage})))
        })
        .collect()
}

/// Memory figures in bytes.
fn parse_meminfo(meminfo: &str) -> Map<String, Value> {
    const FIELDS: [(&str, &str); 6] = [
        ("MemTotal", "total"),
        ("MemFree", "free"),
        ("MemAvailable", "available"),
        ("Buffers", "buffers"),
        ("Cached", "cached"),
        ("SwapFree", "swap_free"),
    ];

    meminfo
        .lines()
        .filter_map(|line| {
            let (key, rest) = line.split_once(':')?;
            let (_, name) = FIELDS.iter().find(|(field, _)| *field == key)?;
            let kib: u64 = rest.trim().trim_end_matches("kB").trim().parse().ok()?;
            Some(((*name).to_owned(), json!(kib * 1024)))
        })
        .collect()
}

pub struct RealtimeSource {
    interval: Duration,
    stat_path: PathBuf,
    meminfo_path: PathBuf,
    previous: Option<BTreeMap<String, CpuTimes>>,
}

impl RealtimeSource {
    /// Source for cleaned `reporting.realtime` arguments.
    pub fn from_args(args: Value) -> Result<Self, Error> {
        let interval = args["interval"].as_u64().unwrap_or(DEFAULT_INTERVAL_SECS);
        Ok(Self {
            interval: Duration::from_secs(interval),
            stat_path: PROC_STAT.into(),
            meminfo_path: PROC_MEMINFO.into(),
            previous: None,
        })
    }

    pub fn with_paths(mut self, stat_path: PathBuf, meminfo_path: PathBuf) -> Self {
        self.stat_path = stat_path;
        self.meminfo_path = meminfo_path;
        self
    }
}

#[async_trait]
impl EventSource for RealtimeSource {
    fn interval(&self) -> Duration {
        self.interval
    }

    async fn iterate(&mut self, _middleware: &Middleware) -> Result<Option<Value>, Error> {
        let stat = tokio::fs::read_to_string(&self.stat_path).await.map_err(|e| {
            Error::failed(format!("Reading {}: {e}", self.stat_path.display()))
        })?;
        let meminfo = tokio::fs::read_to_string(&self.meminfo_path).await.map_err(|e| {
            Error::failed(format!("Reading {}: {e}", self.meminfo_path.display()))
        })?;

        let mut fields = Map::new();
        fields.insert("memory".into(), Value::Object(parse_meminfo(&meminfo)));

        let cpu_times = parse_cpu_times(&stat);
        if let Some(previous) = &self.previous {
            fields.insert("cpu".into(), Value::Object(cpu_usage(previous, &cpu_times)));
        }
        self.previous = Some(cpu_times);

        Ok(Some(Value::Object(fields)))
    }
}

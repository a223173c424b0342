//! Kestrel Benchmark Runner
//!
//! Standalone binary timing object-runtime workloads with text, CSV or JSON
//! output and peak memory tracking.
//!
//! Usage: `kestrel-bench [text|csv|json] [iterations]`

use serde::Serialize;
use std::fs;
use std::time::{Duration, Instant};

use kestrel_rt::{MapKind, ObjResult, Runtime, Value};

/// Result of a single benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub name: String,
    pub size: usize,
    pub duration_ms: f64,
    pub ops_per_sec: f64,
    pub peak_rss_kb: Option<u64>,
    pub iterations: u32,
}

/// Read peak RSS from /proc/self/status on Linux.
/// Returns None on non-Linux or if the file cannot be parsed.
pub fn peak_rss_kb() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        for line in status.lines() {
            if line.starts_with("VmHWM:") {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 {
                    return parts[1].parse::<u64>().ok();
                }
            }
        }
        None
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

type Workload = fn(&Runtime, usize) -> ObjResult<()>;

fn dict_fill_and_read(rt: &Runtime, size: usize) -> ObjResult<()> {
    let d = rt.dict();
    for i in 0..size {
        rt.set(&d, Value::from(i), Value::from(i * 2))?;
    }
    for i in 0..size {
        rt.get(&d, &Value::from(i))?;
    }
    Ok(())
}

fn method_through_chain(rt: &Runtime, size: usize) -> ObjResult<()> {
    let base = rt.class(None);
    base.insert(Value::from("id"), rt.native(|_, args| Ok(args[0].clone())));
    let mut class = base;
    for _ in 0..4 {
        class = rt.class(Some(class));
    }
    let obj = Value::Map(rt.object(Some(class)));
    let key = Value::from("id");
    for _ in 0..size {
        let m = rt.get(&obj, &key)?;
        rt.call(&m, Vec::new())?;
    }
    Ok(())
}

fn repr_nested(rt: &Runtime, size: usize) -> ObjResult<()> {
    let inner = rt.list((0..8).map(Value::from).collect());
    let row = rt.dict_with_kind(MapKind::Raw);
    rt.set(&row, Value::from("xs"), inner)?;
    let outer = rt.list(vec![row; size]);
    rt.repr(&outer)?;
    Ok(())
}

fn sort_mixed(rt: &Runtime, size: usize) -> ObjResult<()> {
    let items = (0..size)
        .map(|i| {
            if i % 3 == 0 {
                Value::from(format!("s{}", size - i))
            } else {
                Value::from((size - i) as f64)
            }
        })
        .collect();
    let l = rt.list(items);
    let sort = rt.get(&l, &Value::from("sort"))?;
    rt.call(&sort, Vec::new())?;
    Ok(())
}

fn cycles_then_collect(rt: &Runtime, size: usize) -> ObjResult<()> {
    for _ in 0..size {
        let l = rt.list(Vec::new());
        rt.set(&l, Value::None, l.clone())?;
    }
    rt.collect();
    Ok(())
}

fn time_workload(rt: &Runtime, workload: Workload, size: usize, iterations: u32) -> ObjResult<Duration> {
    let mut total = Duration::ZERO;
    for _ in 0..iterations {
        let start = Instant::now();
        workload(rt, size)?;
        total += start.elapsed();
    }
    Ok(total)
}

/// Run a single benchmark and produce a BenchResult.
fn run_bench(name: &str, workload: Workload, size: usize, iterations: u32) -> ObjResult<BenchResult> {
    let rt = Runtime::new();

    // Warm up
    time_workload(&rt, workload, size, 2)?;

    let total = time_workload(&rt, workload, size, iterations)?;
    let avg = total.as_secs_f64() / iterations.max(1) as f64;

    Ok(BenchResult {
        name: name.to_string(),
        size,
        duration_ms: avg * 1000.0,
        ops_per_sec: if avg > 0.0 { size as f64 / avg } else { 0.0 },
        peak_rss_kb: peak_rss_kb(),
        iterations,
    })
}

fn print_csv_header() {
    println!("name,size,duration_ms,ops_per_sec,peak_rss_kb,iterations");
}

fn print_csv_row(r: &BenchResult) {
    println!(
        "{},{},{:.3},{:.0},{},{}",
        r.name,
        r.size,
        r.duration_ms,
        r.ops_per_sec,
        r.peak_rss_kb.map_or("N/A".to_string(), |v| v.to_string()),
        r.iterations,
    );
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let output_format = args.get(1).map(|s| s.as_str()).unwrap_or("text");
    let iterations: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10);

    let workloads: [(&str, Workload); 5] = [
        ("dict_fill_and_read", dict_fill_and_read),
        ("method_through_chain", method_through_chain),
        ("repr_nested", repr_nested),
        ("sort_mixed", sort_mixed),
        ("cycles_then_collect", cycles_then_collect),
    ];
    let sizes = [100, 1_000, 10_000];

    let mut results: Vec<BenchResult> = Vec::new();
    for (name, workload) in workloads {
        for size in sizes {
            match run_bench(name, workload, size, iterations) {
                Ok(r) => results.push(r),
                Err(e) => eprintln!("Warning: workload '{}' failed at size {}: {}", name, size, e),
            }
        }
    }

    match output_format {
        "csv" => {
            print_csv_header();
            for r in &results {
                print_csv_row(r);
            }
        }
        "json" => match serde_json::to_string_pretty(&results) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("error: cannot serialize results: {}", e),
        },
        _ => {
            println!("Kestrel Object Runtime Benchmarks");
            println!("=================================");
            println!();
            for r in &results {
                println!(
                    "[{}/{}] {:.3}ms avg ({} iters) | {:.0} ops/s | RSS: {}",
                    r.name,
                    r.size,
                    r.duration_ms,
                    r.iterations,
                    r.ops_per_sec,
                    r.peak_rss_kb.map_or("N/A".to_string(), |v| format!("{}kB", v)),
                );
            }
        }
    }
}

use judicious::bits::{DenseBits, SparseBits};
use judicious::driver::{partition, DdfWriter, PartitionConfig};
use judicious::hypergraph;

fn main() {
    let mut cfg = PartitionConfig::default();
    let mut partition_number: u32 = 0;
    let mut sparse = false;
    let mut file: Option<String> = None;
    let mut targets: Vec<usize> = Vec::new();

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--partition" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                partition_number = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--deterministic" => {
                cfg.deterministic = true;
                i += 1;
            }
            "--sparse" => {
                sparse = true;
                i += 1;
            }
            "--quiet" => {
                cfg.quiet = true;
                i += 1;
            }
            "--help" | "-h" => usage_and_exit(0),
            arg if arg.starts_with('-') => usage_and_exit(2),
            arg => {
                if file.is_none() {
                    file = Some(arg.to_string());
                } else {
                    let k: usize = arg.parse().unwrap_or_else(|_| usage_and_exit(2));
                    if k < 2 {
                        usage_and_exit(2);
                    }
                    targets.push(k);
                }
                i += 1;
            }
        }
    }

    let Some(file) = file else {
        usage_and_exit(2);
    };
    if targets.is_empty() {
        usage_and_exit(2);
    }

    let hg = match hypergraph::from_partition_file(&file, partition_number) {
        Ok(hg) => hg,
        Err(e) => {
            eprintln!("{file}: {e}");
            std::process::exit(1);
        }
    };

    let stdout = std::io::stdout().lock();
    let mut sink = DdfWriter::new(stdout);
    let result = if sparse {
        partition::<SparseBits, _>(&hg, &targets, &cfg, &mut sink)
    } else {
        partition::<DenseBits, _>(&hg, &targets, &cfg, &mut sink)
    };
    if let Err(e) = result {
        eprintln!("partitioning failed: {e}");
        std::process::exit(1);
    }
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  judicious [OPTIONS] FILE K [K ...]\n\nArguments:\n  FILE                     RAxML-style partition file with repeat classes\n  K                        Requested CPU count(s), each >= 2\n\nOptions:\n  --partition N            Partition block of FILE to use (default: 0)\n  --deterministic          Sort emitted partitions for reproducible output\n  --sparse                 Use the sparse bitset backing\n  --quiet                  Suppress per-round progress on stderr\n  -h, --help               Show this help\n"
    );
    std::process::exit(code)
}

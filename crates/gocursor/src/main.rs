//
// main.rs
//
// `gocursor` command-line entry point
//

use std::env;

use gocursor::cli::{resolve, scan_stats};

fn print_usage() {
    println!(
        "gocursor {}, a cursor context resolver for Go source.",
        env!("CARGO_PKG_VERSION")
    );
    print!(
        r#"
Usage: gocursor <COMMAND> [OPTIONS]

Commands:

resolve <file> --offset N    Resolve the context at byte offset N
resolve <file> --line L --col C
                             Resolve the context at 1-based line L, column C
    --json                   Print the context as JSON
scan-stats <path>            Resolve every line end of every .go file and report timings
    --csv                    Print the timings as CSV

Available options:

--version                    Print the version
--help                       Print this help message

Set RUST_LOG for logging and GOCURSOR_PERF=1 (or verbose) for timing logs.
"#
    );
}

fn main() -> anyhow::Result<()> {
    let mut argv = env::args();
    argv.next(); // skip executable name

    let Some(command) = argv.next() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "--version" => {
            println!("gocursor {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "--help" => {
            print_usage();
            Ok(())
        }
        "resolve" => {
            env_logger::init();
            let args = resolve::parse_args(&mut argv).map_err(anyhow::Error::msg)?;
            let summary = resolve::run_resolve(&args)?;
            if args.json {
                resolve::print_summary_json(&summary)?;
            } else {
                resolve::print_summary(&summary);
            }
            Ok(())
        }
        "scan-stats" => {
            env_logger::init();
            let args = scan_stats::parse_args(&mut argv).map_err(anyhow::Error::msg)?;
            let results = scan_stats::run_scan_stats(&args);
            if args.csv {
                scan_stats::print_results_csv(&results);
            } else {
                scan_stats::print_results(&results);
            }
            Ok(())
        }
        other => Err(anyhow::anyhow!("Unknown argument: '{other}'")),
    }
}

mod cli;
mod render;

use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use oid2name::{CacheFile, CachedResolver, ConnParams, PgResolver};
use postgres_ffi::segment::SegmentId;
use wal_decoder::{NameResolver, NullResolver, ReadOutcome, RmgrStats, TransactionTracker, WalReader};

use cli::Cli;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn conn_params(cli: &Cli) -> ConnParams {
    ConnParams {
        host: cli.host.clone(),
        port: cli.port,
        user: cli.user.clone(),
        dbname: cli.dbname.clone(),
    }
}

fn build_resolver(cli: &Cli) -> anyhow::Result<Box<dyn NameResolver>> {
    if !cli.oid2name {
        return Ok(Box::new(NullResolver));
    }
    if let Some(path) = &cli.file {
        let cache = oid2name::cache::load(path.as_std_path()).context("loading oid2name cache")?;
        return Ok(Box::new(CachedResolver::new(cache)));
    }
    let resolver = PgResolver::connect(&conn_params(cli)).context("connecting for --oid2name")?;
    Ok(Box::new(resolver))
}

fn run_gen_oid2name(cli: &Cli) -> anyhow::Result<()> {
    let path = cli
        .file
        .as_ref()
        .context("--gen-oid2name requires --file <path>")?;
    let cache: CacheFile = oid2name::cache::generate(&conn_params(cli)).context("walking catalogs")?;
    oid2name::cache::write(&cache, path.as_std_path()).context("writing cache file")?;
    Ok(())
}

fn process_segment(
    path: &camino::Utf8Path,
    cli: &Cli,
    resolver: &mut dyn NameResolver,
    stats: &mut RmgrStats,
    txns: &mut TransactionTracker,
) {
    let file_name = path.file_name().unwrap_or(path.as_str());
    let segment = match SegmentId::parse(file_name) {
        Ok(segment) => segment,
        Err(e) => {
            eprintln!("pg_waldump: {}: {}", path, e);
            return;
        }
    };
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("pg_waldump: {}: {}", path, e);
            return;
        }
    };
    let mut reader = WalReader::new(BufReader::new(file), segment);
    let quiet = cli.stats || cli.transactions;

    loop {
        match reader.read_record() {
            Ok(ReadOutcome::Eol) => break,
            Ok(ReadOutcome::End { cur }) => {
                if !quiet {
                    println!("[cur:{}] log switch", cur);
                }
                break;
            }
            Ok(ReadOutcome::Record(record)) => {
                let filtered = cli.rmid.is_some_and(|rmid| rmid != record.header.xl_rmid)
                    || cli.xid.is_some_and(|xid| xid != record.header.xl_xid);

                stats.record(
                    record.header.xl_rmid,
                    record.header.opcode(),
                    record.header.xl_len,
                    record.header.backup_block_flags().count_ones(),
                    record.backup_blocks_raw().len() as u32,
                );

                txns.observe_record(record.header.xl_xid, record.header.xl_tot_len, record.cur);
                if let Some(status) = wal_decoder::rmgr::terminal_transaction_status(&record.header) {
                    match status {
                        wal_decoder::TxnStatus::Committed => {
                            txns.observe_commit(record.header.xl_xid, record.cur)
                        }
                        wal_decoder::TxnStatus::Aborted => {
                            txns.observe_abort(record.header.xl_xid, record.cur)
                        }
                    }
                }

                if filtered || quiet {
                    continue;
                }

                println!(
                    "{}",
                    render::record_line(&record, cli.statements, cli.hide_timestamps, resolver)
                );
                for line in render::backup_block_lines(&record, resolver) {
                    println!("{}", line);
                }
            }
            Err(e) => {
                eprintln!("pg_waldump: {}: {}", path, e);
                break;
            }
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    if cli.statements && !cli.oid2name {
        eprintln!("pg_waldump: --statements requires --oid2name");
        return ExitCode::FAILURE;
    }

    if cli.gen_oid2name {
        return match run_gen_oid2name(&cli) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("pg_waldump: {:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    let mut resolver = match build_resolver(&cli) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("pg_waldump: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut stats = RmgrStats::new();
    let mut txns = TransactionTracker::new();

    for path in &cli.segments {
        process_segment(path, &cli, resolver.as_mut(), &mut stats, &mut txns);
    }

    if cli.stats {
        print!("{}", stats.render());
    }
    if cli.transactions {
        print!("{}", txns.render());
    }

    ExitCode::SUCCESS
}

use std::io::Write;

use serde::Serialize;
use time::OffsetDateTime;

use super::render::{render_records, render_step_header};
use super::{Ctx, RunArgs, TableArgs, UgcArgs};
use crate::config::{Config, config_path, write_config};
use crate::core::{
    ActiveTable, EtnPool, MemoryActiveTable, Timestamp, VtecLine, ZoneSet,
};
use crate::harness::{Runner, Script};
use crate::store::JsonlActiveTable;
use crate::{Error, Result};

pub(super) fn run_script(ctx: &Ctx, args: &RunArgs) -> Result<()> {
    let script = Script::load(&args.script)?;
    let office = script
        .office
        .clone()
        .or_else(|| ctx.config.defaults.office.clone())
        .ok_or_else(|| Error::Script {
            reason: "no office: set `office` in the script or `defaults.office` in config".into(),
        })?;
    let mut options = ctx.config.classify_options();
    if let Some(class) = script.product_class {
        options.product_class = class;
    }

    let table_path = match (&args.table, args.persist) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(ctx.config.table_path()),
        (None, false) => None,
    };
    let check = !args.no_check;
    match table_path {
        Some(path) => {
            let table = JsonlActiveTable::open(path, options.windows.clone())?;
            let pool = table.pool();
            drive(ctx, &script, Runner::new(office, table, pool, options), check)
        }
        None => {
            let table = MemoryActiveTable::with_windows(options.windows.clone());
            drive(
                ctx,
                &script,
                Runner::new(office, table, EtnPool::new(), options),
                check,
            )
        }
    }
}

fn drive<T>(ctx: &Ctx, script: &Script, mut runner: Runner<T>, check: bool) -> Result<()>
where
    T: ActiveTable,
    Error: From<T::Error>,
{
    let mut outcomes = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        let outcome = runner.step(index, step, script.base_time)?;
        if !ctx.json {
            println!("{}", render_step_header(&outcome));
            print!("{}", outcome.product);
        }
        if check {
            outcome.verify(step)?;
        }
        outcomes.push(outcome);
    }
    if ctx.json {
        print_json(&outcomes)?;
    }
    Ok(())
}

pub(super) fn parse_line(line: &str) -> Result<()> {
    let parsed = VtecLine::parse(line)?;
    print_json(&parsed)
}

pub(super) fn ugc(ctx: &Ctx, args: &UgcArgs) -> Result<()> {
    if args.decode {
        let zones = ZoneSet::decode(&args.zones.join("\n"))?;
        if ctx.json {
            return print_json(&zones);
        }
        for zone in &zones {
            println!("{zone}");
        }
        return Ok(());
    }
    let zones = ZoneSet::parse(&args.zones)?;
    let header = zones.encode_lines(args.width);
    if ctx.json {
        print_json(&header)
    } else {
        println!("{header}");
        Ok(())
    }
}

fn open_table(ctx: &Ctx, args: &TableArgs) -> Result<JsonlActiveTable> {
    let path = args
        .table
        .clone()
        .unwrap_or_else(|| ctx.config.table_path());
    JsonlActiveTable::open(path, ctx.config.engine.windows.clone())
}

pub(super) fn table_show(ctx: &Ctx, args: &TableArgs) -> Result<()> {
    let table = open_table(ctx, args)?;
    if ctx.json {
        print_json(table.records())
    } else {
        println!("{}", render_records(table.records()));
        Ok(())
    }
}

pub(super) fn table_purge(ctx: &Ctx, args: &TableArgs, before: Option<&str>) -> Result<()> {
    let before = match before {
        Some(raw) => Timestamp::parse_rfc3339(raw)?,
        None => now(),
    };
    let mut table = open_table(ctx, args)?;
    let removed = table.purge(before)?;
    if ctx.json {
        print_json(&serde_json::json!({ "removed": removed, "remaining": table.len() }))
    } else {
        println!("purged {removed} records, {} remain", table.len());
        Ok(())
    }
}

pub(super) fn config_show(ctx: &Ctx) -> Result<()> {
    if ctx.json {
        return print_json(&ctx.config);
    }
    let rendered = toml::to_string_pretty(&ctx.config).map_err(|e| Error::Config {
        reason: format!("failed to render config: {e}"),
    })?;
    print!("{rendered}");
    Ok(())
}

pub(super) fn config_init(force: bool) -> Result<()> {
    let path = config_path();
    if path.exists() && !force {
        return Err(Error::Config {
            reason: format!("{} already exists (use --force)", path.display()),
        });
    }
    write_config(&path, &Config::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

fn now() -> Timestamp {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    Timestamp::from_millis((nanos / 1_000_000) as i64)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)
        .map_err(|e| Error::io("<stdout>", e.into()))?;
    writeln!(stdout).map_err(|e| Error::io("<stdout>", e))
}

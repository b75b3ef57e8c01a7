use std::{fmt::Display, io::Write};

use anyhow::Result;
use chrono::TimeZone;

use crate::{
    config::Settings,
    ledger::{entities::PunchKind, PunchLedger},
    utils::time::format_record_time,
    view::{history::render_history, render_notice},
};

/// `punchclock in` / `punchclock out`: appends one punch, then prints the resulting history.
pub async fn punch<Tz: TimeZone>(
    mut ledger: PunchLedger,
    kind: PunchKind,
    out: &mut impl Write,
    settings: &Settings,
    zone: &Tz,
) -> Result<()>
where
    Tz::Offset: Display,
{
    let event = ledger.append(kind).await;
    writeln!(
        out,
        "{} at {}",
        event.kind,
        format_record_time(&event.timestamp.with_timezone(zone))
    )?;
    writeln!(out)?;
    print_history(&ledger, out, settings, zone)
}

pub fn print_history<Tz: TimeZone>(
    ledger: &PunchLedger,
    out: &mut impl Write,
    settings: &Settings,
    zone: &Tz,
) -> Result<()>
where
    Tz::Offset: Display,
{
    write!(out, "{}", render_history(&ledger.events(), zone, settings.colors))?;
    if let Some(notice) = ledger.notice() {
        writeln!(out)?;
        write!(out, "{}", render_notice(notice, settings.colors))?;
    }
    out.flush()?;
    Ok(())
}

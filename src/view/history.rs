use std::fmt::Display;

use ansi_term::Colour;
use chrono::TimeZone;

use crate::{
    ledger::entities::{PunchEvent, PunchKind},
    utils::time::format_record_time,
};

pub const EMPTY_HISTORY_PLACEHOLDER: &str = "No punch records yet.";

fn kind_colour(kind: PunchKind) -> Colour {
    match kind {
        PunchKind::ClockIn => Colour::Green,
        PunchKind::ClockOut => Colour::Red,
    }
}

/// One row per event in the order given (the ledger keeps newest first), or the placeholder
/// when there is nothing to show.
pub fn render_history<Tz: TimeZone>(events: &[PunchEvent], zone: &Tz, colors: bool) -> String
where
    Tz::Offset: Display,
{
    if events.is_empty() {
        return format!("{EMPTY_HISTORY_PLACEHOLDER}\n");
    }

    let mut out = String::new();
    for event in events {
        let label = format!("{:<9}", event.kind.label());
        let label = if colors {
            kind_colour(event.kind).paint(label).to_string()
        } else {
            label
        };
        let time = format_record_time(&event.timestamp.with_timezone(zone));
        out.push_str(&format!("{label}  {time}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, TimeZone, Utc};

    use crate::ledger::entities::{PunchEvent, PunchKind};

    use super::{render_history, EMPTY_HISTORY_PLACEHOLDER};

    #[test]
    fn empty_history_shows_placeholder() {
        assert_eq!(
            render_history(&[], &Utc, true),
            format!("{EMPTY_HISTORY_PLACEHOLDER}\n")
        );
    }

    #[test]
    fn rows_follow_ledger_order() {
        let t1 = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
        let t2 = t1 + Duration::hours(9);
        let clock_in = PunchEvent::new_after(None, PunchKind::ClockIn, t1);
        let clock_out = PunchEvent::new_after(Some(&clock_in), PunchKind::ClockOut, t2);
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        let rendered = render_history(&[clock_out, clock_in], &tokyo, false);

        assert_eq!(
            rendered,
            "Clock-out  03/14 18:00:00\n\
             Clock-in   03/14 09:00:00\n"
        );
    }

    #[test]
    fn kinds_are_coloured_differently() {
        let moment = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let clock_in = PunchEvent::new_after(None, PunchKind::ClockIn, moment);
        let clock_out = PunchEvent::new_after(Some(&clock_in), PunchKind::ClockOut, moment);

        let rendered = render_history(&[clock_out, clock_in], &Utc, true);
        let lines = rendered.lines().collect::<Vec<_>>();

        assert!(lines[0].starts_with("\u{1b}[31m"));
        assert!(lines[1].starts_with("\u{1b}[32m"));
    }
}

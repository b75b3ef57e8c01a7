//! Text rendering of the clock face and the punch history. Everything here is pure: values are
//! converted into the viewer's zone only while formatting and nothing is written anywhere.

pub mod history;

use std::fmt::Display;

use ansi_term::Colour;
use chrono::{DateTime, TimeZone, Utc};

use crate::{
    config::Links,
    ledger::{entities::PunchEvent, StorageNotice},
    utils::time::{format_clock_time, format_long_date},
};

pub const SESSION_HELP: &str = "[i] Clock-in   [o] Clock-out   [q] Quit";

/// Everything one frame of the interactive session shows.
pub struct Screen<'a> {
    pub now: DateTime<Utc>,
    pub events: &'a [PunchEvent],
    pub notice: Option<&'a StorageNotice>,
    pub links: &'a Links,
    pub colors: bool,
}

/// Two lines: the time, then the long date.
pub fn render_clock<Tz: TimeZone>(now: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz::Offset: Display,
{
    let local = now.with_timezone(zone);
    format!("{}\n{}\n", format_clock_time(&local), format_long_date(&local))
}

pub fn render_notice(notice: &StorageNotice, colors: bool) -> String {
    let line = format!("! {}", notice.message);
    if colors {
        format!("{}\n", Colour::Yellow.paint(line))
    } else {
        format!("{line}\n")
    }
}

pub fn render_links(links: &Links) -> String {
    format!(
        "Calendar: {}\nMail:     {}\nWeather:  {}\n",
        links.calendar, links.mail, links.weather
    )
}

pub fn render_screen<Tz: TimeZone>(screen: &Screen, zone: &Tz) -> String
where
    Tz::Offset: Display,
{
    let mut out = String::new();
    out.push_str(&render_clock(&screen.now, zone));
    out.push('\n');
    out.push_str(SESSION_HELP);
    out.push_str("\n\n");
    out.push_str("History\n");
    out.push_str(&history::render_history(screen.events, zone, screen.colors));
    if let Some(notice) = screen.notice {
        out.push('\n');
        out.push_str(&render_notice(notice, screen.colors));
    }
    out.push('\n');
    out.push_str(&render_links(screen.links));
    out
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone, Utc};

    use crate::{
        config::Links,
        ledger::{
            entities::{PunchEvent, PunchKind},
            NoticeKind, StorageNotice,
        },
    };

    use super::{render_clock, render_screen, Screen, SESSION_HELP};

    #[test]
    fn clock_is_rendered_in_viewer_zone() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 23, 30, 0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();

        assert_eq!(
            render_clock(&now, &tokyo),
            "08:30:00\nTuesday, October 20, 2026\n"
        );
    }

    #[test]
    fn screen_contains_every_section() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 5).unwrap();
        let events = vec![PunchEvent::new_after(None, PunchKind::ClockIn, now)];
        let notice = StorageNotice {
            kind: NoticeKind::WriteFailed,
            message: "Punches are not being saved: disk full".into(),
        };
        let links = Links::default();

        let screen = render_screen(
            &Screen {
                now,
                events: &events,
                notice: Some(&notice),
                links: &links,
                colors: false,
            },
            &Utc,
        );

        assert!(screen.starts_with("09:00:05\nMonday, October 19, 2026\n"));
        assert!(screen.contains(&format!("{SESSION_HELP}\n\nHistory\n")));
        assert!(screen.contains("Clock-in   10/19 09:00:05"));
        assert!(screen.contains("! Punches are not being saved: disk full"));
        assert!(screen.contains(&links.weather));
    }
}

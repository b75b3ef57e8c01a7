use std::{fmt::Display, io::Write};

use anyhow::Result;
use chrono::TimeZone;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::Links,
    ledger::{entities::PunchKind, PunchLedger},
    ticker::TickerHandle,
    view::{render_screen, Screen},
};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Punch(PunchKind),
    Redraw,
    Quit,
}

pub fn parse_session_command(line: &str) -> Option<SessionCommand> {
    match line.trim().to_lowercase().as_str() {
        "i" | "in" | "clock-in" => Some(SessionCommand::Punch(PunchKind::ClockIn)),
        "o" | "out" | "clock-out" => Some(SessionCommand::Punch(PunchKind::ClockOut)),
        "" => Some(SessionCommand::Redraw),
        "q" | "quit" | "exit" => Some(SessionCommand::Quit),
        _ => None,
    }
}

/// Where and how frames are drawn.
pub struct SessionView<W> {
    pub out: W,
    pub clear_screen: bool,
    pub colors: bool,
    pub links: Links,
}

/// Runs the interactive session until the user quits, input ends or `shutdown` is cancelled.
/// The ticker is stopped before returning, whatever the outcome.
pub async fn run_session<R, W, Tz>(
    mut ledger: PunchLedger,
    mut ticker: TickerHandle,
    input: R,
    mut view: SessionView<W>,
    zone: &Tz,
    shutdown: CancellationToken,
) -> Result<PunchLedger>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let result = event_loop(&mut ledger, &mut ticker, input, &mut view, zone, &shutdown).await;
    ticker.stop().await;
    result.map(|()| ledger)
}

/// Ticks, typed commands and ledger commits are all handled here, one at a time, so punches are
/// appended and persisted in exactly the order they were typed. A frame is drawn whenever the
/// ticker or the ledger publishes a new value.
async fn event_loop<R, W, Tz>(
    ledger: &mut PunchLedger,
    ticker: &mut TickerHandle,
    input: R,
    view: &mut SessionView<W>,
    zone: &Tz,
    shutdown: &CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = input.lines();
    let mut commits = ledger.subscribe();
    let mut status: Option<String> = None;

    draw(view, ledger, ticker, status.as_deref(), zone)?;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Session cancelled");
                return Ok(());
            }
            tick = ticker.changed() => {
                if tick.is_err() {
                    warn!("Ticker stopped unexpectedly");
                    return Ok(());
                }
            }
            commit = commits.changed() => {
                commit?;
                commits.borrow_and_update();
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    return Ok(());
                };
                match parse_session_command(&line) {
                    Some(SessionCommand::Punch(kind)) => {
                        status = None;
                        let event = ledger.append(kind).await;
                        info!("Punched {event:?}");
                        // The commit wakes the loop again, which draws the new history.
                        continue;
                    }
                    Some(SessionCommand::Redraw) => (),
                    Some(SessionCommand::Quit) => return Ok(()),
                    None => status = Some(format!("Unknown command {:?}", line.trim())),
                }
            }
        }
        draw(view, ledger, ticker, status.as_deref(), zone)?;
    }
}

fn draw<W: Write, Tz: TimeZone>(
    view: &mut SessionView<W>,
    ledger: &PunchLedger,
    ticker: &TickerHandle,
    status: Option<&str>,
    zone: &Tz,
) -> Result<()>
where
    Tz::Offset: Display,
{
    let events = ledger.events();
    let frame = render_screen(
        &Screen {
            now: ticker.now(),
            events: &events,
            notice: ledger.notice(),
            links: &view.links,
            colors: view.colors,
        },
        zone,
    );

    if view.clear_screen {
        write!(view.out, "{CLEAR_SCREEN}")?;
    }
    write!(view.out, "{frame}")?;
    if let Some(status) = status {
        writeln!(view.out, "\n{status}")?;
    }
    view.out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use tokio_util::sync::CancellationToken;

    use crate::{
        config::Links,
        ledger::{
            entities::{parse_snapshot, PunchKind},
            PunchLedger,
        },
        storage::{memory_store::MemoryStore, KeyValueStore, DEFAULT_STORAGE_KEY},
        ticker::{ClockTicker, DEFAULT_TICK_INTERVAL},
        utils::{clock::TokioClock, logging::TEST_LOGGING},
    };

    use super::{parse_session_command, run_session, SessionCommand, SessionView};

    fn plain_view() -> SessionView<Vec<u8>> {
        SessionView {
            out: Vec::new(),
            clear_screen: false,
            colors: false,
            links: Links::default(),
        }
    }

    #[test]
    fn commands_are_parsed_leniently() {
        assert_eq!(
            parse_session_command(" IN "),
            Some(SessionCommand::Punch(PunchKind::ClockIn))
        );
        assert_eq!(
            parse_session_command("o"),
            Some(SessionCommand::Punch(PunchKind::ClockOut))
        );
        assert_eq!(parse_session_command(""), Some(SessionCommand::Redraw));
        assert_eq!(parse_session_command("exit"), Some(SessionCommand::Quit));
        assert_eq!(parse_session_command("lunch"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn typed_punches_are_appended_in_order() -> Result<()> {
        *TEST_LOGGING;
        let t0 = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let clock = Arc::new(TokioClock::starting_at(t0));
        let store = Arc::new(MemoryStore::new());
        let ledger = PunchLedger::hydrate(
            Box::new(store.clone()),
            DEFAULT_STORAGE_KEY,
            clock.clone(),
        )
        .await;
        let ticker = ClockTicker::start(clock, DEFAULT_TICK_INTERVAL);
        let mut view = plain_view();

        let input: &[u8] = b"i\nlunch\no\ni\nq\nnever read\n";
        let ledger = run_session(
            ledger,
            ticker,
            input,
            SessionView {
                out: &mut view.out,
                clear_screen: false,
                colors: false,
                links: view.links.clone(),
            },
            &Utc,
            CancellationToken::new(),
        )
        .await?;

        let kinds = ledger.events().iter().map(|v| v.kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![PunchKind::ClockIn, PunchKind::ClockOut, PunchKind::ClockIn]
        );
        let stored = store.get(DEFAULT_STORAGE_KEY).await?.unwrap_or_default();
        assert_eq!(parse_snapshot(&stored)?.as_slice(), &*ledger.events());

        let output = String::from_utf8(view.out)?;
        assert!(output.starts_with("09:00:00\nFriday, March 14, 2025\n"));
        assert!(output.contains("No punch records yet."));
        assert!(output.contains("Unknown command \"lunch\""));
        assert!(output.contains("Clock-out  03/14 09:00:00"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_the_session() -> Result<()> {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let clock = Arc::new(TokioClock::starting_at(t0));
        let ledger = PunchLedger::hydrate(
            Box::new(MemoryStore::new()),
            DEFAULT_STORAGE_KEY,
            clock.clone(),
        )
        .await;
        let ticker = ClockTicker::start(clock, DEFAULT_TICK_INTERVAL);
        let shutdown = CancellationToken::new();

        // Input that never ends, like an idle terminal.
        let (_writer, reader) = tokio::io::duplex(64);
        let input = tokio::io::BufReader::new(reader);

        let (ledger, _) = tokio::join!(
            run_session(ledger, ticker, input, plain_view(), &Utc, shutdown.clone()),
            async {
                tokio::time::sleep(std::time::Duration::from_millis(3500)).await;
                shutdown.cancel();
            }
        );

        assert!(ledger?.is_empty());
        Ok(())
    }
}

use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::analysis::presentation::{build_scene, nearest_card, radius_summary};
use crate::core::proximity_index::CategoryFilter;
use crate::core::query_facade::{QueryFacade, SearchOutcome, ViewSnapshot};
use crate::services::geolocation::LocationProvider;
use crate::services::place_search::PlaceSearch;

const HELP: &str = "\
commands:
  start                 locate the device (or fall back to the default center)
  click <lat> <lng>     pick a point and show its nearest bell
  pan <lat> <lng>       move the map without changing the nearest bell
  zoom <level>
  radius <km>           one of the radius presets
  filter <purpose|all>
  search <text>         find a place and show bells around it
  close                 close the highlighted popup
  wait <seconds>        let time pass for the popup timer
  show                  print the current view
  scene                 print the current map scene as JSON
  quit";

/// One line of session input.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Start,
    Click { lat: f64, lng: f64 },
    Pan { lat: f64, lng: f64 },
    Zoom(u8),
    Radius(f64),
    Filter(CategoryFilter),
    Search(String),
    Close,
    Wait(u64),
    Show,
    Scene,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    BadNumber(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::UnknownCommand(c) => write!(f, "Unknown command '{}' (try 'help')", c),
            SessionError::MissingArgument(name) => write!(f, "Missing argument: {}", name),
            SessionError::BadNumber(v) => write!(f, "Not a number: {}", v),
        }
    }
}

impl std::error::Error for SessionError {}

fn number<T: std::str::FromStr>(value: Option<&str>, name: &'static str) -> Result<T, SessionError> {
    let value = value.ok_or(SessionError::MissingArgument(name))?;
    value.parse().map_err(|_| SessionError::BadNumber(value.to_string()))
}

/// Blank lines and `#` comments parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<SessionCommand>, SessionError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let mut parts = rest.split_whitespace();

    let command = match word.to_lowercase().as_str() {
        "start" => SessionCommand::Start,
        "click" | "center" => SessionCommand::Click {
            lat: number(parts.next(), "lat")?,
            lng: number(parts.next(), "lng")?,
        },
        "pan" => SessionCommand::Pan {
            lat: number(parts.next(), "lat")?,
            lng: number(parts.next(), "lng")?,
        },
        "zoom" => SessionCommand::Zoom(number(parts.next(), "level")?),
        "radius" => SessionCommand::Radius(number(parts.next(), "km")?),
        "filter" => SessionCommand::Filter(rest.parse().unwrap_or_default()),
        "search" => SessionCommand::Search(rest.to_string()),
        "close" => SessionCommand::Close,
        "wait" | "tick" => SessionCommand::Wait(number(parts.next(), "seconds")?),
        "show" => SessionCommand::Show,
        "scene" => SessionCommand::Scene,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        other => return Err(SessionError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Replays map events against a facade. Time is simulated: it only moves on
/// `wait`, so scripted sessions are deterministic.
pub struct Session<'a> {
    facade: QueryFacade,
    location: &'a dyn LocationProvider,
    places: Option<&'a dyn PlaceSearch>,
    clock: Instant,
    json: bool,
}

impl<'a> Session<'a> {
    pub fn new(
        facade: QueryFacade,
        location: &'a dyn LocationProvider,
        places: Option<&'a dyn PlaceSearch>,
        json: bool,
    ) -> Self {
        Self {
            facade,
            location,
            places,
            clock: Instant::now(),
            json,
        }
    }

    pub fn facade(&self) -> &QueryFacade {
        &self.facade
    }

    /// Read commands until `quit` or end of input. Bad lines are reported and
    /// skipped.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            match parse_command(&line) {
                Ok(Some(command)) => {
                    debug!(?command, "Session command");
                    if self.execute(command, out)? == Control::Quit {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(line = %line, "Rejected session input");
                    writeln!(out, "{}", e)?;
                }
            }
        }
        out.flush()
    }

    pub fn execute<W: Write>(&mut self, command: SessionCommand, out: &mut W) -> io::Result<Control> {
        let json = self.json;
        let now = self.clock;
        match command {
            SessionCommand::Start => match self.facade.start_at(self.location, now) {
                Ok((start, view)) => {
                    writeln!(
                        out,
                        "Start at {:.6}, {:.6} ({:?})",
                        start.coordinate.lat, start.coordinate.lng, start.source
                    )?;
                    write_view(out, &view, json)?;
                }
                Err(e) => writeln!(out, "{}", e)?,
            },
            SessionCommand::Click { lat, lng } => match self.facade.recenter_at(lat, lng, now) {
                Ok(view) => write_view(out, &view, json)?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            SessionCommand::Pan { lat, lng } => match self.facade.pan_to(lat, lng) {
                Ok(view) => write_view(out, &view, json)?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            SessionCommand::Zoom(level) => {
                let view = self.facade.set_zoom(level);
                write_view(out, &view, json)?;
            }
            SessionCommand::Radius(km) => match self.facade.select_radius_preset(km) {
                Ok(view) => write_view(out, &view, json)?,
                Err(e) => writeln!(out, "{}", e)?,
            },
            SessionCommand::Filter(filter) => {
                let view = self.facade.set_filter(filter);
                write_view(out, &view, json)?;
            }
            SessionCommand::Search(query) => match self.places {
                None => writeln!(out, "Place search unavailable: no gazetteer loaded")?,
                Some(places) => match self.facade.search_at(places, &query, now) {
                    Ok(SearchOutcome::Found { place, view }) => {
                        writeln!(out, "Found {} ({:?})", place.name, place.kind)?;
                        write_view(out, &view, json)?;
                    }
                    Ok(SearchOutcome::Ignored) => {}
                    Err(e) => writeln!(out, "{}", e)?,
                },
            },
            SessionCommand::Close => {
                self.facade.dismiss_highlight();
                writeln!(out, "Popup closed")?;
            }
            SessionCommand::Wait(secs) => {
                self.clock += Duration::from_secs(secs);
                if let Some(id) = self.facade.poll_highlight(self.clock) {
                    writeln!(out, "Popup for bell {} closed", id)?;
                }
            }
            SessionCommand::Show => write_view(out, &self.facade.snapshot(), json)?,
            SessionCommand::Scene => {
                serde_json::to_writer_pretty(&mut *out, &build_scene(&self.facade.snapshot()))?;
                writeln!(out)?;
            }
            SessionCommand::Help => writeln!(out, "{}", HELP)?,
            SessionCommand::Quit => return Ok(Control::Quit),
        }
        Ok(Control::Continue)
    }
}

fn write_view<W: Write>(out: &mut W, view: &ViewSnapshot<'_>, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer(&mut *out, view)?;
        return writeln!(out);
    }
    writeln!(
        out,
        "Center: {:.6}, {:.6} (zoom {}, filter {})",
        view.center.lat, view.center.lng, view.zoom_level, view.filter
    )?;
    writeln!(out, "{}", radius_summary(view.radius_km, view.visible.len()))?;
    if let Some(nearest) = view.nearest.as_ref().filter(|n| view.highlighted == Some(n.bell.id)) {
        writeln!(out, "{}", nearest_card(nearest).render_text())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::proximity_index::tests::EXAMPLE;
    use crate::data::bells_loader::load_bells_str;
    use crate::data::gazetteer::{Gazetteer, GazetteerEntry};
    use crate::models::bell::Purpose;
    use crate::models::viewport::ViewPhase;
    use crate::services::geolocation::{FixedLocation, NoLocation};
    use crate::data::poi::Coordinate;

    fn facade() -> QueryFacade {
        QueryFacade::with_linear_index(load_bells_str(EXAMPLE).unwrap())
    }

    fn replay(session: &mut Session<'_>, script: &str) -> String {
        let mut out = Vec::new();
        session.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("  "), Ok(None));
        assert_eq!(parse_command("# comment"), Ok(None));
        assert_eq!(
            parse_command("click 37.5 -127"),
            Ok(Some(SessionCommand::Click { lat: 37.5, lng: -127.0 }))
        );
        assert_eq!(parse_command("ZOOM 4"), Ok(Some(SessionCommand::Zoom(4))));
        assert_eq!(parse_command("filter all"), Ok(Some(SessionCommand::Filter(CategoryFilter::All))));
        assert_eq!(
            parse_command("filter 방범용"),
            Ok(Some(SessionCommand::Filter(CategoryFilter::Only(Purpose::CrimePrevention))))
        );
        assert_eq!(
            parse_command("search  Seoul Station "),
            Ok(Some(SessionCommand::Search("Seoul Station".into())))
        );
        assert_eq!(parse_command("pan 37.5"), Err(SessionError::MissingArgument("lng")));
        assert_eq!(parse_command("radius far"), Err(SessionError::BadNumber("far".into())));
        assert_eq!(parse_command("fly"), Err(SessionError::UnknownCommand("fly".into())));
    }

    #[test]
    fn click_then_narrow() {
        let mut session = Session::new(facade(), &NoLocation, None, false);
        let out = replay(&mut session, "click 37.50 127.00\nradius 1\nfilter A\nradius 0.5\nquit\nshow\n");
        assert!(out.contains("2km radius: 2 bells"), "{}", out);
        assert!(out.contains("1km radius: 1 bells"), "{}", out);
        assert!(out.contains("0.5km radius: 1 bells"), "{}", out);
        assert!(out.contains("Distance: 0m"), "{}", out);
        assert_eq!(session.facade().viewport().radius_km(), 0.5);
    }

    #[test]
    fn bad_lines_do_not_stop_the_session() {
        let mut session = Session::new(facade(), &NoLocation, None, false);
        let out = replay(&mut session, "bogus\nradius -1\nclick 37.51 127.01\n");
        assert!(out.contains("Unknown command 'bogus'"));
        assert_eq!(session.facade().viewport().radius_km(), 2.0);
        assert_eq!(session.facade().phase(), ViewPhase::Centered);
    }

    #[test]
    fn popup_closes_after_simulated_delay() {
        let mut session = Session::new(facade(), &NoLocation, None, false);
        let out = replay(&mut session, "click 37.50 127.00\nwait 5\nclick 37.51 127.01\nwait 6\nwait 4\n");
        assert_eq!(out.matches("Popup for bell").count(), 1);
        assert!(out.contains("Popup for bell 1 closed"), "{}", out);
        assert_eq!(session.facade().viewport().highlighted(), None);
    }

    #[test]
    fn start_uses_device_fix() {
        let device = FixedLocation(Coordinate::new(37.51, 127.01));
        let mut session = Session::new(facade(), &device, None, true);
        let out = replay(&mut session, "start\n");
        assert!(out.contains("(Device)"));
        assert_eq!(session.facade().viewport().zoom_level(), 6);
        assert_eq!(session.facade().nearest().map(|n| n.bell.id), Some(1));
        let json_line = out.lines().nth(1).unwrap();
        let value: serde_json::Value = serde_json::from_str(json_line).unwrap();
        assert_eq!(value["zoom_level"], 6);
        assert_eq!(value["filter"], "all");
    }

    #[test]
    fn search_without_and_with_gazetteer() {
        let mut session = Session::new(facade(), &NoLocation, None, false);
        assert!(replay(&mut session, "search anything\n").contains("no gazetteer"));

        let gazetteer = Gazetteer::new(vec![GazetteerEntry {
            name: "Gangnam Station".into(),
            address: Some("강남대로 396".into()),
            phone: None,
            lat: 37.5005,
            lng: 127.0005,
        }]);
        let mut session = Session::new(facade(), &NoLocation, Some(&gazetteer), false);
        let out = replay(&mut session, "search gangnam\nsearch nowhere\nsearch   \n");
        assert!(out.contains("Found Gangnam Station (Keyword)"), "{}", out);
        assert!(out.contains("No results for \"nowhere\""), "{}", out);
        assert_eq!(session.facade().viewport().zoom_level(), 4);
        assert_eq!(session.facade().nearest().map(|n| n.bell.id), Some(0));
    }
}

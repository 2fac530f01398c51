// Diagnostics capability passed into the voicing engine.
//
// The engine reports notable decisions through a `DiagnosticsSink`: bands
// widened, a tendency tone forced, a displaced tone repaired, lanes
// re-arranged around a resolution, a resolution skipped, a continuity swap
// adopted. Callers choose the sink: `NoopSink` discards everything,
// `CollectingSink` keeps events for tests and the CLI's `--trace` output,
// `LogSink` forwards them to the `log` facade at debug level.
//
// Events are `Copy` values made of indices and pitch arrays. The engine
// checks `enabled()` before constructing one, so a disabled sink costs a
// single branch per decision point and `record` is never called on it.

use crate::satb::Lane;
use std::fmt;

/// One engine decision worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// No placement fitted the register bands, so they were widened.
    BandsWidened { region: usize },
    /// A tendency tone was forced to its resolution.
    TendencyForced {
        region: usize,
        lane: Lane,
        from_pc: u8,
        to_pc: u8,
    },
    /// A lane doubling a tone was re-assigned to a tone the forcing displaced.
    ToneRepaired { region: usize, lane: Lane, pc: u8 },
    /// Resolving into `region` chose the unforced lanes afresh.
    ResolutionRearranged { region: usize, pitches: [u8; 4] },
    /// Resolution into `region` had no ordered placement and was dropped.
    ResolutionSkipped { region: usize },
    /// The continuity pass found a cheaper arrangement.
    ContinuityAdjusted {
        region: usize,
        before: [u8; 4],
        after: [u8; 4],
    },
    /// Final pitches of a region.
    RegionVoiced { region: usize, pitches: [u8; 4] },
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticEvent::BandsWidened { region } => {
                write!(f, "region {region}: register bands widened by an octave")
            }
            DiagnosticEvent::TendencyForced {
                region,
                lane,
                from_pc,
                to_pc,
            } => write!(f, "region {region}: {lane} resolves pc {from_pc} -> {to_pc}"),
            DiagnosticEvent::ToneRepaired { region, lane, pc } => {
                write!(f, "region {region}: {lane} re-assigned to displaced pc {pc}")
            }
            DiagnosticEvent::ResolutionRearranged { region, pitches } => {
                write!(f, "region {region}: re-arranged around the resolution {pitches:?}")
            }
            DiagnosticEvent::ResolutionSkipped { region } => {
                write!(f, "region {region}: tendency resolution skipped (no ordered placement)")
            }
            DiagnosticEvent::ContinuityAdjusted {
                region,
                before,
                after,
            } => write!(f, "region {region}: continuity {before:?} -> {after:?}"),
            DiagnosticEvent::RegionVoiced { region, pitches } => {
                write!(f, "region {region}: voiced {pitches:?}")
            }
        }
    }
}

pub trait DiagnosticsSink {
    /// Whether events should be built at all.
    fn enabled(&self) -> bool;
    fn record(&mut self, event: &DiagnosticEvent);
}

/// Discards everything and reports itself disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&mut self, _event: &DiagnosticEvent) {}
}

/// Keeps every event in order.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub events: Vec<DiagnosticEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticsSink for CollectingSink {
    fn enabled(&self) -> bool {
        true
    }

    fn record(&mut self, event: &DiagnosticEvent) {
        self.events.push(*event);
    }
}

/// Forwards events to the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn enabled(&self) -> bool {
        log::log_enabled!(log::Level::Debug)
    }

    fn record(&mut self, event: &DiagnosticEvent) {
        log::debug!("{event}");
    }
}

/// Record an event if the sink is enabled. The closure only runs when it is.
pub(crate) fn emit(sink: &mut dyn DiagnosticsSink, event: impl FnOnce() -> DiagnosticEvent) {
    if sink.enabled() {
        sink.record(&event());
    }
}

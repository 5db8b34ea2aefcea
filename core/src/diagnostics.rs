//! Diagnostics sink: where the engine reports what it decided
//!
//! Route construction and pheromone updates emit `RouteEvent`s into an
//! injected sink instead of logging from deep inside the algorithm:
//! - `TracingSink` forwards events to `tracing` (the default)
//! - `RecordingSink` keeps them in memory so tests can inspect decisions
//! - `NullSink` drops them

use crate::network::SegmentId;
use crate::routing::Termination;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// How a step picked its next segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Highest-probability candidate (draw below q0)
    Exploit,
    /// Sampled from the normalized distribution
    Explore,
}

/// Something the engine decided
#[derive(Debug, Clone, PartialEq)]
pub enum RouteEvent {
    RouteStarted {
        start: SegmentId,
        destination: SegmentId,
    },
    StepChosen {
        from: SegmentId,
        to: SegmentId,
        mode: SelectionMode,
        probability: f64,
        candidates: usize,
    },
    RouteCompleted {
        hops: usize,
    },
    RouteTerminated {
        at: SegmentId,
        hops: usize,
        reason: Termination,
    },
    DegenerateQuality {
        hops: usize,
    },
    PheromonesUpdated {
        segments: usize,
        quality: f64,
        dynamic_rate: f64,
    },
}

/// Receiver of engine events
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: RouteEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, event: RouteEvent) {
        match event {
            RouteEvent::RouteStarted { start, destination } => {
                debug!("Route {} -> {} started", start, destination);
            }
            RouteEvent::StepChosen {
                from,
                to,
                mode,
                probability,
                candidates,
            } => {
                debug!(
                    "{} -> {} ({:?}, p={:.4}, {} candidates)",
                    from, to, mode, probability, candidates
                );
            }
            RouteEvent::RouteCompleted { hops } => {
                debug!("Route completed with {} segments", hops);
            }
            RouteEvent::RouteTerminated { at, hops, reason } => match reason {
                Termination::HopCap => {
                    warn!("Route length reached hop cap ({} segments) at {}", hops, at)
                }
                _ => info!("Route ended early at {} after {} segments: {:?}", at, hops, reason),
            },
            RouteEvent::DegenerateQuality { hops } => {
                debug!("Degenerate quality for {}-segment route, using 0", hops);
            }
            RouteEvent::PheromonesUpdated {
                segments,
                quality,
                dynamic_rate,
            } => {
                debug!(
                    "Pheromones updated on {} segments (quality={:.6}, rate={:.4})",
                    segments, quality, dynamic_rate
                );
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&self, _event: RouteEvent) {}
}

/// Keeps every event in arrival order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RouteEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RouteEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl DiagnosticsSink for RecordingSink {
    fn record(&self, event: RouteEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.record(RouteEvent::RouteCompleted { hops: 2 });
        sink.record(RouteEvent::DegenerateQuality { hops: 0 });

        assert_eq!(
            sink.events(),
            vec![
                RouteEvent::RouteCompleted { hops: 2 },
                RouteEvent::DegenerateQuality { hops: 0 },
            ]
        );

        sink.clear();
        assert!(sink.events().is_empty());
    }
}

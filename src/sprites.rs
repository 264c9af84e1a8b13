//! Sprite loading port
//!
//! Image decoding and caching belong to the host (browser, atlas packer,
//! test harness). The sim only needs to know when a requested sprite is
//! ready, because an object must not become visible or hit-testable before
//! its art is: spawns sit in a pending queue until their load completes.

use crate::errors::GameError;
use crate::sim::SliceAxis;

/// Handle for one in-flight sprite load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket(pub u32);

/// A finished load, reported once by `poll_completed`
#[derive(Debug, Clone)]
pub struct CompletedLoad {
    pub ticket: LoadTicket,
    pub result: Result<(), GameError>,
}

/// Asynchronous sprite loader seen from the sim side.
pub trait SpriteSource {
    /// Begin loading the image at `path`.
    fn request(&mut self, path: &str) -> LoadTicket;

    /// Drain loads that finished since the last poll, in completion order.
    fn poll_completed(&mut self) -> Vec<CompletedLoad>;
}

/// Loader that completes every request successfully on the next poll.
///
/// For hosts with preloaded assets, and for tests.
#[derive(Debug, Default)]
pub struct InstantSprites {
    next_ticket: u32,
    finished: Vec<LoadTicket>,
}

impl InstantSprites {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpriteSource for InstantSprites {
    fn request(&mut self, _path: &str) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.finished.push(ticket);
        ticket
    }

    fn poll_completed(&mut self) -> Vec<CompletedLoad> {
        self.finished
            .drain(..)
            .map(|ticket| CompletedLoad {
                ticket,
                result: Ok(()),
            })
            .collect()
    }
}

/// Sprite paths for the two halves of a sliced object.
///
/// `images/apple.png` cut vertically becomes `images/apple_v1.png` and
/// `images/apple_v2.png`; a horizontal cut uses `_h1`/`_h2`.
pub fn half_sprites(path: &str, axis: SliceAxis) -> (String, String) {
    let tag = match axis {
        SliceAxis::Horizontal => "h",
        SliceAxis::Vertical => "v",
    };
    match path.rfind('.') {
        Some(dot) => {
            let (stem, ext) = path.split_at(dot);
            (format!("{stem}_{tag}1{ext}"), format!("{stem}_{tag}2{ext}"))
        }
        None => (format!("{path}_{tag}1"), format!("{path}_{tag}2")),
    }
}

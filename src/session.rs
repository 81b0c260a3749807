//! Session driver: the per-frame loop body shared by the web and native entry points

use crate::persistence::{ClaimQueue, CreateDotRequest, DotStore};
use crate::renderer::FrameBuffers;
use crate::sim::{DotSeed, GalaxyState, InputEvent, SessionEvent, tick};

/// Owns the simulation, the frame buffers and the persistence handle
pub struct Session<S: DotStore> {
    pub state: GalaxyState,
    frame: FrameBuffers,
    store: S,
    claims: ClaimQueue,
}

impl<S: DotStore> Session<S> {
    pub fn new(state: GalaxyState, store: S) -> Self {
        Self {
            state,
            frame: FrameBuffers::new(),
            store,
            claims: ClaimQueue::new(),
        }
    }

    pub fn handle(&mut self, event: InputEvent, now: f64) {
        self.state.handle(event, now);
    }

    /// Add a dot locally and persist it in the background
    pub fn create_dot(&mut self, seed: DotSeed) -> usize {
        let index = self.state.create_dot(seed);
        let request = CreateDotRequest::from_dot(&self.state.dots[index]);
        self.store.create_dot(request, self.claims.completion(index));
        index
    }

    /// Run one frame and return the assembled buffers
    pub fn frame(&mut self, now: f64) -> &FrameBuffers {
        for claim in self.claims.drain() {
            self.state.reconcile_claim(claim.index, claim.slug, claim.claimed);
        }
        tick(&mut self.state, now);
        self.frame.assemble(&self.state);
        &self.frame
    }

    pub fn buffers(&self) -> &FrameBuffers {
        &self.frame
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.state.drain_events()
    }
}

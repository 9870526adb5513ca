use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::animation::ease::Ease;
use crate::assets::source::{Asset, AssetSource};
use crate::foundation::core::{AssetId, PixelSize};
use crate::foundation::error::{VignetteError, VignetteResult};
use crate::session::ticker::{TickControl, TickHandle, TickInfo, TickLoop};
use crate::surface::pool::{SurfaceContent, SurfaceId, SurfaceLease};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Options controlling a detail session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionOpts {
    /// Period of the animation tick.
    pub tick_interval: Duration,
    /// Length of one animation run.
    pub animation_duration: Duration,
    /// Curve applied to animation progress.
    pub ease: Ease,
    /// Restart the animation when it completes instead of holding at the end.
    pub looping: bool,
    /// Report lifecycle misuse as [`VignetteError::InvalidState`]; otherwise log it and continue.
    pub strict: bool,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            animation_duration: Duration::from_millis(300),
            ease: Ease::default(),
            looping: false,
            strict: cfg!(debug_assertions),
        }
    }
}

/// Process-unique session identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self {
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Session lifecycle state. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Asset loaded; tick not started.
    Created,
    /// Tick running.
    Active,
    /// Teardown in progress.
    Closing,
    /// Tick cancelled; asset and surface released.
    Destroyed,
}

/// Animation snapshot of a session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionFrame {
    /// Tick invocations so far.
    pub ticks: u64,
    /// Animation time accumulated by ticks.
    pub elapsed: Duration,
    /// Eased progress in `[0, 1]`.
    pub progress: f64,
}

struct SessionData {
    asset: Option<Asset>,
    frame: SessionFrame,
}

/// Manages the lifecycle of one detail-view activation.
///
/// Ownership flows one way: the controller owns its tick handle, asset and surface lease; the
/// tick body observes the session data through a [`Weak`] only. Dropping the controller in any
/// state runs the same teardown as [`SessionController::close`].
pub struct SessionController {
    id: SessionId,
    asset_id: AssetId,
    state: SessionState,
    data: Rc<RefCell<SessionData>>,
    ticker: TickLoop,
    tick: Option<TickHandle>,
    surface: Option<SurfaceLease>,
    opts: SessionOpts,
}

impl SessionController {
    /// Read `id` through the uncached path and create a session in [`SessionState::Created`].
    pub fn create(
        source: &AssetSource,
        id: &AssetId,
        ticker: TickLoop,
        opts: SessionOpts,
    ) -> VignetteResult<Self> {
        let asset = source.read(id)?;
        Self::with_asset(asset, ticker, opts)
    }

    /// Create a session owning an already-read asset.
    pub fn with_asset(asset: Asset, ticker: TickLoop, opts: SessionOpts) -> VignetteResult<Self> {
        if opts.tick_interval.is_zero() {
            return Err(VignetteError::validation("session tick interval must be > 0"));
        }
        let id = SessionId::next();
        tracing::debug!(session = %id, asset = %asset.id(), "session created");
        Ok(Self {
            id,
            asset_id: asset.id().clone(),
            state: SessionState::Created,
            data: Rc::new(RefCell::new(SessionData {
                asset: Some(asset),
                frame: SessionFrame::default(),
            })),
            ticker,
            tick: None,
            surface: None,
            opts,
        })
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Id of the asset this session presents.
    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Options this session was created with.
    pub fn opts(&self) -> SessionOpts {
        self.opts
    }

    /// Current animation snapshot.
    pub fn frame(&self) -> SessionFrame {
        self.data.borrow().frame
    }

    /// Return `true` while the session still holds its asset.
    pub fn holds_asset(&self) -> bool {
        self.data.borrow().asset.is_some()
    }

    /// Native size of the held asset, `None` after teardown.
    pub fn asset_native_size(&self) -> Option<PixelSize> {
        self.data.borrow().asset.as_ref().map(Asset::native_size)
    }

    /// Surface presenting this session, if one is attached.
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface.as_ref().map(SurfaceLease::id)
    }

    /// Tick handle while the session is active.
    pub fn tick_handle(&self) -> Option<TickHandle> {
        self.tick
    }

    /// Non-owning observer of this session's data.
    pub fn observer(&self) -> SessionObserver {
        SessionObserver {
            data: Rc::downgrade(&self.data),
        }
    }

    /// Hand the session a detail surface; it is released when the session is destroyed.
    pub fn attach_surface(&mut self, lease: SurfaceLease) -> VignetteResult<()> {
        if self.state >= SessionState::Closing {
            return self.misuse(format!("attach_surface in state {:?}", self.state));
        }
        lease.assign(SurfaceContent::Detail(self.asset_id.clone()))?;
        // Replacing an earlier lease releases it.
        self.surface = Some(lease);
        Ok(())
    }

    /// Transition `Created -> Active` and start the periodic tick.
    pub fn open(&mut self) -> VignetteResult<()> {
        if self.state != SessionState::Created {
            return self.misuse(format!("open in state {:?}", self.state));
        }

        let data = Rc::downgrade(&self.data);
        let opts = self.opts;
        let handle = self
            .ticker
            .schedule(opts.tick_interval, move |info| tick(&data, opts, info))?;
        self.tick = Some(handle);
        self.state = SessionState::Active;
        tracing::debug!(session = %self.id, "session opened");
        Ok(())
    }

    /// Transition `Active -> Closing -> Destroyed`.
    ///
    /// The tick is cancelled first, and when this returns no further tick will run. The asset and
    /// the attached surface are released. Closing a session that is not active does nothing.
    pub fn close(&mut self) {
        if self.state != SessionState::Active {
            tracing::debug!(session = %self.id, state = ?self.state, "close ignored");
            return;
        }
        self.teardown();
    }

    fn teardown(&mut self) {
        self.state = SessionState::Closing;
        if let Some(handle) = self.tick.take() {
            let ack = self.ticker.cancel(handle);
            tracing::debug!(session = %self.id, ?ack, "session tick cancelled");
        }
        self.data.borrow_mut().asset = None;
        self.surface = None;
        self.state = SessionState::Destroyed;
        tracing::debug!(session = %self.id, "session destroyed");
    }

    fn misuse(&self, what: String) -> VignetteResult<()> {
        let msg = format!("{}: {what}", self.id);
        if self.opts.strict {
            return Err(VignetteError::invalid_state(msg));
        }
        tracing::warn!("ignored session misuse: {msg}");
        Ok(())
    }
}

fn tick(data: &Weak<RefCell<SessionData>>, opts: SessionOpts, info: TickInfo) -> TickControl {
    let Some(data) = data.upgrade() else {
        return TickControl::Stop;
    };
    let mut data = data.borrow_mut();
    let frame = &mut data.frame;
    frame.ticks += 1;
    frame.elapsed += info.dt;
    frame.progress = opts
        .ease
        .progress(frame.elapsed, opts.animation_duration, opts.looping);
    TickControl::Continue
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.state != SessionState::Destroyed {
            self.teardown();
        }
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("id", &self.id)
            .field("asset_id", &self.asset_id)
            .field("state", &self.state)
            .field("tick", &self.tick)
            .field("surface", &self.surface())
            .finish()
    }
}

/// Weak view of a session's data, usable after the controller is gone.
#[derive(Clone, Debug)]
pub struct SessionObserver {
    data: Weak<RefCell<SessionData>>,
}

impl SessionObserver {
    /// Return `true` while the session data is still allocated.
    pub fn is_alive(&self) -> bool {
        self.data.strong_count() > 0
    }

    /// Animation snapshot, `None` once the session data is freed.
    pub fn frame(&self) -> Option<SessionFrame> {
        self.data.upgrade().map(|d| d.borrow().frame)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/controller.rs"]
mod tests;

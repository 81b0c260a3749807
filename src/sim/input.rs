//! Pointer, touch, keyboard and motion input
//!
//! Gestures resolve against the state at the moment they arrive. The only
//! deferred gesture is the long press, which the frame tick fires once its
//! deadline passes.

use glam::{Vec2, Vec3};

use super::physics;
use super::picking::Viewport;
use super::state::{GalaxyState, SessionEvent};

/// Keyboard commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Space
    Scatter,
    /// R
    Reset,
    /// Escape
    Escape,
}

/// Map a DOM `KeyboardEvent.code` to a command. Keys typed into form fields
/// or editable content belong to the page, not the galaxy.
pub fn key_for_code(code: &str, editable_target: bool) -> Option<Key> {
    if editable_target {
        return None;
    }
    match code {
        "Space" => Some(Key::Scatter),
        "KeyR" => Some(Key::Reset),
        "Escape" => Some(Key::Escape),
        _ => None,
    }
}

/// Normalized input from the host, pointer coordinates in CSS pixels
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp,
    Click(Vec2),
    DoubleClick(Vec2),
    /// Wheel delta in pixels
    Wheel(f32),
    TouchStart(Vec<Vec2>),
    TouchMove(Vec<Vec2>),
    TouchEnd,
    Key(Key),
    /// Device acceleration including gravity (m/s^2)
    Motion(Vec3),
    Resize { width: f32, height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingPress {
    index: usize,
    deadline: f64,
}

/// Gesture bookkeeping between events
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    /// Dot owned by the pointer
    pub grabbed: Option<usize>,
    pub hovered: Option<usize>,
    /// Pointer is rotating the camera
    pub orbit_dragging: bool,
    long_press: Option<PendingPress>,
    long_press_fired: bool,
    last_tap: Option<f64>,
    pinch_distance: f32,
    last_shake: Option<f64>,
}

impl Interaction {
    pub fn long_press_pending(&self) -> bool {
        self.long_press.is_some()
    }

    pub fn cancel_long_press(&mut self) {
        self.long_press = None;
    }

    /// Drop grabs and pending gestures
    pub fn cancel_all(&mut self) {
        self.grabbed = None;
        self.orbit_dragging = false;
        self.long_press = None;
        self.long_press_fired = false;
    }

    fn start_long_press(&mut self, index: usize, now: f64, delay: f64) {
        self.long_press_fired = false;
        self.long_press = Some(PendingPress {
            index,
            deadline: now + delay,
        });
    }

    /// Take the pending press if its deadline has passed
    fn due_long_press(&mut self, now: f64) -> Option<usize> {
        let press = self.long_press?;
        if now < press.deadline {
            return None;
        }
        self.long_press = None;
        self.long_press_fired = true;
        Some(press.index)
    }
}

impl GalaxyState {
    /// Apply one input event
    pub fn handle(&mut self, event: InputEvent, now: f64) {
        match event {
            InputEvent::PointerDown(p) => {
                if !self.press(p, now) {
                    self.begin_orbit_drag(p, now);
                }
            }
            InputEvent::PointerMove(p) => {
                let sensitivity = self.settings.camera.mouse_sensitivity;
                if !self.drag_move(p, now, sensitivity) {
                    self.update_hover(p);
                }
            }
            InputEvent::PointerUp => self.pointer_up(now),
            InputEvent::Click(p) => self.click(p, now),
            InputEvent::DoubleClick(p) => self.toggle_gravity(p),
            InputEvent::Wheel(delta) => {
                let params = &self.settings.camera;
                self.camera.zoom_by(delta * params.wheel_scale, params);
            }
            InputEvent::TouchStart(touches) => self.touch_start(&touches, now),
            InputEvent::TouchMove(touches) => self.touch_move(&touches, now),
            InputEvent::TouchEnd => self.touch_end(now),
            InputEvent::Key(Key::Scatter) => self.scatter(),
            InputEvent::Key(Key::Reset) => self.reset(),
            InputEvent::Key(Key::Escape) => {
                self.interaction.cancel_long_press();
                self.set_gravity(None);
                self.selected = None;
                self.release_orbit();
            }
            InputEvent::Motion(accel) => self.shake(accel, now),
            InputEvent::Resize { width, height } => {
                self.viewport = Viewport::new(width, height);
            }
        }
    }

    /// Fire the long press once it is due; called every frame
    pub(crate) fn fire_long_press(&mut self, now: f64) {
        if let Some(index) = self.interaction.due_long_press(now) {
            self.lock_orbit(index);
        }
    }

    /// Grab the dot under the pointer. False when nothing was hit.
    fn press(&mut self, pointer: Vec2, now: f64) -> bool {
        let Some(index) = self.pick(pointer) else {
            return false;
        };
        if !physics::grab(&mut self.dots, index) {
            return false;
        }
        self.interaction.grabbed = Some(index);
        let delay = self.settings.interaction.long_press;
        self.interaction.start_long_press(index, now, delay);
        true
    }

    fn begin_orbit_drag(&mut self, pointer: Vec2, now: f64) {
        self.interaction.orbit_dragging = true;
        self.camera.start_drag(pointer, now);
    }

    /// Move the grabbed dot or rotate the camera. False when neither applies.
    fn drag_move(&mut self, pointer: Vec2, now: f64, sensitivity: f32) -> bool {
        if let Some(index) = self.interaction.grabbed {
            self.interaction.cancel_long_press();
            let Some(depth) = self.dots.get(index).map(|d| d.pos.z) else {
                return true;
            };
            if let Some(world) = self.projector().project_to_plane(pointer, depth) {
                physics::drag_to(&mut self.dots, index, world, &self.settings.physics);
            }
            return true;
        }
        if self.interaction.orbit_dragging {
            self.camera
                .update_drag(pointer, now, sensitivity, &self.settings.camera);
            return true;
        }
        false
    }

    fn update_hover(&mut self, pointer: Vec2) {
        let hovered = self.pick(pointer);
        if hovered != self.interaction.hovered {
            self.interaction.hovered = hovered;
            self.emit(SessionEvent::HoverChanged(hovered));
        }
    }

    fn pointer_up(&mut self, now: f64) {
        self.interaction.cancel_long_press();
        if let Some(index) = self.interaction.grabbed.take() {
            physics::release(&mut self.dots, index, &self.settings.physics);
            return;
        }
        self.interaction.orbit_dragging = false;
        self.camera.end_drag(now);
    }

    fn click(&mut self, pointer: Vec2, now: f64) {
        if self.interaction.orbit_dragging {
            return;
        }
        if self.interaction.long_press_fired {
            self.interaction.long_press_fired = false;
            return;
        }
        match self.pick(pointer) {
            Some(index) => self.select(index, now),
            None => {
                self.release_orbit();
            }
        }
    }

    fn touch_start(&mut self, touches: &[Vec2], now: f64) {
        match touches {
            [p] => {
                if self.press(*p, now) {
                    return;
                }
                self.begin_orbit_drag(*p, now);
                let window = self.settings.interaction.double_tap;
                match self.interaction.last_tap {
                    Some(t) if now - t <= window => {
                        self.interaction.last_tap = None;
                        self.scatter();
                    }
                    _ => self.interaction.last_tap = Some(now),
                }
            }
            [a, b] => {
                self.interaction.orbit_dragging = false;
                self.interaction.cancel_long_press();
                self.interaction.pinch_distance = a.distance(*b);
            }
            _ => {}
        }
    }

    fn touch_move(&mut self, touches: &[Vec2], now: f64) {
        match touches {
            [p] => {
                let sensitivity = self.settings.camera.touch_sensitivity;
                self.drag_move(*p, now, sensitivity);
            }
            [a, b] => {
                let d = a.distance(*b);
                let params = &self.settings.camera;
                self.camera
                    .zoom_by((self.interaction.pinch_distance - d) * params.pinch_scale, params);
                self.interaction.pinch_distance = d;
            }
            _ => {}
        }
    }

    fn touch_end(&mut self, now: f64) {
        self.interaction.cancel_long_press();
        if let Some(index) = self.interaction.grabbed.take() {
            // A short tap on a dot selects it
            if !self.interaction.long_press_fired {
                self.select(index, now);
            }
            physics::release(&mut self.dots, index, &self.settings.physics);
        }
        self.interaction.long_press_fired = false;
        self.interaction.orbit_dragging = false;
        self.camera.end_drag(now);
    }

    fn shake(&mut self, accel: Vec3, now: f64) {
        let params = &self.settings.interaction;
        if accel.length() <= params.shake_threshold {
            return;
        }
        let cooldown = params.shake_cooldown;
        if self
            .interaction
            .last_shake
            .is_some_and(|t| now - t <= cooldown)
        {
            return;
        }
        self.interaction.last_shake = Some(now);
        log::debug!("Shake detected ({:.1} m/s^2)", accel.length());
        self.scatter();
        self.effects.trigger_pulse();
    }
}

/// What the viewer should be told about the primary pointer this pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerAction {
    Down(f32),
    Move(f32),
    Up(f32),
}

/// Turns polled egui pointer state into down/move/up calls.
///
/// egui only reports `drag_started` once the pointer has travelled past its
/// drag threshold, so the press is tracked directly and the drag starts at
/// the press origin. All x values are relative to the viewport's left edge.
#[derive(Debug, Default)]
pub struct PointerTracker {
    pressed: bool,
    last_x: f32,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `held`: the primary button is down and the press began on the viewport.
    /// `press_x`: where that press began. `x`: the current pointer position.
    pub fn update(
        &mut self,
        held: bool,
        press_x: Option<f32>,
        x: Option<f32>,
    ) -> Option<PointerAction> {
        match (self.pressed, held) {
            (false, true) => {
                let start = press_x.or(x)?;
                self.pressed = true;
                self.last_x = start;
                Some(PointerAction::Down(start))
            }
            (true, true) => {
                let x = x?;
                if x == self.last_x {
                    return None;
                }
                self.last_x = x;
                Some(PointerAction::Move(x))
            }
            (true, false) => {
                self.pressed = false;
                if let Some(x) = x {
                    self.last_x = x;
                }
                Some(PointerAction::Up(self.last_x))
            }
            (false, false) => None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

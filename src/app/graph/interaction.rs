use eframe::egui::{self, Pos2, Rect, Ui};
use radar_layout::interaction::{Gesture, PointerEvent};
use radar_layout::session::GraphSession;

pub(super) fn forward_pointer(
    ui: &Ui,
    rect: Rect,
    response: &egui::Response,
    session: &mut GraphSession,
) {
    let local = |position: Pos2| (position - rect.min).to_pos2();

    if response.drag_started_by(egui::PointerButton::Primary)
        && let Some(origin) = ui.input(|input| input.pointer.press_origin())
    {
        session.push(PointerEvent::Down {
            position: local(origin),
        });
    }

    if response.dragged_by(egui::PointerButton::Primary)
        && response.drag_delta() != egui::Vec2::ZERO
        && let Some(position) = response.interact_pointer_pos()
    {
        session.push(PointerEvent::Move {
            position: local(position),
        });
    }

    if response.drag_stopped() {
        let position = response
            .interact_pointer_pos()
            .or_else(|| ui.input(|input| input.pointer.latest_pos()));
        match position {
            Some(position) => session.push(PointerEvent::Up {
                position: local(position),
            }),
            None => session.push(PointerEvent::Leave),
        }
    } else if session.controller.gesture() != Gesture::Idle
        && !session.controller.has_pending()
        && !response.dragged()
    {
        session.push(PointerEvent::Leave);
    }

    if !response.hovered() {
        return;
    }

    let origin = ui
        .input(|input| input.pointer.hover_pos())
        .map_or_else(|| local(rect.center()), local);

    let (scroll, pinch) = ui.input(|input| (input.raw_scroll_delta.y, input.zoom_delta()));
    if let Some(event) = zoom_event(scroll, pinch, origin) {
        session.push(event);
    }
}

// egui folds ctrl+wheel into both the scroll delta and `zoom_delta`, so a
// pinch wins over the wheel in the same frame.
fn zoom_event(scroll: f32, pinch: f32, origin: Pos2) -> Option<PointerEvent> {
    if (pinch - 1.0).abs() > f32::EPSILON {
        return Some(PointerEvent::Pinch {
            scale: pinch,
            origin,
        });
    }
    (scroll.abs() > f32::EPSILON).then_some(PointerEvent::Wheel {
        delta: -scroll,
        origin,
    })
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn pinch_replaces_the_wheel_in_the_same_frame() {
        let origin = pos2(4.0, 8.0);
        assert_eq!(
            zoom_event(40.0, 1.25, origin),
            Some(PointerEvent::Pinch {
                scale: 1.25,
                origin
            })
        );
        assert_eq!(
            zoom_event(40.0, 1.0, origin),
            Some(PointerEvent::Wheel {
                delta: -40.0,
                origin
            })
        );
        assert_eq!(zoom_event(0.0, 1.0, origin), None);
    }
}

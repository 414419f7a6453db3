use eframe::egui::{Pos2, Vec2};

use super::InteractionConfig;
use crate::viewport::ViewportTransform;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down { position: Pos2 },
    Move { position: Pos2 },
    Up { position: Pos2 },
    Leave,
    /// Positive `delta` zooms out.
    Wheel { delta: f32, origin: Pos2 },
    Pinch { scale: f32, origin: Pos2 },
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        last: Pos2,
    },
    Dragging {
        node: usize,
        grab_offset: Vec2,
        raised_alpha_target: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Effect {
    Pin { node: usize, at: Vec2 },
    Unpin { node: usize },
    SetAlphaTarget(f32),
    Restart,
    SetTransform(ViewportTransform),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub node: usize,
    pub position: Vec2,
}

#[derive(Clone, Copy, Debug)]
pub struct GestureContext<'a> {
    pub config: &'a InteractionConfig,
    pub transform: ViewportTransform,
    pub alpha_target: f32,
    pub warm_alpha_target: f32,
    pub hit: Option<Hit>,
}

pub fn transition(
    state: Gesture,
    event: PointerEvent,
    ctx: &GestureContext<'_>,
) -> (Gesture, Vec<Effect>) {
    match (state, event) {
        (Gesture::Idle | Gesture::Panning { .. }, PointerEvent::Down { position }) => {
            start(position, ctx)
        }

        (Gesture::Panning { last }, PointerEvent::Move { position }) => {
            let next = ctx.transform.translated(position - last);
            (
                Gesture::Panning { last: position },
                vec![Effect::SetTransform(next)],
            )
        }
        (
            Gesture::Dragging {
                node, grab_offset, ..
            },
            PointerEvent::Move { position },
        ) => {
            let at = ctx.transform.invert(position).to_vec2() + grab_offset;
            (state, vec![Effect::Pin { node, at }])
        }

        (
            Gesture::Dragging {
                node,
                raised_alpha_target,
                ..
            },
            PointerEvent::Up { .. } | PointerEvent::Leave,
        ) => {
            let mut effects = vec![Effect::Unpin { node }];
            if raised_alpha_target {
                effects.push(Effect::SetAlphaTarget(0.0));
            }
            (Gesture::Idle, effects)
        }
        (Gesture::Panning { .. }, PointerEvent::Up { .. } | PointerEvent::Leave) => {
            (Gesture::Idle, Vec::new())
        }

        (Gesture::Dragging { .. }, PointerEvent::Wheel { .. } | PointerEvent::Pinch { .. }) => {
            (state, Vec::new())
        }
        (_, PointerEvent::Wheel { delta, origin }) => {
            let factor = 2.0_f32.powf(-delta * ctx.config.wheel_sensitivity);
            zoom(state, origin, factor, ctx)
        }
        (_, PointerEvent::Pinch { scale, origin }) => zoom(state, origin, scale, ctx),

        _ => (state, Vec::new()),
    }
}

fn start(position: Pos2, ctx: &GestureContext<'_>) -> (Gesture, Vec<Effect>) {
    let Some(hit) = ctx.hit else {
        return (Gesture::Panning { last: position }, Vec::new());
    };

    let pointer = ctx.transform.invert(position).to_vec2();
    let warm = ctx.warm_alpha_target;
    let raised_alpha_target = ctx.alpha_target < warm;

    let mut effects = Vec::with_capacity(3);
    if raised_alpha_target {
        effects.push(Effect::SetAlphaTarget(warm));
    }
    effects.push(Effect::Restart);
    effects.push(Effect::Pin {
        node: hit.node,
        at: hit.position,
    });

    (
        Gesture::Dragging {
            node: hit.node,
            grab_offset: hit.position - pointer,
            raised_alpha_target,
        },
        effects,
    )
}

fn zoom(
    state: Gesture,
    origin: Pos2,
    factor: f32,
    ctx: &GestureContext<'_>,
) -> (Gesture, Vec<Effect>) {
    if !factor.is_finite() || factor <= 0.0 {
        return (state, Vec::new());
    }

    let next = ctx
        .transform
        .zoomed_at(origin, factor, ctx.config.scale_extent);
    if next == ctx.transform {
        return (state, Vec::new());
    }
    (state, vec![Effect::SetTransform(next)])
}

//! Read-only camera and walker readout

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use penrose_core::DirectionSign;

use crate::state::{CameraControl, LocomotionState};

pub struct ReadoutPlugin;

impl Plugin for ReadoutPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(EguiPrimaryContextPass, readout_window);
    }
}

fn readout_window(
    mut contexts: EguiContexts,
    control: Res<CameraControl>,
    state: Res<LocomotionState>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let readout = control.cameras.readout();
    let walker = &state.walker;

    egui::Window::new("Camera")
        .default_pos([12.0, 12.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("Mode: {:?}", readout.mode));
            ui.label(format!(
                "Position: [{:.3}, {:.3}, {:.3}]",
                readout.position.x, readout.position.y, readout.position.z
            ));
            ui.label(format!(
                "Target: [{:.3}, {:.3}, {:.3}]",
                readout.target.x, readout.target.y, readout.target.z
            ));
            ui.label(format!(
                "Rotation: X:{:.1}° Y:{:.1}° Z:{:.1}°",
                readout.rotation_deg.x, readout.rotation_deg.y, readout.rotation_deg.z
            ));
            ui.label(format!(
                "Distance: {:.2}  Zoom: {:.2}",
                readout.distance, readout.zoom
            ));

            ui.separator();

            ui.label(format!("Gait: {:?}", walker.gait()));
            let trigger = walker.trigger();
            let arrow = match trigger.direction() {
                DirectionSign::Forward => "↑",
                DirectionSign::Reverse => "↓",
            };
            ui.label(format!(
                "Walked: {:.2} / {:.2} {}",
                trigger.walked_distance(),
                trigger.threshold(),
                arrow
            ));
            ui.label(format!("Next corner: {:?}", walker.corner().next_variant()));
            if walker.actor().is_none() {
                ui.label(
                    egui::RichText::new("Loading character…")
                        .small()
                        .color(egui::Color32::GRAY),
                );
            }

            ui.separator();
            ui.label(
                egui::RichText::new("W/↑ walk  T turn  C corner  S view  A map")
                    .small()
                    .color(egui::Color32::GRAY),
            );
        });
}

//! Labelled previews of the three projection canvases, bottom-left

use bevy::prelude::*;

use crate::constants::*;
use crate::scene::ProjectionCanvases;

/// Container for the canvas previews
#[derive(Component)]
pub struct CanvasStrip;

/// Preview captions, in display order
pub const CANVAS_LABELS: [&str; 3] = ["sphere texture", "perspective plane", "stereographic plane"];

pub fn spawn_canvas_strip(mut commands: Commands, canvases: Res<ProjectionCanvases>) {
    let images = [
        canvases.sphere_image.clone(),
        canvases.perspective_image.clone(),
        canvases.stereographic_image.clone(),
    ];

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                bottom: Val::Px(10.0),
                flex_direction: FlexDirection::Row,
                column_gap: Val::Px(10.0),
                ..default()
            },
            CanvasStrip,
        ))
        .with_children(|parent| {
            for (label, image) in CANVAS_LABELS.into_iter().zip(images) {
                parent
                    .spawn(Node {
                        flex_direction: FlexDirection::Column,
                        row_gap: Val::Px(4.0),
                        ..default()
                    })
                    .with_children(|column| {
                        column.spawn((
                            Text::new(label),
                            TextFont {
                                font_size: 13.0,
                                ..default()
                            },
                            TextColor(TEXT_PRIMARY),
                        ));
                        column.spawn((
                            ImageNode::new(image),
                            Node {
                                width: Val::Px(CANVAS_PREVIEW_SIZE),
                                height: Val::Px(CANVAS_PREVIEW_SIZE),
                                ..default()
                            },
                            BackgroundColor(Color::BLACK),
                        ));
                    });
            }
        });
}

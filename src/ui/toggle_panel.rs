//! Visibility toggle panel UI components and systems

use bevy::prelude::*;

use crate::constants::*;
use crate::model::ModelState;
use crate::settings::{CurrentSettings, VisibilityToggles};

/// Panel selection and visibility
#[derive(Resource)]
pub struct TogglePanelState {
    pub selected_index: usize, // Which toggle is highlighted
    pub visible: bool,
}

impl Default for TogglePanelState {
    fn default() -> Self {
        Self {
            selected_index: 0,
            visible: true,
        }
    }
}

/// Toggle panel container component
#[derive(Component)]
pub struct TogglePanel;

/// Toggle row component with index into `VisibilityToggles::LABELS`
#[derive(Component)]
pub struct ToggleRow(pub usize);

/// Status line showing load/projection progress
#[derive(Component)]
pub struct ModelStatusText;

fn row_text(label: &str, on: bool) -> String {
    format!("{}: {}", label, if on { "on" } else { "off" })
}

fn row_color(selected: bool, on: bool) -> Color {
    // Color priority: selected (yellow) > off (grey) > on (white)
    if selected {
        TEXT_SELECTED
    } else if !on {
        TEXT_DISABLED
    } else {
        TEXT_PRIMARY
    }
}

/// Spawn the panel in the top-right corner
pub fn spawn_toggle_panel(
    mut commands: Commands,
    panel_state: Res<TogglePanelState>,
    current_settings: Res<CurrentSettings>,
) {
    let toggles = &current_settings.settings.visibility;
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(10.0),
                top: Val::Px(10.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::all(Val::Px(10.0)),
                row_gap: Val::Px(4.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.1, 0.1, 0.1, 0.9)),
            if panel_state.visible {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            },
            TogglePanel,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Visibility (F1 to hide)"),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(TEXT_PRIMARY),
            ));
            parent.spawn((
                Text::new("Up/Down: select | Space/Enter: toggle | P: export"),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(TEXT_SECONDARY),
            ));

            for (i, label) in VisibilityToggles::LABELS.iter().enumerate() {
                let on = toggles.get(i);
                parent.spawn((
                    Text::new(row_text(label, on)),
                    TextFont {
                        font_size: 13.0,
                        ..default()
                    },
                    TextColor(row_color(i == panel_state.selected_index, on)),
                    ToggleRow(i),
                ));
            }

            parent.spawn((
                Text::new(ModelState::Loading.to_string()),
                TextFont {
                    font_size: 12.0,
                    ..default()
                },
                TextColor(TEXT_SECONDARY),
                ModelStatusText,
            ));
        });
}

/// Show/hide the panel and flip the selected toggle
pub fn toggle_panel_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut panel_state: ResMut<TogglePanelState>,
    mut current_settings: ResMut<CurrentSettings>,
    mut panel_query: Query<&mut Visibility, With<TogglePanel>>,
) {
    // F1 toggles panel visibility
    if keyboard.just_pressed(KeyCode::F1) {
        panel_state.visible = !panel_state.visible;
        if let Ok(mut visibility) = panel_query.single_mut() {
            *visibility = if panel_state.visible {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
        }
        current_settings.settings.panel_visible = panel_state.visible;
        current_settings.mark_dirty();
    }

    // Only process input when panel is visible
    if !panel_state.visible {
        return;
    }

    let num_toggles = VisibilityToggles::LABELS.len();
    if keyboard.just_pressed(KeyCode::ArrowUp) {
        panel_state.selected_index = (panel_state.selected_index + num_toggles - 1) % num_toggles;
    }
    if keyboard.just_pressed(KeyCode::ArrowDown) {
        panel_state.selected_index = (panel_state.selected_index + 1) % num_toggles;
    }

    if keyboard.just_pressed(KeyCode::Space) || keyboard.just_pressed(KeyCode::Enter) {
        let idx = panel_state.selected_index;
        current_settings.settings.visibility.flip(idx);
        current_settings.mark_dirty();
        info!(
            "{}: {}",
            VisibilityToggles::LABELS[idx],
            current_settings.settings.visibility.get(idx)
        );
    }
}

/// Update row text/colors and the status line
pub fn update_toggle_panel(
    panel_state: Res<TogglePanelState>,
    current_settings: Res<CurrentSettings>,
    model_state: Res<ModelState>,
    mut row_query: Query<(&mut Text, &mut TextColor, &ToggleRow), Without<ModelStatusText>>,
    mut status_query: Query<&mut Text, With<ModelStatusText>>,
) {
    if model_state.is_changed() {
        for mut text in &mut status_query {
            text.0 = model_state.to_string();
        }
    }

    if !panel_state.visible {
        return;
    }

    let toggles = &current_settings.settings.visibility;
    for (mut text, mut color, row) in &mut row_query {
        let on = toggles.get(row.0);
        text.0 = row_text(VisibilityToggles::LABELS[row.0], on);
        color.0 = row_color(row.0 == panel_state.selected_index, on);
    }
}

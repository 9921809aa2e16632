use bevy::prelude::*;

use crate::core::components::{InstructionOverlay, StartSessionButton};
use crate::session::events::{ArSessionEnded, ArSessionStarted, StartSessionRequest};

type SessionUi = Or<(With<StartSessionButton>, With<InstructionOverlay>)>;

pub fn hide_overlays_on_session_start(
    mut started: EventReader<ArSessionStarted>,
    mut nodes: Query<&mut Node, SessionUi>,
) {
    if started.read().count() == 0 {
        return;
    }
    for mut node in nodes.iter_mut() {
        node.display = Display::None;
    }
}

// The start control comes back too, otherwise a new session could never be started.
pub fn restore_overlays_on_session_end(
    mut ended: EventReader<ArSessionEnded>,
    mut nodes: Query<&mut Node, SessionUi>,
) {
    if ended.read().count() == 0 {
        return;
    }
    for mut node in nodes.iter_mut() {
        node.display = Display::Flex;
    }
}

pub fn start_button_interaction(
    buttons: Query<&Interaction, (Changed<Interaction>, With<StartSessionButton>)>,
    mut requests: EventWriter<StartSessionRequest>,
) {
    if buttons.iter().any(|interaction| *interaction == Interaction::Pressed) {
        requests.send(StartSessionRequest);
    }
}

pub fn spawn_session_ui(mut commands: Commands) {
    commands
        .spawn_empty()
        .insert(Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            display: Display::Flex,
            flex_direction: FlexDirection::Column,
            align_items: AlignItems::Center,
            justify_content: JustifyContent::Center,
            row_gap: Val::Px(16.0),
            ..default()
        })
        .insert(BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)))
        .insert(Name::new("InstructionOverlay"))
        .insert(InstructionOverlay)
        .with_children(|overlay| {
            overlay.spawn(Text::new(
                "Point your device at the floor and wait for the ring.\nTap to drop the path.",
            ));
        });

    commands
        .spawn_empty()
        .insert(Button)
        .insert(Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(24.0),
            left: Val::Percent(50.0),
            padding: UiRect::axes(Val::Px(24.0), Val::Px(12.0)),
            display: Display::Flex,
            ..default()
        })
        .insert(BackgroundColor(Color::srgb(0.1, 0.1, 0.1)))
        .insert(BorderColor(Color::WHITE))
        .insert(Name::new("StartSessionButton"))
        .insert(StartSessionButton)
        .with_children(|button| {
            button.spawn(Text::new("START AR"));
        });
}

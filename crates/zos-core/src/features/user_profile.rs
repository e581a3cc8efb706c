// ── User profile panel ──

use serde::Serialize;
use strum::{Display, EnumString};

/// Which profile panel is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    #[default]
    None,
    Overview,
    EditProfile,
    Settings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfileState {
    pub stage: Stage,
    /// `None` until the preference has been loaded.
    pub is_public_read_receipts: Option<bool>,
}

#[derive(Debug, Clone)]
pub enum UserProfileAction {
    OpenUserProfile,
    CloseUserProfile,
    OpenEditProfile,
    OpenSettings,
    SetStage(Stage),
    PublicReadReceipts,
    PrivateReadReceipts,
}

pub(crate) fn reduce(state: &mut UserProfileState, action: &UserProfileAction) -> bool {
    let (stage, receipts) = match action {
        UserProfileAction::OpenUserProfile => (Some(Stage::Overview), None),
        UserProfileAction::CloseUserProfile => (Some(Stage::None), None),
        UserProfileAction::OpenEditProfile => (Some(Stage::EditProfile), None),
        UserProfileAction::OpenSettings => (Some(Stage::Settings), None),
        UserProfileAction::SetStage(stage) => (Some(*stage), None),
        UserProfileAction::PublicReadReceipts => (None, Some(true)),
        UserProfileAction::PrivateReadReceipts => (None, Some(false)),
    };

    let mut changed = false;
    if let Some(stage) = stage.filter(|s| *s != state.stage) {
        state.stage = stage;
        changed = true;
    }
    if let Some(public) = receipts.filter(|p| state.is_public_read_receipts != Some(*p)) {
        state.is_public_read_receipts = Some(public);
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panels_and_receipts() {
        let mut state = UserProfileState::default();
        assert!(reduce(&mut state, &UserProfileAction::OpenSettings));
        assert_eq!(state.stage, Stage::Settings);
        assert!(!reduce(&mut state, &UserProfileAction::SetStage(Stage::Settings)));

        assert!(reduce(&mut state, &UserProfileAction::PrivateReadReceipts));
        assert_eq!(state.is_public_read_receipts, Some(false));

        assert!(reduce(&mut state, &UserProfileAction::CloseUserProfile));
        assert_eq!(state.stage, Stage::None);
    }
}

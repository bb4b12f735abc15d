//! Navigation state: the current page plus orthogonal overlay flags.
//! Owns no business data; the store layers auth-gate and checkout rules
//! on top of these plain transitions.

use serde::{Deserialize, Serialize};

use crate::features::FeatureId;

/// Closed set of top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Home,
    Optimizer,
    ScoreChecker,
    GuidedBuilder,
    LinkedinGenerator,
    About,
    Contact,
    Tutorials,
}

/// Which screen the auth modal is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthView {
    Login,
    Signup,
    ForgotPassword,
    Success,
    PostSignupPrompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileMode {
    Profile,
    Wallet,
}

/// Open profile panel. `post_signup_context` records that the panel was
/// entered from the post-signup prompt, which changes what closing it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfilePanel {
    pub mode: ProfileMode,
    pub post_signup_context: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavState {
    pub page: Page,
    pub mobile_menu_open: bool,
    pub auth_modal_open: bool,
    pub auth_view: AuthView,
    pub profile_panel: Option<ProfilePanel>,
    pub tutorial_tool: Option<FeatureId>,
}

impl Default for NavState {
    fn default() -> Self {
        NavState {
            page: Page::Home,
            mobile_menu_open: false,
            auth_modal_open: false,
            auth_view: AuthView::Login,
            profile_panel: None,
            tutorial_tool: None,
        }
    }
}

impl NavState {
    /// Direct page change; also dismisses the mobile menu.
    pub fn set_page(&mut self, page: Page) {
        self.page = page;
        self.mobile_menu_open = false;
    }

    pub fn toggle_mobile_menu(&mut self) {
        self.mobile_menu_open = !self.mobile_menu_open;
    }

    pub fn open_auth(&mut self, view: AuthView) {
        self.auth_modal_open = true;
        self.auth_view = view;
    }

    /// Closing always resets the view so the next open starts at login.
    pub fn close_auth(&mut self) {
        self.auth_modal_open = false;
        self.auth_view = AuthView::Login;
    }

    pub fn open_profile(&mut self, mode: ProfileMode, post_signup_context: bool) {
        self.profile_panel = Some(ProfilePanel {
            mode,
            post_signup_context,
        });
        self.mobile_menu_open = false;
    }

    /// Returns the panel that was open so the caller can apply
    /// context-dependent follow-up (see the store's close_profile_panel).
    pub fn close_profile(&mut self) -> Option<ProfilePanel> {
        self.profile_panel.take()
    }

    pub fn open_tutorial(&mut self, tool: FeatureId) {
        self.tutorial_tool = Some(tool);
        self.mobile_menu_open = false;
    }

    pub fn close_tutorial(&mut self) {
        self.tutorial_tool = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_home_with_everything_closed() {
        let nav = NavState::default();
        assert_eq!(nav.page, Page::Home);
        assert!(!nav.mobile_menu_open);
        assert!(!nav.auth_modal_open);
        assert_eq!(nav.auth_view, AuthView::Login);
        assert_eq!(nav.profile_panel, None);
        assert_eq!(nav.tutorial_tool, None);
    }

    #[test]
    fn test_set_page_closes_mobile_menu() {
        let mut nav = NavState::default();
        nav.toggle_mobile_menu();
        assert!(nav.mobile_menu_open);
        nav.set_page(Page::About);
        assert_eq!(nav.page, Page::About);
        assert!(!nav.mobile_menu_open);
    }

    #[test]
    fn test_close_auth_resets_view_to_login() {
        let mut nav = NavState::default();
        nav.open_auth(AuthView::PostSignupPrompt);
        assert!(nav.auth_modal_open);
        nav.close_auth();
        assert!(!nav.auth_modal_open);
        assert_eq!(nav.auth_view, AuthView::Login);
    }

    #[test]
    fn test_profile_panel_round_trip_keeps_context() {
        let mut nav = NavState::default();
        nav.open_profile(ProfileMode::Wallet, true);
        let panel = nav.close_profile().unwrap();
        assert_eq!(panel.mode, ProfileMode::Wallet);
        assert!(panel.post_signup_context);
        assert_eq!(nav.close_profile(), None);
    }

    #[test]
    fn test_overlays_are_independent_of_page() {
        let mut nav = NavState::default();
        nav.open_auth(AuthView::Login);
        nav.set_page(Page::Contact);
        assert!(nav.auth_modal_open, "page change must not close the modal");
    }
}
